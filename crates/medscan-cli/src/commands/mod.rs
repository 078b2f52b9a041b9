pub mod delete;
pub mod list;
pub mod show;
pub mod upload;

use medscan_application::ImageStore;
use medscan_core::image::{Image, MedicalImage};
use medscan_infrastructure::HttpImageTransport;

pub type Store = ImageStore<HttpImageTransport<MedicalImage>>;

/// One-line listing entry: id, analysis status, upload date, title.
pub fn summary_line(image: &Image<MedicalImage>) -> String {
    let uploaded = image
        .payload
        .uploaded_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:>6}  {:<11}  {:<16}  {}",
        image.id,
        image.payload.analysis_status().to_string(),
        uploaded,
        image.payload.display_title()
    )
}

/// Multi-line description of a single image.
pub fn detail_lines(image: &Image<MedicalImage>) -> Vec<String> {
    let record = &image.payload;
    let mut lines = vec![
        format!("Image {}: {}", image.id, record.display_title()),
        format!("  Status:      {}", record.analysis_status()),
    ];

    if !record.description.trim().is_empty() {
        lines.push(format!("  Description: {}", record.description));
    }
    if let Some(email) = &record.user_email {
        lines.push(format!("  Owner:       {email}"));
    }
    if let Some(at) = record.uploaded_at {
        lines.push(format!("  Uploaded:    {}", at.to_rfc3339()));
    }
    if let Some(at) = record.analysis_started_at {
        lines.push(format!("  Started:     {}", at.to_rfc3339()));
    }
    if let Some(at) = record.analysis_completed_at {
        lines.push(format!("  Completed:   {}", at.to_rfc3339()));
    }
    if let Some(dimensions) = record.dimensions() {
        lines.push(format!("  Dimensions:  {dimensions}"));
    }
    if let Some(size) = record.file_size {
        lines.push(format!("  Size:        {size} bytes"));
    }
    if let Some(url) = &record.image_url {
        lines.push(format!("  URL:         {url}"));
    }

    lines
}
