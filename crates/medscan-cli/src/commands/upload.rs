use std::path::Path;

use anyhow::{Context, Result};
use medscan_core::image::UploadRequest;

use super::Store;

pub async fn run(
    store: &Store,
    path: &Path,
    title: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let request = UploadRequest::from_path(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string()
    });
    let request = request
        .with_title(title)
        .with_description(description.unwrap_or_default());

    // Render progress from store snapshots while the upload runs
    let mut snapshots = store.subscribe();
    let reporter = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let (uploading, percent) = {
                let state = snapshots.borrow_and_update();
                (state.is_uploading(), state.upload_progress())
            };
            if uploading {
                eprint!("\rUploading... {percent:>3}%");
            }
        }
    });

    let result = store.upload(request).await;
    reporter.abort();
    eprintln!();

    let image = result?;
    println!(
        "Uploaded image {} ({})",
        image.id,
        image.payload.display_title()
    );
    Ok(())
}
