use anyhow::Result;
use medscan_core::image::ImageId;

use super::{Store, detail_lines};

pub async fn run(store: &Store, id: &ImageId, json: bool) -> Result<()> {
    let image = store.fetch_one(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&image)?);
    } else {
        for line in detail_lines(&image) {
            println!("{line}");
        }
    }
    Ok(())
}
