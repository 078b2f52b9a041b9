use anyhow::Result;
use medscan_core::image::ImageId;

use super::Store;

pub async fn run(store: &Store, id: &ImageId) -> Result<()> {
    store.delete(id).await?;
    println!("Deleted image {id}");
    Ok(())
}
