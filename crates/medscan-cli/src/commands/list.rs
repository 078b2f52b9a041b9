use anyhow::Result;

use super::{Store, summary_line};

pub async fn run(store: &Store, json: bool) -> Result<()> {
    store.fetch_all().await?;
    let state = store.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(state.images())?);
        return Ok(());
    }

    if state.is_empty() {
        println!("No images uploaded yet.");
        return Ok(());
    }

    println!("{:>6}  {:<11}  {:<16}  TITLE", "ID", "STATUS", "UPLOADED");
    for image in state.images() {
        println!("{}", summary_line(image));
    }
    Ok(())
}
