#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cinelist_lib::run().await?;
    Ok(())
}
