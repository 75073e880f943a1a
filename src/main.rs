use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    vapi_bridge::cli::app::run().await
}
