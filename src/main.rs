use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tabpilot::cli::app::run().await
}
