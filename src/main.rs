#![allow(missing_docs)]

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    deal_tracker::commands::run().await
}
