use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    context_desk::main_entry().await
}
