#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jlpt_vocab_backend::run().await
}
