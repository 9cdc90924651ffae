//! Text-to-video example.
//!
//! Run with: `cargo run --example text_to_video -- "A dog running on a beach"`
//!
//! Requires `AZURE_OPENAI_ENDPOINT` and `AZURE_OPENAI_API_KEY`, in the
//! environment or in `.env`.

use sora_runner::{text_to_video, Config, GenerationResult, VideoSeconds, VideoSize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sora_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Ocean waves crashing on a rocky shore at sunset".into());

    println!("Generating video (this may take a few minutes)...");
    match text_to_video(&config, &prompt, VideoSize::Landscape, VideoSeconds::Eight).await {
        GenerationResult::Success { path } => println!("Video saved to: {}", path.display()),
        GenerationResult::Failure { reason } => anyhow::bail!("{reason}"),
    }

    Ok(())
}
