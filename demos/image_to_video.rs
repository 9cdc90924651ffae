//! Image-to-video example.
//!
//! Run with: `cargo run --example image_to_video -- frame.jpg "The kite lifts off"`

use sora_runner::{AzureSoraClient, Config, GenerationResult, VideoRunner, VideoSeconds, VideoSize};
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

    let mut args = std::env::args().skip(1);
    let image = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: image_to_video <image> [prompt]"))?;
    let prompt = args
        .next()
        .unwrap_or_else(|| "Bring this scene to life with gentle camera motion".into());

    let config = Config::load()?;
    let runner = VideoRunner::new(AzureSoraClient::from_config(&config)?, config.runner_config())?;

    match runner
        .image_to_video(&prompt, &image, VideoSize::Landscape, VideoSeconds::Eight)
        .await
    {
        GenerationResult::Success { path } => println!("Video saved to: {}", path.display()),
        GenerationResult::Failure { reason } => anyhow::bail!("{reason}"),
    }

    Ok(())
}
