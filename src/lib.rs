#![warn(missing_docs)]
//! sora-runner - Generate videos with Sora 2 on Azure AI Foundry.
//!
//! A run submits a generation job, polls it every few seconds until the
//! service reports `completed`, `failed` or `cancelled`, and on success
//! downloads the MP4 to `videos/sora2_video_<timestamp>.mp4`.
//!
//! # Quick Start - Text to video
//!
//! ```no_run
//! use sora_runner::{text_to_video, Config, VideoSeconds, VideoSize};
//!
//! #[tokio::main]
//! async fn main() -> sora_runner::Result<()> {
//!     let config = Config::load()?;
//!     let result = text_to_video(
//!         &config,
//!         "A dog running on a beach",
//!         VideoSize::Landscape,
//!         VideoSeconds::Eight,
//!     )
//!     .await;
//!     if let Some(path) = result.path() {
//!         println!("saved {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Image to video
//!
//! ```no_run
//! use sora_runner::{AzureSoraClient, Config, VideoRunner, VideoSeconds, VideoSize};
//!
//! #[tokio::main]
//! async fn main() -> sora_runner::Result<()> {
//!     let config = Config::load()?;
//!     let runner = VideoRunner::new(AzureSoraClient::from_config(&config)?, config.runner_config())?;
//!     let result = runner
//!         .image_to_video("The kite lifts off", "kite.jpg", VideoSize::Portrait, VideoSeconds::Four)
//!         .await;
//!     println!("{result:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! `AZURE_OPENAI_ENDPOINT` and `AZURE_OPENAI_API_KEY` are required, either in
//! the environment or in a `.env` file. See [`config`] for optional overrides.

pub mod config;
mod error;
pub mod video;

// Re-export error types at crate root
pub use error::{Result, RunnerError};

pub use config::{Config, RunnerConfig};

pub use video::providers::{AzureSoraClient, AzureSoraClientBuilder, SoraModel};
pub use video::{
    image_to_video, text_to_video, Clock, ContentVariant, FailureReason, GenerationResult,
    JobStatus, ReferenceImage, SystemClock, VideoGenerationRequest, VideoJob, VideoRunner,
    VideoSeconds, VideoService, VideoSize,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Config, RunnerConfig};
    pub use crate::error::{Result, RunnerError};
    pub use crate::video::providers::AzureSoraClient;
    pub use crate::video::{
        GenerationResult, VideoGenerationRequest, VideoRunner, VideoSeconds, VideoService,
        VideoSize,
    };
}
