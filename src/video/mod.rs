//! Video generation: request types, the remote service boundary and the runner.

mod clock;
pub mod providers;
mod runner;
mod service;
mod types;

pub use clock::{Clock, SystemClock};
pub use runner::{image_to_video, text_to_video, VideoRunner, FILE_PREFIX, TIMESTAMP_FORMAT};
pub use service::VideoService;
pub use types::{
    ContentVariant, FailureReason, GenerationResult, ImageFormat, JobError, JobStatus,
    ReferenceImage, VideoGenerationRequest, VideoJob, VideoSeconds, VideoSize,
};
