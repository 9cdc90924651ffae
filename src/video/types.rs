//! Core types for video generation.

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output resolution supported by Sora 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoSize {
    /// 1280x720 landscape.
    #[default]
    #[serde(rename = "1280x720")]
    Landscape,
    /// 720x1280 portrait.
    #[serde(rename = "720x1280")]
    Portrait,
}

impl VideoSize {
    /// Returns the wire value, e.g. `"1280x720"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "1280x720",
            Self::Portrait => "720x1280",
        }
    }
}

impl std::fmt::Display for VideoSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoSize {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1280x720" => Ok(Self::Landscape),
            "720x1280" => Ok(Self::Portrait),
            other => Err(RunnerError::InvalidRequest(format!(
                "unsupported size {other:?}, expected 1280x720 or 720x1280"
            ))),
        }
    }
}

/// Clip duration supported by Sora 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VideoSeconds {
    /// 4 seconds.
    Four,
    /// 8 seconds.
    #[default]
    Eight,
    /// 12 seconds.
    Twelve,
}

impl VideoSeconds {
    /// Returns the duration in seconds.
    pub fn as_secs(&self) -> u32 {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
            Self::Twelve => 12,
        }
    }
}

impl std::fmt::Display for VideoSeconds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_secs())
    }
}

impl TryFrom<u32> for VideoSeconds {
    type Error = RunnerError;

    fn try_from(secs: u32) -> Result<Self> {
        match secs {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            12 => Ok(Self::Twelve),
            other => Err(RunnerError::InvalidRequest(format!(
                "unsupported duration {other}s, expected 4, 8 or 12"
            ))),
        }
    }
}

/// Reference image formats accepted for image-to-video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// WebP.
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        // RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }
        None
    }
}

/// An image used as the first frame for image-to-video generation.
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// File name sent with the multipart upload.
    pub file_name: String,
    /// MIME type sent with the multipart upload.
    pub mime_type: String,
}

impl std::fmt::Debug for ReferenceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceImage")
            .field("bytes", &self.data.len())
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl ReferenceImage {
    /// Builds a reference image from bytes already in memory.
    pub fn new(data: Vec<u8>, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            Path::new(&file_name)
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let mime_type = format.unwrap_or(ImageFormat::Png).mime_type().to_string();
        Self {
            data,
            file_name,
            mime_type,
        }
    }

    /// Reads a reference image from disk. The file is closed before this
    /// returns, whether or not the read succeeded.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("reference.png")
            .to_string();
        Ok(Self::new(data, file_name))
    }

    /// Returns the size of the image in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A request to generate a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoGenerationRequest {
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Output resolution.
    pub size: VideoSize,
    /// Clip duration.
    pub seconds: VideoSeconds,
    /// First-frame image for image-to-video.
    pub reference_image: Option<ReferenceImage>,
}

impl VideoGenerationRequest {
    /// Creates a new request with the given prompt and default size/duration.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: VideoSize::default(),
            seconds: VideoSeconds::default(),
            reference_image: None,
        }
    }

    /// Sets the output resolution.
    pub fn with_size(mut self, size: VideoSize) -> Self {
        self.size = size;
        self
    }

    /// Sets the clip duration.
    pub fn with_seconds(mut self, seconds: VideoSeconds) -> Self {
        self.seconds = seconds;
        self
    }

    /// Sets a reference image for image-to-video generation.
    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }
}

/// Status of a remote generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    /// Accepted, waiting for capacity.
    Queued,
    /// Rendering.
    InProgress,
    /// Finished, content can be downloaded.
    Completed,
    /// Finished without output.
    Failed,
    /// Cancelled before completion.
    Cancelled,
    /// Any other status, kept verbatim. Treated as still running.
    Unknown(String),
}

impl JobStatus {
    /// Returns true for `completed`, `failed` and `cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns the wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error detail attached to a failed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// Machine-readable code, e.g. `moderation_blocked`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A remote generation job as last reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJob {
    /// Opaque identifier assigned by the service.
    pub id: String,
    /// Current status.
    pub status: JobStatus,
    /// Completion percentage, when reported.
    #[serde(default)]
    pub progress: Option<u32>,
    /// Model that serves the job.
    #[serde(default)]
    pub model: Option<String>,
    /// Requested resolution.
    #[serde(default)]
    pub size: Option<String>,
    /// Requested duration, as sent on the wire.
    #[serde(default)]
    pub seconds: Option<String>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Failure detail.
    #[serde(default)]
    pub error: Option<JobError>,
}

impl VideoJob {
    /// Creates a job with only an id and a status.
    pub fn new(id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            progress: None,
            model: None,
            size: None,
            seconds: None,
            created_at: None,
            error: None,
        }
    }

    /// Returns the failure message reported by the service, if any.
    pub fn failure_message(&self) -> Option<&str> {
        let err = self.error.as_ref()?;
        err.message.as_deref().or(err.code.as_deref())
    }
}

/// Rendering of a finished job to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentVariant {
    /// The full MP4.
    #[default]
    Video,
    /// A still preview image.
    Thumbnail,
    /// A sprite sheet of preview frames.
    Spritesheet,
}

impl ContentVariant {
    /// Returns the `variant` query value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::Spritesheet => "spritesheet",
        }
    }
}

/// Why a run produced no video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The job reached `failed`.
    JobFailed {
        /// Message reported by the service.
        message: Option<String>,
    },
    /// The job reached `cancelled`.
    JobCancelled,
    /// Something went wrong along the way (request rejected, network, I/O).
    Error {
        /// Rendered error.
        detail: String,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JobFailed { message: Some(m) } => write!(f, "video generation failed: {m}"),
            Self::JobFailed { message: None } => f.write_str("video generation failed"),
            Self::JobCancelled => f.write_str("video generation was cancelled"),
            Self::Error { detail } => write!(f, "error occurred: {detail}"),
        }
    }
}

/// Outcome of a run: a saved file, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The video was downloaded and saved.
    Success {
        /// Where the MP4 was written.
        path: PathBuf,
    },
    /// No video was produced.
    Failure {
        /// Why.
        reason: FailureReason,
    },
}

impl GenerationResult {
    /// Returns true if a video was saved.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the saved path, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path } => Some(path),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason } => Some(reason),
        }
    }

    /// Converts into the saved path, discarding the failure reason.
    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Success { path } => Some(path),
            Self::Failure { .. } => None,
        }
    }
}
