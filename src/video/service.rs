//! Remote video service trait.

use crate::error::Result;
use crate::video::types::{ContentVariant, VideoGenerationRequest, VideoJob};
use async_trait::async_trait;

/// The three operations a video generation backend exposes.
///
/// [`AzureSoraClient`](crate::AzureSoraClient) talks to the real service;
/// tests substitute scripted implementations.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Creates a generation job and returns it in its initial state.
    async fn create_job(&self, request: &VideoGenerationRequest) -> Result<VideoJob>;

    /// Fetches the current state of a job.
    async fn retrieve_job(&self, video_id: &str) -> Result<VideoJob>;

    /// Downloads a rendering of a completed job.
    async fn download_content(&self, video_id: &str, variant: ContentVariant) -> Result<Vec<u8>>;

    /// Returns the name of this service for display.
    fn name(&self) -> &str {
        "video service"
    }
}

#[async_trait]
impl<T: VideoService + ?Sized> VideoService for &T {
    async fn create_job(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
        (**self).create_job(request).await
    }

    async fn retrieve_job(&self, video_id: &str) -> Result<VideoJob> {
        (**self).retrieve_job(video_id).await
    }

    async fn download_content(&self, video_id: &str, variant: ContentVariant) -> Result<Vec<u8>> {
        (**self).download_content(video_id, variant).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
