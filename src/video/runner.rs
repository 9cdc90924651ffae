//! Submit, poll, download: the full lifecycle of one generation job.

use crate::config::{Config, RunnerConfig};
use crate::error::{Result, RunnerError};
use crate::video::clock::{Clock, SystemClock};
use crate::video::providers::AzureSoraClient;
use crate::video::service::VideoService;
use crate::video::types::{
    ContentVariant, FailureReason, GenerationResult, JobStatus, ReferenceImage, VideoGenerationRequest,
    VideoJob, VideoSeconds, VideoSize,
};
use std::path::{Path, PathBuf};

/// Prefix of every saved video file name.
pub const FILE_PREFIX: &str = "sora2_video_";
/// `strftime` pattern for the timestamp in saved file names, e.g. `15Mar2025_143022`.
pub const TIMESTAMP_FORMAT: &str = "%d%b%Y_%H%M%S";

/// Drives one job at a time against a [`VideoService`].
///
/// A run never returns an error: every failure ends up as
/// [`GenerationResult::Failure`] and is logged.
#[derive(Debug)]
pub struct VideoRunner<S, C = SystemClock> {
    service: S,
    clock: C,
    config: RunnerConfig,
}

impl<S: VideoService> VideoRunner<S, SystemClock> {
    /// Creates a runner on the system clock and prepares the output directory.
    pub fn new(service: S, config: RunnerConfig) -> Result<Self> {
        Self::with_clock(service, SystemClock, config)
    }
}

impl<S: VideoService, C: Clock> VideoRunner<S, C> {
    /// Creates a runner with an explicit clock and prepares the output directory.
    pub fn with_clock(service: S, clock: C, config: RunnerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output_dir)?;
        Ok(Self {
            service,
            clock,
            config,
        })
    }

    /// Returns the runner settings.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the directory videos are saved to.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Generates a video from a text prompt.
    pub async fn text_to_video(
        &self,
        prompt: &str,
        size: VideoSize,
        seconds: VideoSeconds,
    ) -> GenerationResult {
        tracing::info!(prompt, "creating Sora 2 video");
        let request = VideoGenerationRequest::new(prompt)
            .with_size(size)
            .with_seconds(seconds);
        self.run(&request).await
    }

    /// Generates a video from a text prompt and a first-frame image on disk.
    pub async fn image_to_video(
        &self,
        prompt: &str,
        image_path: impl AsRef<Path>,
        size: VideoSize,
        seconds: VideoSeconds,
    ) -> GenerationResult {
        let image_path = image_path.as_ref();
        tracing::info!(prompt, image = %image_path.display(), "creating Sora 2 video from image");

        let image = match ReferenceImage::from_path(image_path).await {
            Ok(image) => image,
            Err(e) => return self.report_error(e),
        };
        let request = VideoGenerationRequest::new(prompt)
            .with_size(size)
            .with_seconds(seconds)
            .with_reference_image(image);
        self.run(&request).await
    }

    /// Runs submit, poll and download for one request.
    pub async fn run(&self, request: &VideoGenerationRequest) -> GenerationResult {
        let start = self.clock.instant();
        match self.try_run(request).await {
            Ok(GenerationResult::Success { path }) => {
                let elapsed = self.clock.instant().saturating_duration_since(start).as_secs();
                tracing::info!(
                    path = %path.display(),
                    "done in {} minutes and {} seconds",
                    elapsed / 60,
                    elapsed % 60
                );
                GenerationResult::Success { path }
            }
            Ok(failure) => failure,
            Err(e) => self.report_error(e),
        }
    }

    async fn try_run(&self, request: &VideoGenerationRequest) -> Result<GenerationResult> {
        let job = self.submit(request).await?;
        let job = self.await_completion(job).await?;
        self.fetch_and_store(&job).await
    }

    /// Creates the remote job.
    pub async fn submit(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
        let job = self.service.create_job(request).await?;
        tracing::info!(video_id = %job.id, status = %job.status, "video job created");
        Ok(job)
    }

    /// Polls at a fixed interval until the job reaches a terminal status.
    ///
    /// Without a configured timeout this waits indefinitely.
    pub async fn await_completion(&self, mut job: VideoJob) -> Result<VideoJob> {
        let started = self.clock.instant();

        while !job.status.is_terminal() {
            tracing::info!(
                video_id = %job.id,
                status = %job.status,
                progress = job.progress,
                "waiting for video generation"
            );

            if let Some(timeout) = self.config.timeout {
                let elapsed = self.clock.instant().saturating_duration_since(started);
                if elapsed >= timeout {
                    return Err(RunnerError::Timeout(timeout));
                }
            }

            self.clock.sleep(self.config.poll_interval).await;
            job = self.service.retrieve_job(&job.id).await?;
        }

        Ok(job)
    }

    /// Downloads a completed job into the output directory. Failed and
    /// cancelled jobs produce no file and no download.
    pub async fn fetch_and_store(&self, job: &VideoJob) -> Result<GenerationResult> {
        match job.status {
            JobStatus::Completed => {
                tracing::info!(video_id = %job.id, "video generation completed, downloading");
                let data = self
                    .service
                    .download_content(&job.id, ContentVariant::Video)
                    .await?;
                let path = self.output_path();
                write_atomically(&path, &data).await?;
                tracing::info!(path = %path.display(), bytes = data.len(), "video saved");
                Ok(GenerationResult::Success { path })
            }
            JobStatus::Failed => {
                let message = job.failure_message().map(str::to_string);
                tracing::warn!(video_id = %job.id, error = ?message, "video generation failed");
                Ok(GenerationResult::Failure {
                    reason: FailureReason::JobFailed { message },
                })
            }
            JobStatus::Cancelled => {
                tracing::warn!(video_id = %job.id, "video generation was cancelled");
                Ok(GenerationResult::Failure {
                    reason: FailureReason::JobCancelled,
                })
            }
            ref other => Err(RunnerError::UnexpectedResponse(format!(
                "job {} is not finished (status {other})",
                job.id
            ))),
        }
    }

    /// Path the next saved video would get.
    pub fn output_path(&self) -> PathBuf {
        let stamp = self.clock.now().format(TIMESTAMP_FORMAT);
        self.config
            .output_dir
            .join(format!("{FILE_PREFIX}{stamp}.mp4"))
    }

    fn report_error(&self, e: RunnerError) -> GenerationResult {
        tracing::error!(
            service = self.service.name(),
            remote_rejection = e.is_remote_rejection(),
            "error occurred: {e}"
        );
        GenerationResult::Failure {
            reason: FailureReason::Error {
                detail: e.to_string(),
            },
        }
    }
}

/// Writes to a `.part` sibling and renames it into place, so a partial
/// write never leaves a finished-looking `.mp4`.
async fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    if let Err(e) = tokio::fs::write(&partial, data).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// Generates a video from text using the service described by `config`.
pub async fn text_to_video(
    config: &Config,
    prompt: &str,
    size: VideoSize,
    seconds: VideoSeconds,
) -> GenerationResult {
    match runner_from_config(config) {
        Ok(runner) => runner.text_to_video(prompt, size, seconds).await,
        Err(e) => setup_failure(e),
    }
}

/// Generates a video from text and an image using the service described by `config`.
pub async fn image_to_video(
    config: &Config,
    prompt: &str,
    image_path: impl AsRef<Path>,
    size: VideoSize,
    seconds: VideoSeconds,
) -> GenerationResult {
    match runner_from_config(config) {
        Ok(runner) => runner.image_to_video(prompt, image_path, size, seconds).await,
        Err(e) => setup_failure(e),
    }
}

fn runner_from_config(config: &Config) -> Result<VideoRunner<AzureSoraClient>> {
    let client = AzureSoraClient::from_config(config)?;
    VideoRunner::new(client, config.runner_config())
}

fn setup_failure(e: RunnerError) -> GenerationResult {
    tracing::error!("error occurred: {e}");
    GenerationResult::Failure {
        reason: FailureReason::Error {
            detail: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Local, TimeZone};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};
    use tracing_test::traced_test;

    /// Returns `statuses` in order from `retrieve_job`, after `create_job`
    /// hands back `initial`.
    struct ScriptedService {
        initial: Option<JobStatus>,
        statuses: Mutex<VecDeque<VideoJob>>,
        content: Vec<u8>,
        created: Mutex<Vec<VideoGenerationRequest>>,
        retrieves: Mutex<usize>,
        downloads: Mutex<Vec<ContentVariant>>,
    }

    impl ScriptedService {
        fn new(initial: JobStatus, statuses: &[JobStatus]) -> Self {
            Self {
                initial: Some(initial),
                statuses: Mutex::new(
                    statuses
                        .iter()
                        .map(|s| VideoJob::new("video_1", s.clone()))
                        .collect(),
                ),
                content: b"FAKEMP4".to_vec(),
                created: Mutex::new(Vec::new()),
                retrieves: Mutex::new(0),
                downloads: Mutex::new(Vec::new()),
            }
        }

        fn failing_create() -> Self {
            let mut service = Self::new(JobStatus::Queued, &[]);
            service.initial = None;
            service
        }

        fn with_failed_job(mut self, message: &str) -> Self {
            let mut job = VideoJob::new("video_1", JobStatus::Failed);
            job.error = Some(crate::video::types::JobError {
                code: Some("internal_error".into()),
                message: Some(message.into()),
            });
            self.statuses.get_mut().unwrap().push_back(job);
            self
        }

        fn retrieves(&self) -> usize {
            *self.retrieves.lock().unwrap()
        }

        fn downloads(&self) -> Vec<ContentVariant> {
            self.downloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VideoService for ScriptedService {
        async fn create_job(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
            self.created.lock().unwrap().push(request.clone());
            match &self.initial {
                Some(status) => Ok(VideoJob::new("video_1", status.clone())),
                None => Err(RunnerError::Auth("invalid API key".into())),
            }
        }

        async fn retrieve_job(&self, video_id: &str) -> Result<VideoJob> {
            assert_eq!(video_id, "video_1");
            *self.retrieves.lock().unwrap() += 1;
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| RunnerError::UnexpectedResponse("script exhausted".into()))
        }

        async fn download_content(
            &self,
            video_id: &str,
            variant: ContentVariant,
        ) -> Result<Vec<u8>> {
            assert_eq!(video_id, "video_1");
            self.downloads.lock().unwrap().push(variant);
            Ok(self.content.clone())
        }
    }

    /// Virtual time: `sleep` advances both clocks and records the request.
    struct ManualClock {
        now: Mutex<DateTime<Local>>,
        origin: Instant,
        elapsed: Mutex<Duration>,
        wall_frozen: bool,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
            Self {
                now: Mutex::new(Local.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()),
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                wall_frozen: false,
                sleeps: Mutex::new(Vec::new()),
            }
        }

        /// Wall time stands still while monotonic time moves on, as when
        /// the system clock is stepped back.
        fn with_frozen_wall(mut self) -> Self {
            self.wall_frozen = true;
            self
        }

        fn advance(&self, by: Duration) {
            *self.elapsed.lock().unwrap() += by;
            if !self.wall_frozen {
                let mut now = self.now.lock().unwrap();
                *now += chrono::Duration::from_std(by).unwrap();
            }
        }

        fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }

        fn now(&self) -> DateTime<Local> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            self.origin + *self.elapsed.lock().unwrap()
        }
    }

    fn runner_config(dir: &Path) -> RunnerConfig {
        RunnerConfig {
            output_dir: dir.join("videos"),
            ..RunnerConfig::default()
        }
    }

    fn mp4_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_success_writes_content_to_timestamped_path() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Queued, &[JobStatus::Completed]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 12);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner
            .text_to_video("A dog running on a beach", VideoSize::Landscape, VideoSeconds::Eight)
            .await;

        let path = result.path().expect("expected a saved video").to_path_buf();
        // One 10s poll before the completed status arrives.
        assert_eq!(
            path,
            tmp.path().join("videos").join("sora2_video_15Mar2025_143022.mp4")
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"FAKEMP4");
        assert_eq!(service.downloads(), vec![ContentVariant::Video]);
        assert_eq!(mp4_files(&tmp.path().join("videos")), vec![path]);

        let created = service.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].prompt, "A dog running on a beach");
        assert_eq!(created[0].size, VideoSize::Landscape);
        assert_eq!(created[0].seconds, VideoSeconds::Eight);
    }

    #[tokio::test]
    async fn test_polls_exactly_n_plus_one_times() {
        let tmp = tempfile::tempdir().unwrap();
        let mut script = vec![JobStatus::Queued, JobStatus::InProgress, JobStatus::InProgress];
        script.push(JobStatus::Completed);
        let service = ScriptedService::new(JobStatus::Queued, &script);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        assert!(result.is_success());
        assert_eq!(service.retrieves(), 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 4]);
        assert_eq!(service.downloads().len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unknown_status_keeps_polling() {
        let tmp = tempfile::tempdir().unwrap();
        let preprocessing = JobStatus::Unknown("preprocessing".into());
        let service = ScriptedService::new(
            preprocessing.clone(),
            &[preprocessing, JobStatus::Completed],
        );
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;
        assert!(result.is_success());
        assert_eq!(service.retrieves(), 2);
        assert!(logs_contain("status=preprocessing"));
    }

    #[tokio::test]
    async fn test_terminal_on_creation_skips_polling() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;
        assert!(result.is_success());
        assert_eq!(service.retrieves(), 0);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_failed_job_yields_failure_without_download() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Queued, &[JobStatus::InProgress])
            .with_failed_job("render crashed");
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        assert_eq!(
            result,
            GenerationResult::Failure {
                reason: FailureReason::JobFailed {
                    message: Some("render crashed".into())
                }
            }
        );
        assert!(service.downloads().is_empty());
        assert!(mp4_files(&tmp.path().join("videos")).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_job_yields_failure_without_download() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Queued, &[JobStatus::Cancelled]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        assert_eq!(result.failure_reason(), Some(&FailureReason::JobCancelled));
        assert!(service.downloads().is_empty());
        assert!(mp4_files(&tmp.path().join("videos")).is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_create_error_yields_failure_and_no_file() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::failing_create();
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner
            .text_to_video("waves", VideoSize::Portrait, VideoSeconds::Four)
            .await;

        match result {
            GenerationResult::Failure {
                reason: FailureReason::Error { detail },
            } => assert!(detail.contains("invalid API key")),
            other => panic!("expected error failure, got {other:?}"),
        }
        assert_eq!(service.retrieves(), 0);
        assert!(service.downloads().is_empty());
        assert!(mp4_files(&tmp.path().join("videos")).is_empty());
        assert!(logs_contain("remote_rejection=true"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_retrieve_error_mid_poll_yields_failure() {
        let tmp = tempfile::tempdir().unwrap();
        // Script runs dry after one in_progress, so the second retrieve errors.
        let service = ScriptedService::new(JobStatus::Queued, &[JobStatus::InProgress]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::Error { .. })
        ));
        assert_eq!(service.retrieves(), 2);
        assert!(service.downloads().is_empty());
        assert!(logs_contain("remote_rejection=false"));
    }

    #[tokio::test]
    async fn test_timeout_extension_stops_polling() {
        let tmp = tempfile::tempdir().unwrap();
        let script = vec![JobStatus::InProgress; 10];
        let service = ScriptedService::new(JobStatus::Queued, &script);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let config = RunnerConfig {
            timeout: Some(Duration::from_secs(25)),
            ..runner_config(tmp.path())
        };
        let runner = VideoRunner::with_clock(&service, &clock, config).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        match result.failure_reason() {
            Some(FailureReason::Error { detail }) => assert!(detail.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
        // Checks at 0s, 10s, 20s pass; the check at 30s trips.
        assert_eq!(service.retrieves(), 3);
        assert!(service.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_ignores_wall_clock() {
        let tmp = tempfile::tempdir().unwrap();
        let script = vec![JobStatus::InProgress; 10];
        let service = ScriptedService::new(JobStatus::Queued, &script);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0).with_frozen_wall();
        let config = RunnerConfig {
            timeout: Some(Duration::from_secs(25)),
            ..runner_config(tmp.path())
        };
        let runner = VideoRunner::with_clock(&service, &clock, config).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::Error { detail }) if detail.contains("timed out")
        ));
        assert_eq!(service.retrieves(), 3);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_elapsed_time_uses_monotonic_clock() {
        let tmp = tempfile::tempdir().unwrap();
        let service =
            ScriptedService::new(JobStatus::Queued, &[JobStatus::InProgress, JobStatus::Completed]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 22).with_frozen_wall();
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;

        let path = result.path().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "sora2_video_15Mar2025_143022.mp4"
        );
        assert!(logs_contain("done in 0 minutes and 20 seconds"));
    }

    #[tokio::test]
    async fn test_missing_image_yields_failure_without_create() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner
            .image_to_video(
                "make it move",
                tmp.path().join("missing.png"),
                VideoSize::Landscape,
                VideoSeconds::Eight,
            )
            .await;

        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::Error { .. })
        ));
        assert!(service.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_image_to_video_sends_reference_image() {
        let tmp = tempfile::tempdir().unwrap();
        let image_path = tmp.path().join("first_frame.png");
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];
        std::fs::write(&image_path, &png).unwrap();

        let service = ScriptedService::new(JobStatus::Queued, &[JobStatus::Completed]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let result = runner
            .image_to_video("make it move", &image_path, VideoSize::Portrait, VideoSeconds::Twelve)
            .await;
        assert!(result.is_success());

        let created = service.created.lock().unwrap();
        let image = created[0].reference_image.as_ref().unwrap();
        assert_eq!(image.data, png);
        assert_eq!(image.file_name, "first_frame.png");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(created[0].seconds, VideoSeconds::Twelve);
    }

    #[tokio::test]
    async fn test_runs_more_than_a_second_apart_do_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let config = runner_config(tmp.path());

        let first = VideoRunner::with_clock(&service, &clock, config.clone())
            .unwrap()
            .run(&VideoGenerationRequest::new("one"))
            .await;
        clock.advance(Duration::from_millis(1500));
        // Second runner on the same directory: setup must not fail.
        let second = VideoRunner::with_clock(&service, &clock, config)
            .unwrap()
            .run(&VideoGenerationRequest::new("two"))
            .await;

        let (a, b) = (first.into_path().unwrap(), second.into_path().unwrap());
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
        assert_eq!(mp4_files(&tmp.path().join("videos")).len(), 2);
    }

    #[test]
    fn test_output_dir_setup_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let config = runner_config(tmp.path());

        VideoRunner::new(&service, config.clone()).unwrap();
        let runner = VideoRunner::new(&service, config).unwrap();
        assert!(runner.output_dir().is_dir());
    }

    #[test]
    fn test_output_path_format() {
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let clock = ManualClock::at(2025, 3, 5, 9, 7, 3);
        let tmp = tempfile::tempdir().unwrap();
        let runner = VideoRunner::with_clock(&service, &clock, runner_config(tmp.path())).unwrap();

        let path = runner.output_path();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "sora2_video_05Mar2025_090703.mp4"
        );
        assert!(path.starts_with(tmp.path().join("videos")));
    }

    #[tokio::test]
    async fn test_write_failure_yields_failure_and_no_mp4() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let clock = ManualClock::at(2025, 3, 15, 14, 30, 0);
        let config = runner_config(tmp.path());
        let runner = VideoRunner::with_clock(&service, &clock, config.clone()).unwrap();

        // Pull the directory out from under the runner.
        std::fs::remove_dir_all(&config.output_dir).unwrap();

        let result = runner.run(&VideoGenerationRequest::new("waves")).await;
        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::Error { .. })
        ));
        assert!(!config.output_dir.exists());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A non-empty directory at the target makes the rename fail.
        let target = tmp.path().join("clip.mp4");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_atomically(&target, b"FAKEMP4").await.unwrap_err();

        assert!(matches!(err, RunnerError::Io(_)));
        assert!(!tmp.path().join("clip.mp4.part").exists());
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn test_fetch_and_store_rejects_unfinished_job() {
        let tmp = tempfile::tempdir().unwrap();
        let service = ScriptedService::new(JobStatus::Completed, &[]);
        let runner = VideoRunner::new(&service, runner_config(tmp.path())).unwrap();

        let err = runner
            .fetch_and_store(&VideoJob::new("video_1", JobStatus::InProgress))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::UnexpectedResponse(_)));
        assert!(service.downloads().is_empty());
    }

    #[tokio::test]
    async fn test_free_function_reports_bad_config() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            endpoint: "https://res.openai.azure.com".into(),
            api_key: String::new(),
            model: "sora-2".into(),
            runner: runner_config(tmp.path()),
        };

        let result =
            text_to_video(&config, "waves", VideoSize::Landscape, VideoSeconds::Eight).await;
        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::Error { .. })
        ));
    }
}
