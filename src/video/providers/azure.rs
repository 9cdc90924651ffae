//! Sora 2 on Azure AI Foundry, through the OpenAI-compatible v1 videos API.

use crate::config::Config;
use crate::error::{parse_retry_after, sanitize_error_message, Result, RunnerError};
use crate::video::service::VideoService;
use crate::video::types::{ContentVariant, VideoGenerationRequest, VideoJob};
use async_trait::async_trait;

const VIDEOS_PATH: &str = "/openai/v1/videos";

/// Sora model deployments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SoraModel {
    /// The default `sora-2` deployment.
    #[default]
    Sora2,
    /// A deployment with a custom name.
    Deployment(String),
}

impl SoraModel {
    /// Returns the value sent as `model`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sora2 => "sora-2",
            Self::Deployment(name) => name,
        }
    }
}

impl From<&str> for SoraModel {
    fn from(name: &str) -> Self {
        match name {
            "sora-2" => Self::Sora2,
            other => Self::Deployment(other.to_string()),
        }
    }
}

/// Builder for AzureSoraClient.
#[derive(Debug, Clone, Default)]
pub struct AzureSoraClientBuilder {
    endpoint: Option<String>,
    api_key: Option<String>,
    model: SoraModel,
    client: Option<reqwest::Client>,
}

impl AzureSoraClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model deployment.
    pub fn model(mut self, model: SoraModel) -> Self {
        self.model = model;
        self
    }

    /// Uses a preconfigured HTTP client (proxies, timeouts).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<AzureSoraClient> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| RunnerError::Config("endpoint not provided".into()))?;
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RunnerError::Auth("API key not provided".into()))?;

        let base_url = format!("{}{}", endpoint.trim().trim_end_matches('/'), VIDEOS_PATH);

        Ok(AzureSoraClient {
            client: self.client.unwrap_or_default(),
            base_url,
            api_key,
            model: self.model,
        })
    }
}

/// HTTP client for the Sora videos API.
pub struct AzureSoraClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: SoraModel,
}

impl std::fmt::Debug for AzureSoraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSoraClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AzureSoraClient {
    /// Creates a new `AzureSoraClientBuilder`.
    pub fn builder() -> AzureSoraClientBuilder {
        AzureSoraClientBuilder::new()
    }

    /// Builds a client from process configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder()
            .endpoint(&config.endpoint)
            .api_key(&config.api_key)
            .model(SoraModel::from(config.model.as_str()))
            .build()
    }

    /// Returns the videos collection URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model deployment.
    pub fn model(&self) -> &SoraModel {
        &self.model
    }

    /// Checks that a key is configured. Does not contact the service.
    pub fn health_check(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            Err(RunnerError::Auth("API key is empty".into()))
        } else {
            Ok(())
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("api-key", &self.api_key)
    }

    fn build_form(&self, request: &VideoGenerationRequest) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.as_str().to_string())
            .text("prompt", request.prompt.clone())
            .text("size", request.size.as_str())
            .text("seconds", request.seconds.to_string());

        if let Some(image) = &request.reference_image {
            let part = reqwest::multipart::Part::bytes(image.data.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime_type)
                .map_err(|e| RunnerError::InvalidRequest(e.to_string()))?;
            form = form.part("input_reference", part);
        }

        Ok(form)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let headers = response.headers().clone();
        let text = response.text().await.unwrap_or_default();
        Err(self.parse_error(status.as_u16(), &text, &headers))
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> RunnerError {
        let text = sanitize_error_message(text);
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return RunnerError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return RunnerError::Auth(text);
        }
        let lower = text.to_lowercase();
        if lower.contains("moderation_blocked")
            || lower.contains("safety")
            || lower.contains("content_policy")
        {
            return RunnerError::ContentBlocked(text);
        }
        if status == 400 || status == 422 {
            return RunnerError::InvalidRequest(text);
        }
        RunnerError::Api {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl VideoService for AzureSoraClient {
    async fn create_job(&self, request: &VideoGenerationRequest) -> Result<VideoJob> {
        let form = self.build_form(request)?;
        tracing::debug!(
            url = %self.base_url,
            model = self.model.as_str(),
            size = %request.size,
            seconds = %request.seconds,
            reference_image = request.reference_image.is_some(),
            "creating video job"
        );

        let response = self
            .authorized(self.client.post(&self.base_url))
            .multipart(form)
            .send()
            .await?;
        let response = self.check(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn retrieve_job(&self, video_id: &str) -> Result<VideoJob> {
        let url = format!("{}/{}", self.base_url, video_id);
        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = self.check(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn download_content(&self, video_id: &str, variant: ContentVariant) -> Result<Vec<u8>> {
        let url = format!("{}/{}/content", self.base_url, video_id);
        tracing::debug!(video_id, variant = variant.as_str(), "downloading video content");

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("variant", variant.as_str())])
            .send()
            .await?;
        let response = self.check(response).await?;
        let data = response.bytes().await?.to_vec();

        if data.is_empty() {
            return Err(RunnerError::UnexpectedResponse(format!(
                "empty {} content for {video_id}",
                variant.as_str()
            )));
        }
        Ok(data)
    }

    fn name(&self) -> &str {
        "Sora 2 (Azure AI Foundry)"
    }
}
