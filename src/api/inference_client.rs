use crate::api::inference_api::InferenceApi;
use crate::config::Config;
use crate::error::{GateError, UpstreamError};
use crate::types::chat::{ChatRequest, ChatResponse};
use crate::types::embeddings::{EmbeddingRequest, EmbeddingResponse};
use backon::ExponentialBuilder;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Higher-level caller over [`InferenceApi`] holding endpoint URLs and
/// the upstream key. Cheap to clone; shared between the server state
/// and the evaluation runner.
#[derive(Clone)]
pub struct InferenceClient {
    client: reqwest::Client,
    chat_url: Url,
    embeddings_url: Url,
    key: Arc<str>,
    embedding_model: Arc<str>,
    embedding_dimensions: u32,
}

impl InferenceClient {
    pub fn from_config(client: reqwest::Client, cfg: &Config) -> Result<Self, GateError> {
        Ok(Self {
            client,
            chat_url: cfg.chat_completions_url()?,
            embeddings_url: cfg.embeddings_url()?,
            key: Arc::from(cfg.upstream_key.as_str()),
            embedding_model: Arc::from(cfg.embedding_model.as_str()),
            embedding_dimensions: cfg.embedding_dimensions,
        })
    }

    fn retry_policy() -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(3)
            .with_jitter()
    }

    /// Non-streaming chat completion.
    pub async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse, GateError> {
        let resp = InferenceApi::try_post(
            self.client.clone(),
            self.chat_url.clone(),
            self.key.as_ref(),
            Self::retry_policy(),
            req,
        )
        .await?;
        let resp = check_status(resp).await?;
        Ok(resp.json::<ChatResponse>().await?)
    }

    /// Streaming chat completion; the body is left unconsumed so the
    /// caller can relay SSE events as they arrive.
    pub async fn chat_stream(&self, req: &ChatRequest) -> Result<reqwest::Response, GateError> {
        let resp = InferenceApi::try_post(
            self.client.clone(),
            self.chat_url.clone(),
            self.key.as_ref(),
            Self::retry_policy(),
            req,
        )
        .await?;
        check_status(resp).await
    }

    /// Fetch an embedding vector for the given text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, GateError> {
        let req = EmbeddingRequest {
            model: self.embedding_model.to_string(),
            input: text.to_string(),
            dimensions: self.embedding_dimensions,
        };
        let resp = InferenceApi::try_post(
            self.client.clone(),
            self.embeddings_url.clone(),
            self.key.as_ref(),
            Self::retry_policy(),
            &req,
        )
        .await?;
        let resp = check_status(resp).await?;
        resp.json::<EmbeddingResponse>()
            .await?
            .into_vector()
            .ok_or_else(|| GateError::MalformedResponse("embedding response had no data".into()))
    }
}

/// Map non-success statuses to [`GateError`]. The HTTP status is carried
/// either way; the upstream's own error envelope rides along when it
/// parses so its message can be surfaced.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, GateError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<UpstreamError>(&body) {
        Ok(err) => Err(GateError::UpstreamApi(status, err)),
        Err(_) => Err(GateError::UpstreamStatus(status)),
    }
}
