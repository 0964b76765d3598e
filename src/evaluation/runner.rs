use crate::api::InferenceClient;
use crate::config::{Config, VariantConfig};
use crate::error::GateError;
use crate::evaluation::cosine_similarity;
use crate::evaluation::suite::TestCase;
use crate::types::chat::{ChatRequest, ChatResponse};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// One measured invocation of a variant on a test case. Failed
/// invocations carry `error` and leave the metric fields empty.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    pub variant: String,
    pub question: String,
    pub context: String,
    pub output: Option<String>,
    pub latency_secs: f64,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cost: Option<f64>,
    pub similarity: Option<f64>,
    pub error: Option<String>,
}

impl SampleRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// USD cost of one sample from its token usage and the variant's
/// per-1M-token pricing.
pub fn sample_cost(input_tokens: i64, output_tokens: i64, pricing: &VariantConfig) -> f64 {
    (input_tokens as f64 / 1_000_000.0) * pricing.input_per_mtok
        + (output_tokens as f64 / 1_000_000.0) * pricing.output_per_mtok
}

/// Sequential suite runner. Each case is sent to every configured
/// variant; the ground-truth embedding is fetched once per case and
/// reused across variants.
pub struct EvaluationRunner<'a> {
    api: &'a InferenceClient,
    cfg: &'a Config,
}

impl<'a> EvaluationRunner<'a> {
    pub fn new(api: &'a InferenceClient, cfg: &'a Config) -> Self {
        Self { api, cfg }
    }

    pub async fn run(&self, suite: &[TestCase]) -> Result<Vec<SampleRecord>, GateError> {
        if suite.is_empty() {
            return Err(GateError::EmptySuite);
        }
        let mut samples = Vec::with_capacity(suite.len() * self.cfg.variants.len());

        for case in suite {
            let prompt = case.prompt();
            let truth_embedding = self.api.embed(&case.ground_truth).await?;

            for variant in &self.cfg.variants {
                info!(variant = %variant.id, question = %case.question, "evaluating");
                samples.push(self.sample_one(case, &prompt, variant, &truth_embedding).await);
            }
        }
        Ok(samples)
    }

    async fn sample_one(
        &self,
        case: &TestCase,
        prompt: &str,
        variant: &VariantConfig,
        truth_embedding: &[f32],
    ) -> SampleRecord {
        let started = Instant::now();
        let req = ChatRequest::single_turn(self.cfg, variant.id.clone(), prompt);

        match self.api.chat(&req).await {
            Ok(resp) => {
                let latency_secs = started.elapsed().as_secs_f64();
                self.score_sample(case, variant, resp, latency_secs, truth_embedding)
                    .await
            }
            Err(e) => {
                warn!(variant = %variant.id, error = %e, "invocation failed");
                SampleRecord {
                    variant: variant.id.clone(),
                    question: case.question.clone(),
                    context: case.context.clone(),
                    output: None,
                    latency_secs: started.elapsed().as_secs_f64(),
                    input_tokens: None,
                    output_tokens: None,
                    cost: None,
                    similarity: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn score_sample(
        &self,
        case: &TestCase,
        variant: &VariantConfig,
        resp: ChatResponse,
        latency_secs: f64,
        truth_embedding: &[f32],
    ) -> SampleRecord {
        let output = resp.text().unwrap_or_default().to_string();
        let (input_tokens, output_tokens) = match resp.usage {
            Some(u) => (u.prompt_tokens, u.completion_tokens),
            None => (0, 0),
        };
        let cost = sample_cost(input_tokens, output_tokens, variant);

        // Similarity failure downgrades the sample to an error record
        // rather than aborting the whole run.
        match self.api.embed(&output).await {
            Ok(output_embedding) => {
                let similarity = cosine_similarity(&output_embedding, truth_embedding);
                SampleRecord {
                    variant: variant.id.clone(),
                    question: case.question.clone(),
                    context: case.context.clone(),
                    output: Some(output),
                    latency_secs,
                    input_tokens: Some(input_tokens),
                    output_tokens: Some(output_tokens),
                    cost: Some(cost),
                    similarity: Some(similarity),
                    error: None,
                }
            }
            Err(e) => {
                warn!(variant = %variant.id, error = %e, "embedding failed");
                SampleRecord {
                    variant: variant.id.clone(),
                    question: case.question.clone(),
                    context: case.context.clone(),
                    output: Some(output),
                    latency_secs,
                    input_tokens: Some(input_tokens),
                    output_tokens: Some(output_tokens),
                    cost: Some(cost),
                    similarity: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
