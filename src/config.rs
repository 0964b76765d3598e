use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};
use url::Url;

/// One hosted model variant under evaluation, with its pricing
/// in USD per 1M tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantConfig {
    pub id: String,
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Runtime configuration, merged from defaults and `GATE_`-prefixed
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub loglevel: String,
    pub database_url: String,
    /// Key expected from gateway callers. Empty disables all access.
    pub gate_key: String,

    /// Base URL of the OpenAI-compatible inference service.
    pub upstream_url: Url,
    /// Bearer key for the inference service.
    pub upstream_key: String,

    pub embedding_model: String,
    pub embedding_dimensions: u32,

    pub variants: Vec<VariantConfig>,

    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    /// Applied to streamed invocations only.
    pub system_prompt: Option<String>,

    /// Overrides the built-in evaluation suite when set.
    pub suite_path: Option<PathBuf>,
    /// The evaluate binary also writes the derived strategy here when set.
    pub strategy_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            database_url: "sqlite:modelgate.sqlite".to_string(),
            gate_key: String::new(),
            upstream_url: Url::parse("http://127.0.0.1:4000").expect("valid default upstream url"),
            upstream_key: String::new(),
            embedding_model: "amazon.titan-embed-text-v2:0".to_string(),
            embedding_dimensions: 1024,
            variants: vec![
                VariantConfig {
                    id: "eu.amazon.nova-micro-v1:0".to_string(),
                    input_per_mtok: 0.035,
                    output_per_mtok: 0.14,
                },
                VariantConfig {
                    id: "eu.amazon.nova-lite-v1:0".to_string(),
                    input_per_mtok: 0.06,
                    output_per_mtok: 0.24,
                },
                VariantConfig {
                    id: "eu.amazon.nova-pro-v1:0".to_string(),
                    input_per_mtok: 0.80,
                    output_per_mtok: 3.20,
                },
                VariantConfig {
                    id: "eu.amazon.nova-2-lite-v1:0".to_string(),
                    input_per_mtok: 0.06,
                    output_per_mtok: 0.24,
                },
            ],
            max_tokens: 500,
            temperature: 0.7,
            top_p: 0.9,
            system_prompt: Some(
                "Respond with a max of 3 paragraphs. Remove any additional characters, \
                 like * or # from the response. Keep only whitespaces and line breaks."
                    .to_string(),
            ),
            suite_path: None,
            strategy_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("GATE_"))
            .extract()
            .expect("invalid GATE_* environment configuration")
    }

    pub fn variant(&self, id: &str) -> Option<&VariantConfig> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn chat_completions_url(&self) -> Result<Url, url::ParseError> {
        self.upstream_url.join("/v1/chat/completions")
    }

    pub fn embeddings_url(&self) -> Result<Url, url::ParseError> {
        self.upstream_url.join("/v1/embeddings")
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::load);
