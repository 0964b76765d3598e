use serde::{Deserialize, Serialize};

fn default_use_case() -> String {
    "general".to_string()
}

/// Body accepted by the invoke routes.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_use_case")]
    pub use_case: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvokeResponse {
    pub model_used: String,
    pub response: String,
}
