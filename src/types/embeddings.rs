use serde::{Deserialize, Serialize};

/// OpenAI-compatible embeddings request.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: String,
    pub dimensions: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
}

impl EmbeddingResponse {
    pub fn into_vector(mut self) -> Option<Vec<f32>> {
        if self.data.is_empty() {
            None
        } else {
            Some(self.data.swap_remove(0).embedding)
        }
    }
}
