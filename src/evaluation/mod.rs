//! Variant benchmarking: runs the test suite against every configured
//! variant and records latency, token cost and answer similarity.

pub mod runner;
pub mod suite;

pub use runner::{EvaluationRunner, SampleRecord};
pub use suite::TestCase;

/// Cosine similarity between two embedding vectors. Zero-length or
/// zero-norm inputs score 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
