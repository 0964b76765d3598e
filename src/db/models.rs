use crate::error::GateError;
use crate::evaluation::SampleRecord;
use crate::strategy::SelectionStrategy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted strategy document row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbStrategy {
    pub id: i64,
    pub document: String,
    pub created_at: DateTime<Utc>,
}

impl DbStrategy {
    pub fn parse(&self) -> Result<SelectionStrategy, GateError> {
        Ok(serde_json::from_str(&self.document)?)
    }
}

/// A persisted evaluation sample row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbSample {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
}

impl From<DbSample> for SampleRecord {
    fn from(row: DbSample) -> Self {
        SampleRecord {
            variant: row.variant,
            question: row.question,
            context: row.context,
            output: row.output,
            latency_secs: row.latency_secs,
            input_tokens: row.input_tokens,
            output_tokens: row.output_tokens,
            cost: row.cost,
            similarity: row.similarity,
            error: row.error,
        }
    }
}
