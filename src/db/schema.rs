//! SQL DDL for initializing evaluation storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `eval_samples`: one row per (variant, test case) invocation;
///   metric columns are NULL for failed invocations, `error` holds the
///   failure text
/// - `strategies`: append-only strategy documents (JSON); the active
///   strategy is the newest row
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS eval_samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    variant TEXT NOT NULL,
    question TEXT NOT NULL,
    context TEXT NOT NULL,
    output TEXT NULL,
    latency_secs REAL NOT NULL,
    input_tokens INTEGER NULL,
    output_tokens INTEGER NULL,
    cost REAL NULL,
    similarity REAL NULL,
    error TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

CREATE INDEX IF NOT EXISTS idx_eval_samples_variant ON eval_samples(variant);

CREATE TABLE IF NOT EXISTS strategies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document TEXT NOT NULL, -- JSON SelectionStrategy
    created_at TEXT NOT NULL -- RFC3339
);
"#;
