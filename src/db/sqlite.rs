use crate::db::models::{DbSample, DbStrategy};
use crate::db::schema::SQLITE_INIT;
use crate::error::GateError;
use crate::evaluation::SampleRecord;
use crate::strategy::SelectionStrategy;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct EvalStorage {
    pool: SqlitePool,
}

impl EvalStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) and initialize the database.
    pub async fn connect(database_url: &str) -> Result<Self, GateError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), GateError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Append all samples of a run inside one transaction.
    pub async fn insert_samples(&self, samples: &[SampleRecord]) -> Result<(), GateError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for sample in samples {
            sqlx::query(
                r#"
                INSERT INTO eval_samples (
                    variant, question, context, output, latency_secs,
                    input_tokens, output_tokens, cost, similarity, error, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&sample.variant)
            .bind(&sample.question)
            .bind(&sample.context)
            .bind(&sample.output)
            .bind(sample.latency_secs)
            .bind(sample.input_tokens)
            .bind(sample.output_tokens)
            .bind(sample.cost)
            .bind(sample.similarity)
            .bind(&sample.error)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Persist a strategy document. Returns the new row id.
    pub async fn insert_strategy(&self, strategy: &SelectionStrategy) -> Result<i64, GateError> {
        let document =
            serde_json::to_string(strategy).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let created_at = Utc::now().to_rfc3339();
        let result = sqlx::query("INSERT INTO strategies (document, created_at) VALUES (?, ?)")
            .bind(document)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Newest strategy document, if any has been published.
    pub async fn latest_strategy(&self) -> Result<Option<DbStrategy>, GateError> {
        let row = sqlx::query(
            "SELECT id, document, created_at FROM strategies ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_strategy).transpose()
    }

    /// Samples recorded for one variant, newest first.
    pub async fn samples_for_variant(&self, variant: &str) -> Result<Vec<DbSample>, GateError> {
        let rows = sqlx::query(
            r#"SELECT id, variant, question, context, output, latency_secs,
               input_tokens, output_tokens, cost, similarity, error, created_at
               FROM eval_samples WHERE variant = ? ORDER BY id DESC"#,
        )
        .bind(variant)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_sample).collect()
    }

    fn row_to_strategy(row: SqliteRow) -> Result<DbStrategy, GateError> {
        let id: i64 = row.try_get("id")?;
        let document: String = row.try_get("document")?;
        let created_at = Self::parse_timestamp(row.try_get("created_at")?)?;
        Ok(DbStrategy {
            id,
            document,
            created_at,
        })
    }

    fn row_to_sample(row: SqliteRow) -> Result<DbSample, GateError> {
        let id: i64 = row.try_get("id")?;
        let variant: String = row.try_get("variant")?;
        let question: String = row.try_get("question")?;
        let context: String = row.try_get("context")?;
        let output: Option<String> = row.try_get("output")?;
        let latency_secs: f64 = row.try_get("latency_secs")?;
        let input_tokens: Option<i64> = row.try_get("input_tokens")?;
        let output_tokens: Option<i64> = row.try_get("output_tokens")?;
        let cost: Option<f64> = row.try_get("cost")?;
        let similarity: Option<f64> = row.try_get("similarity")?;
        let error: Option<String> = row.try_get("error")?;
        let created_at = Self::parse_timestamp(row.try_get("created_at")?)?;

        Ok(DbSample {
            id,
            variant,
            question,
            context,
            output,
            latency_secs,
            input_tokens,
            output_tokens,
            cost,
            similarity,
            error,
            created_at,
        })
    }

    fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, GateError> {
        Ok(chrono::DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc))
    }
}
