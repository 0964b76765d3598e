//! Offline evaluation run: benchmark every configured variant on the
//! test suite, persist the samples, derive and publish the selection
//! strategy, and print the document for external configuration stores.

use mimalloc::MiMalloc;
use std::fs;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use modelgate::api::InferenceClient;
use modelgate::db::EvalStorage;
use modelgate::evaluation::{EvaluationRunner, suite};
use modelgate::strategy::derive_strategy;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &modelgate::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let cases = suite::load(cfg.suite_path.as_deref())?;
    info!(
        cases = cases.len(),
        variants = cfg.variants.len(),
        "starting evaluation run"
    );

    let client = reqwest::Client::builder().build()?;
    let api = InferenceClient::from_config(client, cfg)?;
    let runner = EvaluationRunner::new(&api, cfg);
    let samples = runner.run(&cases).await?;

    let failures = samples.iter().filter(|s| !s.is_success()).count();
    info!(
        samples = samples.len(),
        failures, "evaluation run complete"
    );

    let storage = EvalStorage::connect(&cfg.database_url).await?;
    storage.insert_samples(&samples).await?;

    let strategy = derive_strategy(&samples)?;
    let id = storage.insert_strategy(&strategy).await?;
    info!(id, primary = %strategy.primary_model, "strategy persisted");

    let document = serde_json::to_string_pretty(&strategy)?;
    if let Some(path) = cfg.strategy_path.as_ref() {
        fs::write(path, &document)?;
        info!(path = %path.display(), "strategy document written");
    }
    println!("{document}");

    Ok(())
}
