use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

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

    info!(
        database_url = %cfg.database_url,
        upstream = %cfg.upstream_url,
        variants = cfg.variants.len(),
        loglevel = %cfg.loglevel,
    );

    if cfg.gate_key.is_empty() {
        warn!("GATE_GATE_KEY is empty; all gateway requests will be rejected");
    }

    let storage = modelgate::db::EvalStorage::connect(&cfg.database_url).await?;
    let handle = modelgate::service::spawn(storage).await;

    let client = reqwest::Client::builder().build()?;
    let inference = modelgate::api::InferenceClient::from_config(client, cfg)?;

    // Build axum router and serve
    let state = modelgate::router::GateState::new(
        handle,
        inference,
        Arc::from(cfg.gate_key.as_str()),
    );
    let app = modelgate::router::gate_router(state);

    let addr = "0.0.0.0:8000";
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
