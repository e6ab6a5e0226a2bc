mod config;
mod errors;
mod inference;
mod routes;
mod state;
mod suggestions;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::inference::{HttpInferenceClient, InferenceClient, RetryPolicy, RetryingClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gift Suggester API v{}", env!("CARGO_PKG_VERSION"));

    let inference = build_inference_client(&config)?;

    let state = AppState {
        config: config.clone(),
        inference,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the provider client wrapped in the model-loading retry policy.
/// Returns `None` when the credential is missing so the service still starts.
fn build_inference_client(config: &Config) -> Result<Option<Arc<dyn InferenceClient>>> {
    let Some(api_key) = config.api_key.clone() else {
        warn!(
            "{} is not set; suggestion requests will fail until it is configured",
            config.provider.credential_var()
        );
        return Ok(None);
    };

    let http = HttpInferenceClient::new(
        config.provider,
        config.inference_url.clone(),
        config.inference_model.clone(),
        api_key,
        config.request_timeout,
    )?;
    info!(
        "Inference client initialized (provider: {}, url: {})",
        http.provider(),
        config.inference_url
    );

    let policy = RetryPolicy {
        max_attempts: config.max_attempts,
        delay: config.retry_delay,
    };

    let client: Arc<dyn InferenceClient> = Arc::new(RetryingClient::new(Arc::new(http), policy));
    Ok(Some(client))
}
