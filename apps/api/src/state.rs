use std::sync::Arc;

use crate::config::Config;
use crate::inference::InferenceClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when the provider credential is missing; requests then fail
    /// with a configuration error instead of the service refusing to start.
    pub inference: Option<Arc<dyn InferenceClient>>,
}
