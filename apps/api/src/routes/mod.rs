pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::suggestions::handlers;

pub fn build_router(state: AppState) -> Router {
    let suggest = post(handlers::handle_suggest).fallback(handlers::handle_method_not_allowed);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/gift-suggestions", suggest.clone())
        // Path the existing front-end already posts to
        .route("/.netlify/functions/giftSuggester", suggest)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
