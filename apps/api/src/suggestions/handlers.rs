//! Axum route handlers for the Suggestion API.

use axum::{body::Bytes, extract::State, Json};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::suggestions::extractor::extract_suggestions;
use crate::suggestions::models::{SuggestionRequest, SuggestionResponse};
use crate::suggestions::prompts::build_prompt;
use crate::state::AppState;

/// POST /api/gift-suggestions
///
/// Form → prompt → provider → extractor. The body is parsed by hand so a
/// malformed payload gets the same JSON error envelope as every other failure.
pub async fn handle_suggest(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SuggestionResponse>, AppError> {
    let request: SuggestionRequest = serde_json::from_slice(&body)?;

    let inference = state
        .inference
        .as_ref()
        .ok_or(AppError::Configuration(state.config.provider.credential_var()))?;

    let prompt = build_prompt(&request);
    debug!("Sending prompt to {}: {prompt}", state.config.provider);

    let completion = inference.generate(&prompt).await?.without_prompt_echo(&prompt);
    let suggestions = extract_suggestions(completion.as_str());

    info!("Extracted {} gift suggestions", suggestions.len());

    Ok(Json(SuggestionResponse {
        success: true,
        suggestions,
    }))
}

/// Any method other than POST (OPTIONS is answered by the CORS layer).
pub async fn handle_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
