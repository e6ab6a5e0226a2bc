use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::inference::InferenceError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant renders the `{success: false, error, details}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} is not set")]
    Configuration(&'static str),

    #[error("Invalid request body: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::Configuration(var) => {
                tracing::error!("Configuration error: {var} is not set");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error",
                )
            }
            AppError::MalformedRequest(e) => {
                tracing::warn!("Malformed request body: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate suggestions",
                )
            }
            AppError::Inference(e) => {
                if e.is_model_loading() {
                    tracing::warn!("Model still loading after retries: {e}");
                } else {
                    tracing::error!("Inference error: {e}");
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate suggestions",
                )
            }
            AppError::MethodNotAllowed => {
                let body = Json(json!({
                    "success": false,
                    "error": "Method Not Allowed"
                }));
                return (StatusCode::METHOD_NOT_ALLOWED, body).into_response();
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error,
            "details": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_configuration_error_names_variable() {
        let (status, body) = render(AppError::Configuration("HUGGINGFACE_API_KEY")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Server configuration error");
        assert_eq!(body["details"], "HUGGINGFACE_API_KEY is not set");
    }

    #[tokio::test]
    async fn test_inference_error_envelope() {
        let error = AppError::from(InferenceError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        });
        let (status, body) = render(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate suggestions");
        assert_eq!(body["details"], "API error (status 429): Rate limit reached");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, body) = render(AppError::MethodNotAllowed).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Method Not Allowed");
    }
}
