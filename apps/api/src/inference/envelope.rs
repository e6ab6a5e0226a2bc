//! Normalizes provider response bodies into a plain `RawCompletion`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{InferenceError, RawCompletion};

/// Extracts generated text from a successful response body, whatever
/// envelope the provider wrapped it in. Non-JSON bodies are taken verbatim.
pub fn normalize(body: &str) -> Result<RawCompletion, InferenceError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Ok(RawCompletion::new(body)),
    };

    if let Some(error) = error_message(&value) {
        return Err(failure_from_message(200, error, &value));
    }

    generated_text(&value).map(RawCompletion::new).ok_or_else(|| {
        InferenceError::UnrecognizedEnvelope(truncate(body, 200))
    })
}

/// Maps a non-success response into the matching `InferenceError`.
pub fn classify_failure(status: u16, body: &str) -> InferenceError {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match error_message(&value) {
            Some(message) => failure_from_message(status, message, &value),
            None => InferenceError::Api {
                status,
                message: body.to_string(),
            },
        },
        Err(_) if mentions_loading(body) => InferenceError::ModelLoading {
            estimated_time: None,
        },
        Err(_) => InferenceError::Api {
            status,
            message: body.to_string(),
        },
    }
}

fn failure_from_message(status: u16, message: String, value: &Value) -> InferenceError {
    if mentions_loading(&message) {
        InferenceError::ModelLoading {
            estimated_time: value.get("estimated_time").and_then(Value::as_f64),
        }
    } else {
        InferenceError::Api { status, message }
    }
}

static MODEL_LOADING_PATTERN: OnceLock<Regex> = OnceLock::new();

// HuggingFace phrasing: "Model gpt2 is currently loading".
fn get_model_loading_pattern() -> &'static Regex {
    MODEL_LOADING_PATTERN.get_or_init(|| Regex::new(r"(?i)\bis\s+(?:currently\s+)?loading\b").unwrap())
}

fn mentions_loading(message: &str) -> bool {
    get_model_loading_pattern().is_match(message)
}

/// `{"error": "..."}` (HuggingFace) or `{"error": {"message": "..."}}` (OpenAI).
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn generated_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let texts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("generated_text").and_then(Value::as_str))
                .collect();
            if texts.is_empty() {
                None
            } else {
                Some(texts.join("\n"))
            }
        }
        Value::Object(_) => {
            if let Some(text) = value.get("generated_text").and_then(Value::as_str) {
                return Some(text.to_string());
            }
            let choice = value.get("choices")?.get(0)?;
            choice
                .pointer("/message/content")
                .or_else(|| choice.get("text"))
                .and_then(Value::as_str)
                .map(str::to_string)
        }
        _ => None,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huggingface_array_envelope() {
        let body = r#"[{"generated_text":"Gift: Kite"}]"#;
        assert_eq!(normalize(body).unwrap().as_str(), "Gift: Kite");
    }

    #[test]
    fn test_multiple_generations_are_joined() {
        let body = r#"[{"generated_text":"Gift: Kite"},{"generated_text":"Gift: Mug"}]"#;
        assert_eq!(normalize(body).unwrap().as_str(), "Gift: Kite\nGift: Mug");
    }

    #[test]
    fn test_single_object_envelope() {
        let body = r#"{"generated_text":"Gift: Kite"}"#;
        assert_eq!(normalize(body).unwrap().as_str(), "Gift: Kite");
    }

    #[test]
    fn test_chat_completion_envelope() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"1. Mug: Warm"}}]}"#;
        assert_eq!(normalize(body).unwrap().as_str(), "1. Mug: Warm");
    }

    #[test]
    fn test_legacy_completion_envelope() {
        let body = r#"{"choices":[{"text":"Gift: Pen"}]}"#;
        assert_eq!(normalize(body).unwrap().as_str(), "Gift: Pen");
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(normalize("Gift: Kite").unwrap().as_str(), "Gift: Kite");
        assert_eq!(normalize(r#""Gift: Kite""#).unwrap().as_str(), "Gift: Kite");
    }

    #[test]
    fn test_unknown_envelope_is_rejected() {
        let err = normalize(r#"{"result":42}"#).unwrap_err();
        assert!(matches!(err, InferenceError::UnrecognizedEnvelope(_)));
        let err = normalize("[]").unwrap_err();
        assert!(matches!(err, InferenceError::UnrecognizedEnvelope(_)));
    }

    #[test]
    fn test_error_in_success_body() {
        let err = normalize(r#"{"error":"Model gpt2 is currently loading"}"#).unwrap_err();
        assert!(err.is_model_loading());
    }

    #[test]
    fn test_classify_openai_error_object() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
        match classify_failure(429, body) {
            InferenceError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_loading_errors_are_not_transient() {
        match classify_failure(500, r#"{"error":"Error loading tokenizer"}"#) {
            InferenceError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Error loading tokenizer");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(!classify_failure(500, "error while loading weights").is_model_loading());
        assert!(classify_failure(503, r#"{"error":"Model gpt2 is currently loading"}"#)
            .is_model_loading());
    }

    #[test]
    fn test_classify_plain_text_failure() {
        assert!(classify_failure(503, "Model is loading, retry later").is_model_loading());
        match classify_failure(502, "Bad Gateway") {
            InferenceError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
