use std::fmt;

use serde::{Deserialize, Serialize};

/// Description used when a suggestion carries none.
pub const MISSING_DESCRIPTION: &str = "No description provided.";

/// A loosely typed form value. Callers send whatever their form produced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    List(Vec<FormValue>),
    /// Objects, `null` list items and anything else valid JSON can hold.
    Other(serde_json::Value),
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Text(text) => f.write_str(text.trim()),
            FormValue::Number(number) => write!(f, "{number}"),
            FormValue::Flag(flag) => write!(f, "{flag}"),
            FormValue::List(items) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(ToString::to_string)
                    .filter(|item| !item.is_empty())
                    .collect();
                f.write_str(&rendered.join(", "))
            }
            FormValue::Other(serde_json::Value::Null) => Ok(()),
            FormValue::Other(value) => write!(f, "{value}"),
        }
    }
}

/// The gift form as submitted. Every field is optional free text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionRequest {
    #[serde(default)]
    pub budget: Option<FormValue>,
    #[serde(default)]
    pub occasion: Option<FormValue>,
    #[serde(default)]
    pub interests: Option<FormValue>,
    #[serde(default)]
    pub lifestyle: Option<FormValue>,
    #[serde(default)]
    pub personality: Option<FormValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub description: String,
}

impl Suggestion {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub success: bool,
    pub suggestions: Vec<Suggestion>,
}
