// Prompt template for gift generation.

use crate::suggestions::models::{FormValue, SuggestionRequest};

/// Gift prompt template. Replace: {budget}, {occasion}, {interests},
/// {lifestyle}, {personality}
pub const GIFT_PROMPT_TEMPLATE: &str = "Generate 5 gift ideas based on the following:
Budget: {budget}
Occasion: {occasion}
Interests/Hobbies: {interests}
Lifestyle: {lifestyle}
Personality: {personality}

For each gift idea, provide the name of the gift and a brief description, each gift on its own line.
Format: Gift: [gift name] - Description: [brief description]";

const NOT_SPECIFIED: &str = "not specified";

/// Builds the generation prompt for a submitted form. Pure and deterministic.
pub fn build_prompt(request: &SuggestionRequest) -> String {
    GIFT_PROMPT_TEMPLATE
        .replace("{budget}", &render(request.budget.as_ref()))
        .replace("{occasion}", &render(request.occasion.as_ref()))
        .replace("{interests}", &render(request.interests.as_ref()))
        .replace("{lifestyle}", &render(request.lifestyle.as_ref()))
        .replace("{personality}", &render(request.personality.as_ref()))
}

fn render(value: Option<&FormValue>) -> String {
    let rendered = value.map(ToString::to_string).unwrap_or_default();
    if rendered.trim().is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SuggestionRequest {
        serde_json::from_str(
            r#"{
                "budget": 100,
                "occasion": "Anniversary",
                "interests": "cooking, jazz",
                "lifestyle": "busy professional",
                "personality": "introverted"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_contains_every_field() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("Budget: 100\n"));
        assert!(prompt.contains("Occasion: Anniversary\n"));
        assert!(prompt.contains("Interests/Hobbies: cooking, jazz\n"));
        assert!(prompt.contains("Lifestyle: busy professional\n"));
        assert!(prompt.contains("Personality: introverted\n"));
    }

    #[test]
    fn test_prompt_requests_line_format() {
        let prompt = build_prompt(&request());
        assert!(prompt.starts_with("Generate 5 gift ideas"));
        assert!(prompt.ends_with("Format: Gift: [gift name] - Description: [brief description]"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt(&request()), build_prompt(&request()));
    }

    #[test]
    fn test_missing_fields_are_marked() {
        let prompt = build_prompt(&SuggestionRequest {
            occasion: Some(FormValue::Text("   ".to_string())),
            ..Default::default()
        });
        assert!(prompt.contains("Budget: not specified\n"));
        assert!(prompt.contains("Occasion: not specified\n"));
        assert!(!prompt.contains('{'));
    }
}
