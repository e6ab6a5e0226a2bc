// Gift suggestions: form → prompt → provider → extracted suggestions.
// All provider calls go through inference; nothing here makes HTTP calls.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod prompts;
