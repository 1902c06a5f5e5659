// crates/llm/src/prompt.rs

/// Builds the fixed instruction templates sent to the model.
///
/// The templates are deterministic up to the embedded text; the response
/// parser's assumptions (one JSON object, or one VALID/INVALID line) depend
/// on that.
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Prompt asking the model to extract booking details from the
    /// conversation as a single JSON object.
    pub fn extraction_prompt(&self, conversation: &str) -> String {
        format!(
            r#"You are a restaurant booking assistant. Analyze this conversation and extract booking information.

Conversation: {conversation}

Extract the following in JSON format:
{{
    "intent": "book_table" or "unknown",
    "numberOfGuests": number or null,
    "date": date string or null,
    "time": time string or null,
    "cuisine": cuisine preference or null
}}

Reply with ONLY the JSON, no other text."#
        )
    }

    /// Prompt asking the model to classify a special request, answering in
    /// the two-token "VALID: reason" / "INVALID: reason" format.
    pub fn validation_prompt(&self, request: &str) -> String {
        format!(
            r#"You are a restaurant booking assistant. Analyze if this special request is valid.

Special Request: "{request}"

Valid requests include:
- Allergies (nut allergy, shellfish allergy, lactose intolerant, etc.)
- Medical conditions (diabetes, celiac disease, etc.)
- Dietary restrictions (vegetarian, vegan, halal, kosher, gluten-free, etc.)
- Special occasions (birthday, anniversary)
- Accessibility needs (wheelchair access, high chair needed)

Invalid requests include:
- Unrelated demands
- Inappropriate requests
- Nonsense text

Respond with ONLY "VALID" or "INVALID" followed by a brief reason.
Format: VALID: [reason] OR INVALID: [reason]"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_is_deterministic() {
        let prompts = PromptBuilder::new();
        let a = prompts.extraction_prompt("book a table for two");
        let b = prompts.extraction_prompt("book a table for two");
        assert_eq!(a, b);
    }

    #[test]
    fn extraction_prompt_names_every_slot() {
        let prompt = PromptBuilder::new().extraction_prompt("hello");
        for key in ["intent", "numberOfGuests", "date", "time", "cuisine"] {
            assert!(prompt.contains(key), "missing schema key {key}");
        }
        assert!(prompt.contains("ONLY the JSON"));
    }

    #[test]
    fn validation_prompt_embeds_the_request_and_format() {
        let prompt = PromptBuilder::new().validation_prompt("I have a nut allergy");
        assert!(prompt.contains("\"I have a nut allergy\""));
        assert!(prompt.contains("VALID: [reason] OR INVALID: [reason]"));
    }
}
