// crates/nlu/src/interpret.rs

use std::sync::Arc;

use maitre_core::{BookingSlots, ConversationTurn, Intent, Interpretation};
use maitre_llm::{PromptBuilder, TextGenerator};
use serde_json::{Map as JsonMap, Value};
use tracing::{debug, warn};

use crate::parse::extract_json_object;

const BOOKING_KEYWORDS: &[&str] = &["book", "table", "reservation"];

/// Fixed confirmation shown to the caller. A static template, deliberately
/// not derived from the extracted slots.
pub fn booking_reply() -> &'static str {
    "I understand you want to book a table. \
     I will help collect your guest count, date, time, cuisine, and any special requests."
}

/// Hybrid slot/intent resolver: ask the model first, fall back to keyword
/// and digit matching when it is unavailable or unhelpful.
///
/// Pure function of the request plus one external call; safe to share
/// across concurrent requests.
pub struct Interpreter {
    backend: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
}

impl Interpreter {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self {
            backend,
            prompts: PromptBuilder::new(),
        }
    }

    /// Always produces a result; the worst case is `Unknown` with empty
    /// slots. Model failures never propagate to the caller.
    pub async fn interpret(&self, history: &[ConversationTurn]) -> Interpretation {
        let text = conversation_text(history);
        let prompt = self.prompts.extraction_prompt(&text);

        let raw = match self.backend.generate(&prompt).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("LLM extraction failed, using rule-based fallback: {}", err);
                String::new()
            }
        };

        let (mut intent, mut slots) = match extract_json_object(&raw) {
            Some(fields) => structured_interpretation(&fields),
            None => (Intent::Unknown, BookingSlots::default()),
        };

        if intent == Intent::Unknown && contains_booking_keyword(&text) {
            debug!("Keyword fallback resolved intent to book_table");
            intent = Intent::BookTable;
        }

        // Digit scan fires only when the structured path produced no guest
        // count; other filled slots do not suppress it.
        if slots.number_of_guests.is_none() {
            slots.number_of_guests = first_digit_token(&text);
        }

        Interpretation { intent, slots }
    }
}

fn conversation_text(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| turn.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn structured_interpretation(fields: &JsonMap<String, Value>) -> (Intent, BookingSlots) {
    let intent = fields
        .get("intent")
        .and_then(Value::as_str)
        .map(Intent::from_label)
        .unwrap_or(Intent::Unknown);

    let slots = BookingSlots {
        number_of_guests: fields.get("numberOfGuests").and_then(guest_count),
        date: fields.get("date").and_then(text_slot),
        time: fields.get("time").and_then(text_slot),
        cuisine: fields.get("cuisine").and_then(text_slot),
    };

    (intent, slots)
}

/// Models emit the guest count as a number or, often enough, a digit string.
fn guest_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_slot(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn contains_booking_keyword(text: &str) -> bool {
    BOOKING_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

/// First whitespace-delimited token made entirely of ASCII digits; the scan
/// stops at the first match.
fn first_digit_token(text: &str) -> Option<u64> {
    text.split_whitespace()
        .find(|token| token.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|token| token.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::tests::MockBackend;
    use maitre_core::Role;

    fn turns(texts: &[&str]) -> Vec<ConversationTurn> {
        texts
            .iter()
            .map(|text| ConversationTurn {
                role: Role::User,
                content: text.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn structured_output_fills_intent_and_slots() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            r#"{"intent":"book_table","numberOfGuests":4,"date":"tomorrow"}"#.to_string(),
        )]));
        let interpreter = Interpreter::new(backend.clone());

        let result = interpreter
            .interpret(&turns(&["Can I book a table for 9 people"]))
            .await;

        assert_eq!(result.intent, Intent::BookTable);
        // The digit scan must not overwrite a structured guest count.
        assert_eq!(result.slots.number_of_guests, Some(4));
        assert_eq!(result.slots.date.as_deref(), Some("tomorrow"));
        assert!(result.slots.time.is_none());
        assert!(result.slots.cuisine.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn keyword_fallback_when_model_is_unavailable() {
        let backend = Arc::new(MockBackend::always_empty());
        let interpreter = Interpreter::new(backend);

        let result = interpreter
            .interpret(&turns(&["I'd like a RESERVATION please"]))
            .await;

        assert_eq!(result.intent, Intent::BookTable);
    }

    #[tokio::test]
    async fn no_keywords_and_no_model_means_unknown() {
        let backend = Arc::new(MockBackend::always_empty());
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["what time is it"])).await;

        assert_eq!(result.intent, Intent::Unknown);
        assert!(result.slots.is_empty());
    }

    #[tokio::test]
    async fn first_digit_token_becomes_the_guest_count() {
        let backend = Arc::new(MockBackend::always_empty());
        let interpreter = Interpreter::new(backend);

        let result = interpreter
            .interpret(&turns(&["book a table for 4 people around 7 tonight"]))
            .await;

        assert_eq!(result.intent, Intent::BookTable);
        assert_eq!(result.slots.number_of_guests, Some(4));
    }

    #[tokio::test]
    async fn digit_scan_ignores_tokens_with_trailing_text() {
        let backend = Arc::new(MockBackend::always_empty());
        let interpreter = Interpreter::new(backend);

        let result = interpreter
            .interpret(&turns(&["table at 7pm for 2 please"]))
            .await;

        // "7pm" is not all digits; "2" is the first qualifying token.
        assert_eq!(result.slots.number_of_guests, Some(2));
    }

    #[tokio::test]
    async fn digit_scan_runs_even_when_other_slots_are_structured() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            r#"{"intent":"book_table","date":"friday","cuisine":"italian"}"#.to_string(),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter
            .interpret(&turns(&["book italian for 6 on friday"]))
            .await;

        assert_eq!(result.slots.date.as_deref(), Some("friday"));
        assert_eq!(result.slots.cuisine.as_deref(), Some("italian"));
        assert_eq!(result.slots.number_of_guests, Some(6));
    }

    #[tokio::test]
    async fn malformed_model_output_falls_back_cleanly() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            "garbage text {not json".to_string(),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["book a table"])).await;

        assert_eq!(result.intent, Intent::BookTable);
    }

    #[tokio::test]
    async fn unrecognized_intent_labels_collapse_to_unknown() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            r#"{"intent":"order_takeaway"}"#.to_string(),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["deliver some food"])).await;

        assert_eq!(result.intent, Intent::Unknown);
    }

    #[tokio::test]
    async fn null_and_empty_structured_slots_are_omitted() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            r#"{"intent":"book_table","numberOfGuests":null,"date":"","cuisine":"thai"}"#
                .to_string(),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["thai food please"])).await;

        assert!(result.slots.date.is_none());
        assert_eq!(result.slots.cuisine.as_deref(), Some("thai"));
        assert!(result.slots.number_of_guests.is_none());
    }

    #[tokio::test]
    async fn backend_errors_never_propagate() {
        let backend = Arc::new(MockBackend::scripted(vec![Err(
            maitre_core::MaitreError::Llm("boom".to_string()),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["book a table for 3"])).await;

        assert_eq!(result.intent, Intent::BookTable);
        assert_eq!(result.slots.number_of_guests, Some(3));
    }

    #[tokio::test]
    async fn guest_count_accepts_digit_strings() {
        let backend = Arc::new(MockBackend::scripted(vec![Ok(
            r#"{"intent":"book_table","numberOfGuests":"5"}"#.to_string(),
        )]));
        let interpreter = Interpreter::new(backend);

        let result = interpreter.interpret(&turns(&["a table please"])).await;

        assert_eq!(result.slots.number_of_guests, Some(5));
    }
}
