// tests/interpret_flow.rs

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use maitre_core::{ConversationTurn, Intent, MaitreResult, Role, ValidationOutcome};
use maitre_llm::TextGenerator;
use maitre_nlu::{booking_reply, Interpreter, RequestValidator};

/// Scripted model backend: pops one canned reply per call, then behaves
/// like an unreachable model (empty replies).
struct ScriptedBackend {
    replies: Mutex<VecDeque<MaitreResult<String>>>,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(replies: Vec<MaitreResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn offline() -> Arc<Self> {
        Self::new(Vec::new())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedBackend {
    async fn generate(&self, _prompt: &str) -> MaitreResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

fn user_turns(texts: &[&str]) -> Vec<ConversationTurn> {
    texts
        .iter()
        .map(|text| ConversationTurn {
            role: Role::User,
            content: text.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn structured_model_output_drives_the_result() {
    let backend = ScriptedBackend::new(vec![Ok(r#"Here you go:
{"intent": "book_table", "numberOfGuests": 4, "date": "tomorrow", "time": "19:00"}"#
        .to_string())]);
    let interpreter = Interpreter::new(backend.clone());

    let history = user_turns(&["Hi, can I book a table", "4 of us, tomorrow at 7pm"]);
    let result = interpreter.interpret(&history).await;

    assert_eq!(result.intent, Intent::BookTable);
    assert_eq!(result.slots.number_of_guests, Some(4));
    assert_eq!(result.slots.date.as_deref(), Some("tomorrow"));
    assert_eq!(result.slots.time.as_deref(), Some("19:00"));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn model_outage_still_understands_bookings() {
    let backend = ScriptedBackend::offline();
    let interpreter = Interpreter::new(backend.clone());
    let validator = RequestValidator::new(backend);

    let history = user_turns(&["I need a reservation for 6 people"]);
    let result = interpreter.interpret(&history).await;

    assert_eq!(result.intent, Intent::BookTable);
    assert_eq!(result.slots.number_of_guests, Some(6));

    // The validation sibling also degrades gracefully rather than blocking.
    let outcome = validator.validate("severe shellfish allergy").await;
    assert!(outcome.valid);
    assert_eq!(outcome.reason, "unable to validate, accepting request");
}

#[tokio::test]
async fn non_booking_chatter_resolves_to_unknown() {
    let interpreter = Interpreter::new(ScriptedBackend::offline());

    let result = interpreter
        .interpret(&user_turns(&["do you deliver pizza"]))
        .await;

    assert_eq!(result.intent, Intent::Unknown);
    assert!(result.slots.is_empty());
}

#[tokio::test]
async fn validation_shortcuts_never_touch_the_model() {
    let backend = ScriptedBackend::offline();
    let validator = RequestValidator::new(backend.clone());

    assert_eq!(
        validator.validate("none").await,
        ValidationOutcome::accept("no special requests")
    );
    assert_eq!(
        validator.validate("").await,
        ValidationOutcome::accept("no request provided")
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn validation_follows_the_model_verdict() {
    let backend = ScriptedBackend::new(vec![
        Ok("VALID: dietary restriction".to_string()),
        Ok("INVALID: unrelated demand".to_string()),
    ]);
    let validator = RequestValidator::new(backend);

    let accepted = validator.validate("I have a nut allergy").await;
    assert_eq!(accepted, ValidationOutcome::accept("dietary restriction"));

    let rejected = validator.validate("repaint my car while we dine").await;
    assert_eq!(rejected, ValidationOutcome::reject("unrelated demand"));
}

#[tokio::test]
async fn the_confirmation_reply_is_a_fixed_template() {
    assert!(booking_reply().starts_with("I understand you want to book a table."));
    assert!(booking_reply().contains("special requests"));
}
