// crates/nlu/src/validate.rs

use std::sync::Arc;

use maitre_core::{MaitreResult, ValidationOutcome};
use maitre_llm::{PromptBuilder, TextGenerator};
use tracing::{debug, warn};

const NO_REQUEST_MARKERS: &[&str] = &["no special", "no request", "none"];

/// Classifies free-text special requests as valid or invalid.
///
/// Fail-open on every error path: infrastructure problems must never block
/// a customer, so the only time `valid` is false is when the model clearly
/// said so. This bias is product policy, not an accident.
pub struct RequestValidator {
    backend: Arc<dyn TextGenerator>,
    prompts: PromptBuilder,
}

impl RequestValidator {
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self {
            backend,
            prompts: PromptBuilder::new(),
        }
    }

    /// Never fails; any error inside the pipeline converts to an accepting
    /// outcome.
    pub async fn validate(&self, text: &str) -> ValidationOutcome {
        match self.classify(text).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Validation pipeline failed, accepting request: {}", err);
                ValidationOutcome::accept("validation service unavailable")
            }
        }
    }

    async fn classify(&self, text: &str) -> MaitreResult<ValidationOutcome> {
        let request = text.trim();
        if request.is_empty() {
            return Ok(ValidationOutcome::accept("no request provided"));
        }

        let lower = request.to_lowercase();
        if NO_REQUEST_MARKERS.iter().any(|marker| lower.contains(marker)) {
            debug!("Request declines special handling, skipping the model");
            return Ok(ValidationOutcome::accept("no special requests"));
        }

        let prompt = self.prompts.validation_prompt(request);
        let raw = self.backend.generate(&prompt).await?;

        Ok(classify_reply(&raw))
    }
}

/// Scans the model reply for the VALID:/INVALID: markers. The `invalid`
/// absence check matters: "invalid:" contains "valid:" as a substring.
fn classify_reply(raw: &str) -> ValidationOutcome {
    let lower = raw.to_lowercase();

    if lower.contains("valid:") && !lower.contains("invalid") {
        return ValidationOutcome::accept(
            reason_after_colon(raw).unwrap_or_else(|| "accepted".to_string()),
        );
    }

    if lower.contains("invalid:") {
        return ValidationOutcome::reject(
            reason_after_colon(raw).unwrap_or_else(|| "not a valid booking request".to_string()),
        );
    }

    // Empty or unparseable reply: accept rather than block a customer.
    ValidationOutcome::accept("unable to validate, accepting request")
}

fn reason_after_colon(raw: &str) -> Option<String> {
    raw.splitn(2, ':').nth(1).map(|reason| reason.trim().to_string())
}
