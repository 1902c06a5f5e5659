// crates/nlu/src/parse.rs

use serde_json::{Map as JsonMap, Value};
use tracing::debug;

/// Extracts the JSON object a model embedded in free-form output.
///
/// Heuristic: slice from the first `{` to the last `}` (inclusive) and try
/// to decode it. Known limitation, not a bug: this assumes the model emits
/// exactly one JSON object with no stray braces after the outer close; two
/// blobs in one response defeat it. Anything undecodable returns `None` —
/// a valid negative outcome, never an error.
pub fn extract_json_object(raw: &str) -> Option<JsonMap<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(fields)) => Some(fields),
        Ok(_) => None,
        Err(err) => {
            debug!("Model output is not decodable JSON: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_clean_object() {
        let fields = extract_json_object(r#"{"intent": "book_table", "numberOfGuests": 4}"#)
            .expect("object expected");
        assert_eq!(fields["intent"], "book_table");
        assert_eq!(fields["numberOfGuests"], 4);
    }

    #[test]
    fn decodes_an_object_wrapped_in_prose() {
        let raw = "Sure! Here is the JSON you asked for:\n{\"intent\": \"unknown\"}\nHope that helps.";
        let fields = extract_json_object(raw).expect("object expected");
        assert_eq!(fields["intent"], "unknown");
    }

    #[test]
    fn tolerates_nested_objects() {
        let raw = r#"{"intent": "book_table", "slots": {"date": "friday"}}"#;
        assert!(extract_json_object(raw).is_some());
    }

    #[test]
    fn garbage_is_a_negative_outcome_not_a_panic() {
        assert!(extract_json_object("garbage text {not json").is_none());
        assert!(extract_json_object("").is_none());
        assert!(extract_json_object("no braces at all").is_none());
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn non_object_json_is_rejected() {
        // An array slips past the brace scan only when braces wrap it.
        assert!(extract_json_object("[1, 2, 3]").is_none());
    }
}
