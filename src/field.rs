//! Case-insensitive multi-alias field lookup over card blocks.
//!
//! Every consumer of a card (report rendering, fragment building) resolves fields
//! through these helpers so they never disagree on which key wins.

use serde_json::{Map, Value};

/// Return the value of the first candidate present in `block`, ignoring key case.
///
/// Candidates are tried in order; for each one the block's keys are scanned.
pub fn get_field<'a>(block: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|cand| {
        block
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(cand))
            .map(|(_, value)| value)
    })
}

/// Text field; empty strings and non-text values count as absent.
pub fn get_text<'a>(block: &'a Map<String, Value>, candidates: &[&str]) -> Option<&'a str> {
    get_field(block, candidates)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Sequence field as owned text items.
///
/// A bare string is treated as a one-element sequence; an empty result is absent.
pub fn get_list(block: &Map<String, Value>, candidates: &[&str]) -> Option<Vec<String>> {
    let items: Vec<String> = match get_field(block, candidates)? {
        Value::Array(arr) => arr.iter().filter_map(value_to_text).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };
    (!items.is_empty()).then_some(items)
}

/// Render a JSON value as a single line of text. `null` has no text form.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn lookup_ignores_case() {
        let b = block(json!({"Summary": "hello"}));
        assert_eq!(get_field(&b, &["summary"]), Some(&json!("hello")));
        assert_eq!(get_text(&b, &["SUMMARY"]), Some("hello"));
    }

    #[test]
    fn first_candidate_wins() {
        let b = block(json!({"project_activities": ["p"], "activities": ["a"]}));
        assert_eq!(
            get_list(&b, &["activities", "project_activities"]),
            Some(vec!["a".to_string()])
        );
        assert_eq!(
            get_list(&b, &["project_activities", "activities"]),
            Some(vec!["p".to_string()])
        );
    }

    #[test]
    fn missing_field_is_absent() {
        let b = block(json!({"summary": "x"}));
        assert!(get_field(&b, &["team"]).is_none());
        assert!(get_list(&b, &["team"]).is_none());
    }

    #[test]
    fn string_counts_as_one_item_list() {
        let b = block(json!({"focus_8w": "Stand up landing zone"}));
        assert_eq!(
            get_list(&b, &["focus_8w"]),
            Some(vec!["Stand up landing zone".to_string()])
        );
    }

    #[test]
    fn blank_text_is_absent() {
        let b = block(json!({"summary": "   ", "team": []}));
        assert!(get_text(&b, &["summary"]).is_none());
        assert!(get_list(&b, &["team"]).is_none());
    }
}
