//! Baseball cards: the normalized executive/technical recommendation record.
//!
//! Model replies are shape-unpredictable even after JSON repair. [`normalize`]
//! classifies whatever came back and always produces a structurally valid
//! [`Card`], preferring to surface content under `executive` over dropping it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::{get_list, get_text, value_to_text};

/// Keys that identify a flat executive-only reply.
pub const EXECUTIVE_VOCABULARY: &[&str] = &[
    "summary",
    "recommendation",
    "activities",
    "project_activities",
    "focus_8w",
    "plan_3y",
    "assumptions",
    "team",
];

/// Fields whose normalized form is always a sequence of text.
const LIST_FIELDS: &[&str] = &[
    "activities",
    "project_activities",
    "focus_8w",
    "plan_3y",
    "assumptions",
    "team",
];

const SUMMARY_FALLBACK_CHARS: usize = 1000;

/// One block of a card. Unknown keys are preserved as the model sent them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardBlock(Map<String, Value>);

impl CardBlock {
    /// Build a block from a raw mapping, coercing list-typed fields.
    ///
    /// `null` values are dropped so absent fields never appear as placeholders.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let coerced = map
            .into_iter()
            .filter_map(|(key, value)| {
                if value.is_null() {
                    None
                } else if LIST_FIELDS.iter().any(|f| key.eq_ignore_ascii_case(f)) {
                    coerce_list(value).map(|v| (key, v))
                } else {
                    Some((key, value))
                }
            })
            .collect();
        CardBlock(coerced)
    }

    /// Block holding only a summary line.
    pub fn with_summary(summary: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("summary".to_string(), Value::String(summary.into()));
        CardBlock(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn summary(&self) -> Option<&str> {
        get_text(&self.0, &["summary"])
    }

    pub fn recommendation(&self) -> Option<&str> {
        get_text(&self.0, &["recommendation"])
    }

    pub fn activities(&self) -> Option<Vec<String>> {
        get_list(&self.0, &["activities", "project_activities"])
    }

    pub fn focus_8w(&self) -> Option<Vec<String>> {
        get_list(&self.0, &["focus_8w"])
    }

    pub fn plan_3y(&self) -> Option<Vec<String>> {
        get_list(&self.0, &["plan_3y"])
    }

    pub fn assumptions(&self) -> Option<Vec<String>> {
        get_list(&self.0, &["assumptions"])
    }

    pub fn team(&self) -> Option<Vec<String>> {
        get_list(&self.0, &["team"])
    }
}

/// Normalized two-block recommendation for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub executive: CardBlock,
    pub technical: CardBlock,
}

impl Card {
    fn executive_only(executive: CardBlock) -> Self {
        Card {
            executive,
            technical: CardBlock::default(),
        }
    }
}

/// Classify a parsed model reply into a [`Card`]. Never fails.
pub fn normalize(parsed: Option<&Value>) -> Card {
    match parsed {
        None | Some(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {
            Card::default()
        }
        Some(Value::Array(items)) => Card::executive_only(CardBlock::with_summary(join_items(items))),
        Some(Value::Object(map)) => normalize_object(map),
    }
}

fn normalize_object(map: &Map<String, Value>) -> Card {
    let has = |k: &str| map.contains_key(k);

    if has("executive") || has("Executive") || has("technical") || has("Technical") {
        // Lowercase pair wins when both are present, otherwise the capitalised
        // spelling is checked first.
        let lower_pair = has("executive") && has("technical");
        let (exec_keys, tech_keys) = if lower_pair {
            (["executive", "Executive"], ["technical", "Technical"])
        } else {
            (["Executive", "executive"], ["Technical", "technical"])
        };
        return Card {
            executive: block_from(first_present(map, &exec_keys)),
            technical: block_from(first_present(map, &tech_keys)),
        };
    }

    let matches_vocabulary = map
        .keys()
        .any(|k| EXECUTIVE_VOCABULARY.contains(&k.to_lowercase().as_str()));
    if matches_vocabulary {
        return Card::executive_only(route_flat_fields(map));
    }

    if map.len() <= 4 {
        // Only reachable without executive/technical keys, so both blocks end up empty.
        return Card {
            executive: block_from(first_present(map, &["executive", "Executive"])),
            technical: block_from(first_present(map, &["technical", "Technical"])),
        };
    }

    let serialized = Value::Object(map.clone()).to_string();
    let truncated: String = serialized.chars().take(SUMMARY_FALLBACK_CHARS).collect();
    Card::executive_only(CardBlock::with_summary(truncated))
}

fn route_flat_fields(map: &Map<String, Value>) -> CardBlock {
    let mut exec = Map::new();
    for (key, value) in map {
        let lower = key.to_lowercase();
        if lower == "project_activities" {
            if !exec.contains_key("activities") {
                exec.insert("activities".to_string(), value.clone());
            }
        } else if EXECUTIVE_VOCABULARY.contains(&lower.as_str()) {
            exec.insert(lower, value.clone());
        } else {
            exec.insert(key.clone(), value.clone());
        }
    }
    CardBlock::from_map(exec)
}

/// First key holding a non-empty value.
fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !is_falsy(v))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

fn block_from(value: Option<&Value>) -> CardBlock {
    match value {
        Some(Value::Object(map)) => CardBlock::from_map(map.clone()),
        Some(Value::String(s)) if !s.trim().is_empty() => CardBlock::with_summary(s.clone()),
        Some(Value::Array(items)) if !items.is_empty() => CardBlock::with_summary(join_items(items)),
        _ => CardBlock::default(),
    }
}

fn join_items(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(value_to_text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Coerce a list-typed field into an array of strings; `null` drops the field.
fn coerce_list(value: Value) -> Option<Value> {
    let items: Vec<Value> = match value {
        Value::Null => return None,
        Value::Array(arr) => arr
            .iter()
            .filter_map(value_to_text)
            .map(Value::String)
            .collect(),
        Value::Object(map) => map
            .values()
            .filter_map(value_to_text)
            .map(Value::String)
            .collect(),
        other => value_to_text(&other)
            .map(Value::String)
            .into_iter()
            .collect(),
    };
    Some(Value::Array(items))
}

/// The roadmap-relevant slice of one category's executive block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFragment {
    pub category: String,
    pub focus_8w: Vec<String>,
    pub plan_3y: Vec<String>,
}

impl CategoryFragment {
    pub fn from_card(category: impl Into<String>, card: &Card) -> Self {
        Self {
            category: category.into(),
            focus_8w: card.executive.focus_8w().unwrap_or_default(),
            plan_3y: card.executive.plan_3y().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_scalars_give_empty_card() {
        assert_eq!(normalize(None), Card::default());
        assert_eq!(normalize(Some(&json!("just text"))), Card::default());
        assert_eq!(normalize(Some(&json!(42))), Card::default());
    }

    #[test]
    fn sequence_becomes_summary() {
        let card = normalize(Some(&json!(["Move", "to", 2, "clouds"])));
        assert_eq!(card.executive.summary(), Some("Move to 2 clouds"));
        assert!(card.technical.is_empty());
    }

    #[test]
    fn capitalised_blocks_are_accepted() {
        let card = normalize(Some(&json!({
            "Executive": {"summary": "Exec"},
            "Technical": {"summary": "Tech"}
        })));
        assert_eq!(card.executive.summary(), Some("Exec"));
        assert_eq!(card.technical.summary(), Some("Tech"));
    }

    #[test]
    fn null_fields_are_dropped_from_blocks() {
        let card = normalize(Some(&json!({
            "executive": {"summary": null, "recommendation": null},
            "technical": {"summary": "Tech", "team": null}
        })));
        assert!(card.executive.is_empty());
        assert_eq!(
            serde_json::to_value(&card).unwrap(),
            json!({"executive": {}, "technical": {"summary": "Tech"}})
        );

        let flat = normalize(Some(&json!({"summary": "s", "recommendation": null})));
        assert!(!flat.executive.as_map().contains_key("recommendation"));
    }

    #[test]
    fn lone_technical_block_leaves_executive_empty() {
        let card = normalize(Some(&json!({"technical": {"team": ["SRE: 2"]}})));
        assert!(card.executive.is_empty());
        assert_eq!(card.technical.team(), Some(vec!["SRE: 2".to_string()]));
    }

    #[test]
    fn flat_fields_route_to_executive() {
        let card = normalize(Some(&json!({
            "Summary": "s",
            "project_activities": ["a1"],
            "owner": "CIO"
        })));
        let exec = card.executive.as_map();
        assert_eq!(exec.get("summary"), Some(&json!("s")));
        assert_eq!(exec.get("activities"), Some(&json!(["a1"])));
        assert_eq!(exec.get("owner"), Some(&json!("CIO")));
        assert!(card.technical.is_empty());
    }

    #[test]
    fn existing_activities_are_not_overwritten() {
        let card = normalize(Some(&json!({
            "activities": ["keep"],
            "project_activities": ["drop"]
        })));
        assert_eq!(card.executive.activities(), Some(vec!["keep".to_string()]));
    }

    #[test]
    fn small_unknown_mapping_gives_empty_blocks() {
        let card = normalize(Some(&json!({"foo": 1, "bar": 2})));
        assert_eq!(card, Card::default());
    }

    #[test]
    fn large_unknown_mapping_is_serialized_and_truncated() {
        let mut map = Map::new();
        for i in 0..200 {
            map.insert(format!("key_{i}"), json!("some long filler value"));
        }
        let card = normalize(Some(&Value::Object(map)));
        let summary = card.executive.summary().unwrap();
        assert_eq!(summary.chars().count(), 1000);
        assert!(summary.starts_with('{'));
        assert!(card.technical.is_empty());
    }

    #[test]
    fn list_fields_are_coerced() {
        let card = normalize(Some(&json!({
            "executive": {
                "focus_8w": "single item",
                "plan_3y": {"year1": "a", "year2": "b"},
                "assumptions": null,
                "activities": ["x", 3]
            },
            "technical": {}
        })));
        let exec = card.executive.as_map();
        assert_eq!(exec.get("focus_8w"), Some(&json!(["single item"])));
        assert_eq!(exec.get("plan_3y"), Some(&json!(["a", "b"])));
        assert!(exec.get("assumptions").is_none());
        assert_eq!(exec.get("activities"), Some(&json!(["x", "3"])));
    }

    #[test]
    fn string_block_becomes_summary() {
        let card = normalize(Some(&json!({"executive": "Do the thing", "technical": null})));
        assert_eq!(card.executive.summary(), Some("Do the thing"));
        assert!(card.technical.is_empty());
    }

    #[test]
    fn fragment_reads_executive_lists() {
        let card = normalize(Some(&json!({
            "executive": {"focus_8w": ["f1", "f2"], "plan_3y": "p1"},
            "technical": {"focus_8w": ["ignored"]}
        })));
        let frag = CategoryFragment::from_card("Data Management", &card);
        assert_eq!(frag.category, "Data Management");
        assert_eq!(frag.focus_8w, vec!["f1", "f2"]);
        assert_eq!(frag.plan_3y, vec!["p1"]);
    }

    #[test]
    fn fragment_defaults_to_empty_lists() {
        let frag = CategoryFragment::from_card("X", &Card::default());
        assert!(frag.focus_8w.is_empty());
        assert!(frag.plan_3y.is_empty());
    }
}
