//! Consolidation of per-category roadmap fragments into a fixed 4-sprint / 3-year schedule.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::CategoryFragment;
use crate::clients::TextGenerator;
use crate::error::Result;
use crate::field::value_to_text;
use crate::json_repair;
use crate::prompts;

pub const SPRINT_KEYS: [&str; 4] = ["sprint1", "sprint2", "sprint3", "sprint4"];
pub const YEAR_KEYS: [&str; 3] = ["year1", "year2", "year3"];

/// 8-week and 3-year plan. Every sprint and year key is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedSchedule {
    pub focus_8w: BTreeMap<String, Vec<String>>,
    pub plan_3y: BTreeMap<String, Vec<String>>,
}

impl Default for ConsolidatedSchedule {
    fn default() -> Self {
        Self {
            focus_8w: SPRINT_KEYS.iter().map(|k| (k.to_string(), Vec::new())).collect(),
            plan_3y: YEAR_KEYS.iter().map(|k| (k.to_string(), Vec::new())).collect(),
        }
    }
}

impl ConsolidatedSchedule {
    /// Items for sprint `n` (1-based).
    pub fn sprint(&self, n: usize) -> &[String] {
        items_for(&self.focus_8w, &format!("sprint{n}"))
    }

    /// Items for year `n` (1-based).
    pub fn year(&self, n: usize) -> &[String] {
        items_for(&self.plan_3y, &format!("year{n}"))
    }

    /// First `n` items walking sprint1..4 then year1..3.
    pub fn top_priorities(&self, n: usize) -> Vec<String> {
        SPRINT_KEYS
            .iter()
            .filter_map(|k| self.focus_8w.get(*k))
            .chain(YEAR_KEYS.iter().filter_map(|k| self.plan_3y.get(*k)))
            .flatten()
            .take(n)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.focus_8w.values().chain(self.plan_3y.values()).all(Vec::is_empty)
    }
}

fn items_for<'a>(map: &'a BTreeMap<String, Vec<String>>, key: &str) -> &'a [String] {
    map.get(key).map(Vec::as_slice).unwrap_or(&[])
}

/// Coerce a parsed consolidation reply into a schedule.
///
/// A missing key, or a value that is not a sequence, becomes an empty sequence.
pub fn normalize_schedule(parsed: &Value) -> ConsolidatedSchedule {
    let mut schedule = ConsolidatedSchedule::default();
    fill(&mut schedule.focus_8w, parsed.get("focus_8w"), &SPRINT_KEYS);
    fill(&mut schedule.plan_3y, parsed.get("plan_3y"), &YEAR_KEYS);
    schedule
}

fn fill(target: &mut BTreeMap<String, Vec<String>>, section: Option<&Value>, keys: &[&str]) {
    for key in keys {
        let items = section
            .and_then(|s| s.get(*key))
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(value_to_text).collect())
            .unwrap_or_default();
        target.insert(key.to_string(), items);
    }
}

/// Sends one aggregation request for all fragments and normalizes the reply.
pub struct RoadmapConsolidator<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    max_tokens: u32,
    temperature: f32,
}

/// Outcome of a consolidation: the raw reply is kept even when parsing fails.
#[derive(Debug)]
pub struct Consolidation {
    pub raw: Option<String>,
    pub result: Result<ConsolidatedSchedule>,
}

impl<'a, G: TextGenerator + ?Sized> RoadmapConsolidator<'a, G> {
    pub fn new(generator: &'a G, max_tokens: u32, temperature: f32) -> Self {
        Self {
            generator,
            max_tokens,
            temperature,
        }
    }

    pub async fn consolidate(&self, fragments: &[CategoryFragment]) -> Result<ConsolidatedSchedule> {
        self.consolidate_with_raw(fragments).await.result
    }

    pub async fn consolidate_with_raw(&self, fragments: &[CategoryFragment]) -> Consolidation {
        let prompt = match prompts::consolidation_prompt(fragments) {
            Ok(p) => p,
            Err(e) => {
                return Consolidation {
                    raw: None,
                    result: Err(e),
                };
            }
        };

        tracing::info!("consolidating {} category fragment(s)", fragments.len());
        let raw = match self
            .generator
            .generate(&prompt, self.max_tokens, self.temperature)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("consolidation request failed: {}", e);
                return Consolidation {
                    raw: None,
                    result: Err(e.into()),
                };
            }
        };

        let result = json_repair::parse(&raw)
            .map(|parsed| normalize_schedule(&parsed))
            .map_err(Into::into);
        if let Err(e) = &result {
            tracing::warn!("consolidation reply unparseable: {}", e);
        }
        Consolidation {
            raw: Some(raw),
            result,
        }
    }
}
