//! Phase extraction from free-text roadmap prose.
//!
//! The phased-roadmap request asks for markdown sections headed
//! `## Phase <n> (<duration>)`, each with a "Success criteria and milestones"
//! list. Models follow that loosely, so extraction is lenient and falls back to
//! a built-in roadmap whenever nothing usable comes out.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Criteria placeholder for a phase whose bullets could not be found.
pub const NO_CRITERIA: &str = "No success criteria found.";

const CRITERIA_MARKER: &str = "success criteria and milestones";

/// Four-phase roadmap used when the model output has no usable criteria.
pub const DEFAULT_ROADMAP: &str = "## Phase 1 (0-6 months)
Success criteria and milestones:
- Establish cloud governance
- Set up data quality frameworks
- Initiate AI/ML ethics guidelines

## Phase 2 (6-12 months)
Success criteria and milestones:
- Migrate initial workloads to cloud
- Develop key data pipelines
- Pilot AI/ML models on cloud

## Phase 3 (12-18 months)
Success criteria and milestones:
- Integrate cloud services with on-premises systems
- Optimize data workflows for performance
- Scale AI/ML models to production

## Phase 4 (18+ months)
Success criteria and milestones:
- Continuously monitor and optimize cloud resources
- Enhance data analytics capabilities
- Expand AI/ML initiatives across the organization";

static PHASE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*##[ \t]*(Phase \d+)[ \t]*\(([^)]+)\)")
        .expect("phase heading regex should compile")
});

static ANY_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*##").expect("heading regex should compile"));

/// One labeled roadmap stage, e.g. `Phase 1 (0-6 months)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub label: String,
    pub criteria: Vec<String>,
}

impl Phase {
    /// True when extraction found no bullets for this phase.
    pub fn is_placeholder(&self) -> bool {
        self.criteria.len() == 1 && self.criteria[0] == NO_CRITERIA
    }
}

/// Extract phases, substituting [`default_phases`] when nothing usable is found.
pub fn extract(text: &str) -> Vec<Phase> {
    let phases = scan(text);
    if phases.iter().all(Phase::is_placeholder) {
        tracing::info!(
            "no success criteria in {} extracted phase(s); using default roadmap",
            phases.len()
        );
        return default_phases();
    }
    phases
}

/// The built-in four-phase roadmap.
pub fn default_phases() -> Vec<Phase> {
    scan(DEFAULT_ROADMAP)
}

/// Raw extraction without the default-roadmap fallback.
pub fn scan(text: &str) -> Vec<Phase> {
    let boundaries: Vec<usize> = ANY_HEADING_RE.find_iter(text).map(|m| m.start()).collect();

    PHASE_HEADING_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            let duration = caps.get(2)?.as_str().trim();

            let body_start = whole.end();
            let body_end = boundaries
                .iter()
                .copied()
                .find(|&b| b > whole.start())
                .unwrap_or(text.len())
                .max(body_start);
            let body = &text[body_start..body_end];

            let criteria = criteria_bullets(body);
            Some(Phase {
                label: format!("{name} ({duration})"),
                criteria: if criteria.is_empty() {
                    vec![NO_CRITERIA.to_string()]
                } else {
                    criteria
                },
            })
        })
        .collect()
}

/// Dash bullets following the success-criteria marker, up to the next labeled section.
fn criteria_bullets(block: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets aligned with `block`.
    let lowered = block.to_ascii_lowercase();
    let Some(pos) = lowered.find(CRITERIA_MARKER) else {
        return Vec::new();
    };

    // The rest of the marker line may carry a colon or a first bullet; every
    // later line is checked for the start of a new section.
    let rest = &block[pos + CRITERIA_MARKER.len()..];
    let (marker_line, following) = rest.split_once('\n').unwrap_or((rest, ""));
    let marker_tail = marker_line.trim();
    let marker_tail = marker_tail.strip_prefix(':').unwrap_or(marker_tail).trim();

    let mut bullets = Vec::new();
    if let Some(item) = marker_tail.strip_prefix("- ") {
        bullets.push(item.to_string());
    }
    for line in following.lines() {
        let trimmed = line.trim();
        if starts_new_section(trimmed) {
            break;
        }
        if let Some(item) = trimmed.strip_prefix("- ") {
            bullets.push(item.to_string());
        }
    }
    bullets
}

/// A line like `Resource requirements:` or a markdown heading ends the criteria span.
fn starts_new_section(trimmed: &str) -> bool {
    if trimmed.starts_with("##") {
        return true;
    }
    trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && trimmed.contains(':')
}
