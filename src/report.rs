//! Markdown and JSON renderings of an assessment session.

use serde::Serialize;

use crate::assessment::{level_for_average, level_name, Assessment, AssessmentSummary};
use crate::card::CardBlock;
use crate::error::Result;
use crate::phases::Phase;
use crate::roadmap::{ConsolidatedSchedule, SPRINT_KEYS, YEAR_KEYS};
use crate::session::{AssessmentSession, CardRecord};

const TOP_PRIORITIES: usize = 3;
const NO_ITEMS: &str = "(no items)";

/// Everything a JSON consumer needs, in one document.
#[derive(Debug, Serialize)]
pub struct ReportExport<'a> {
    pub summary: AssessmentSummary,
    pub top_priorities: Vec<String>,
    pub assessment: &'a Assessment,
    pub session: &'a AssessmentSession,
}

impl<'a> ReportExport<'a> {
    pub fn new(assessment: &'a Assessment, session: &'a AssessmentSession) -> Self {
        Self {
            summary: assessment.summary(),
            top_priorities: session
                .consolidated
                .as_ref()
                .map(|s| s.top_priorities(TOP_PRIORITIES))
                .unwrap_or_default(),
            assessment,
            session,
        }
    }
}

pub fn to_json(assessment: &Assessment, session: &AssessmentSession) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ReportExport::new(
        assessment, session,
    ))?)
}

pub fn render_markdown(assessment: &Assessment, session: &AssessmentSession) -> String {
    let mut out = String::from("# Maturity Assessment Report\n\n");
    out.push_str(&format!(
        "_Generated {}_\n\n",
        session.started_at.format("%Y-%m-%d %H:%M UTC")
    ));

    render_summary(&mut out, assessment, session);

    if !session.records.is_empty() {
        out.push_str("## Category cards\n\n");
        for record in &session.records {
            render_card(&mut out, record);
        }
    }

    if !session.failures.is_empty() {
        out.push_str("## Failed categories\n\n");
        for failure in &session.failures {
            out.push_str(&format!(
                "- **{}** ({:?}): {}\n",
                failure.category, failure.stage, failure.message
            ));
        }
        out.push('\n');
    }

    if let Some(schedule) = &session.consolidated {
        render_schedule(&mut out, schedule);
    }

    if let Some(phases) = &session.phases {
        render_phases(&mut out, phases);
    }

    out
}

fn render_summary(out: &mut String, assessment: &Assessment, session: &AssessmentSession) {
    let summary = assessment.summary();
    out.push_str("## Summary\n\n");

    match summary.overall_average {
        Some(avg) => out.push_str(&format!(
            "- Overall maturity: {:.1} ({})\n",
            avg,
            level_name(level_for_average(avg)).unwrap_or("Unknown")
        )),
        None => out.push_str("- Overall maturity: N/A (no categories included)\n"),
    }
    out.push_str(&format!("- Strength areas: {}\n", join_or_none(&summary.strengths)));
    out.push_str(&format!("- Priority areas: {}\n", join_or_none(&summary.priorities)));

    if let Some(schedule) = &session.consolidated {
        let top = schedule.top_priorities(TOP_PRIORITIES);
        if !top.is_empty() {
            out.push_str("\n### Top priorities\n\n");
            for (i, item) in top.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, item));
            }
        }
    }
    out.push('\n');

    let included: Vec<_> = assessment.included().collect();
    if !included.is_empty() {
        out.push_str("| Category | Average | Level |\n|---|---|---|\n");
        for category in included {
            out.push_str(&format!(
                "| {} | {:.1} | {} |\n",
                category.name,
                category.average(),
                category.level_name()
            ));
        }
        out.push('\n');
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn render_card(out: &mut String, record: &CardRecord) {
    out.push_str(&format!("### {}\n\n", record.category));
    if record.show_avg
        && let Some(avg) = record.average
    {
        out.push_str(&format!(
            "Average maturity: {:.1} ({})\n\n",
            avg,
            level_name(level_for_average(avg)).unwrap_or("Unknown")
        ));
    }

    render_block(out, "Executive", &record.card.executive, &record.raw);
    render_block(out, "Technical", &record.card.technical, &record.raw);
}

fn render_block(out: &mut String, title: &str, block: &CardBlock, raw: &str) {
    out.push_str(&format!("#### {}\n\n", title));
    if block.is_empty() {
        out.push_str(&format!("No {} card generated.\n\n", title));
        out.push_str("Raw output:\n\n```\n");
        out.push_str(raw.trim());
        out.push_str("\n```\n\n");
        return;
    }

    if let Some(summary) = block.summary() {
        out.push_str(&format!("**Summary:** {}\n\n", summary));
    }
    if let Some(rec) = block.recommendation() {
        out.push_str(&format!("**Recommendation:** {}\n\n", rec));
    }
    for (label, items) in [
        ("Activities", block.activities()),
        ("8-week focus", block.focus_8w()),
        ("3-year plan", block.plan_3y()),
        ("Assumptions", block.assumptions()),
        ("Team", block.team()),
    ] {
        if let Some(items) = items {
            out.push_str(&format!("**{}:**\n", label));
            push_bullets(out, &items);
            out.push('\n');
        }
    }
}

fn push_bullets(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str(&format!("- {}\n", NO_ITEMS));
    }
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
}

fn render_schedule(out: &mut String, schedule: &ConsolidatedSchedule) {
    out.push_str("## Consolidated roadmap\n\n### 8-week focus\n\n");
    for n in 1..=SPRINT_KEYS.len() {
        out.push_str(&format!("**Sprint {}**\n", n));
        push_bullets(out, schedule.sprint(n));
        out.push('\n');
    }

    out.push_str("### 3-year plan\n\n");
    for n in 1..=YEAR_KEYS.len() {
        out.push_str(&format!("**Year {}**\n", n));
        push_bullets(out, schedule.year(n));
        out.push('\n');
    }
}

fn render_phases(out: &mut String, phases: &[Phase]) {
    out.push_str("## Phased roadmap\n\n");
    for phase in phases {
        out.push_str(&format!("### {}\n\nSuccess criteria:\n", phase.label));
        push_bullets(out, &phase.criteria);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentInput;
    use crate::card::{self, Card};
    use crate::phases;
    use crate::roadmap::normalize_schedule;
    use serde_json::json;

    fn record(category: &str, card: Card, raw: &str) -> CardRecord {
        CardRecord {
            category: category.to_string(),
            raw: raw.to_string(),
            parsed: json!({}),
            card,
            show_avg: true,
            average: Some(3.0),
        }
    }

    #[test]
    fn absent_fields_are_omitted() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let parsed = json!({"executive": {"summary": "Good progress"}, "technical": {}});
        let mut session = AssessmentSession::default();
        session.records.push(record(
            "Cloud Architecture",
            card::normalize(Some(&parsed)),
            "{...}",
        ));

        let md = render_markdown(&assessment, &session);
        assert!(md.contains("**Summary:** Good progress"));
        assert!(!md.contains("**Recommendation:**"));
        assert!(!md.contains("**Activities:**"));
        assert!(md.contains("No Technical card generated."));
        assert!(md.contains("Average maturity: 3.0 (Developing)"));
    }

    #[test]
    fn empty_card_shows_raw_output() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let mut session = AssessmentSession::default();
        session
            .records
            .push(record("Data Management", Card::default(), "\"just a string\""));

        let md = render_markdown(&assessment, &session);
        assert!(md.contains("No Executive card generated."));
        assert!(md.contains("\"just a string\""));
    }

    #[test]
    fn all_null_block_counts_as_missing() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let raw = r#"{"executive": {"summary": null, "recommendation": null}, "technical": {}}"#;
        let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
        let mut session = AssessmentSession::default();
        session
            .records
            .push(record("Data Management", card::normalize(Some(&parsed)), raw));

        let md = render_markdown(&assessment, &session);
        assert!(md.contains("No Executive card generated."));
        assert!(md.contains("\"summary\": null"));
    }

    #[test]
    fn schedule_uses_placeholders() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let mut session = AssessmentSession::default();
        session.consolidated = Some(normalize_schedule(&json!({
            "focus_8w": {"sprint1": ["Landing zone"]}
        })));

        let md = render_markdown(&assessment, &session);
        assert!(md.contains("**Sprint 1**\n- Landing zone\n"));
        assert!(md.contains("**Sprint 2**\n- (no items)\n"));
        assert!(md.contains("**Year 3**\n- (no items)\n"));
        assert!(md.contains("1. Landing zone"));
    }

    #[test]
    fn phases_are_listed() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let mut session = AssessmentSession::default();
        session.phases = Some(phases::default_phases());
        let md = render_markdown(&assessment, &session);
        assert!(md.contains("### Phase 1 (0-6 months)"));
        assert!(md.contains("### Phase 4 (18+ months)"));
    }

    #[test]
    fn json_export_carries_summary_and_session() {
        let assessment = AssessmentInput::default().resolve().unwrap();
        let session = AssessmentSession::default();
        let exported: serde_json::Value =
            serde_json::from_str(&to_json(&assessment, &session).unwrap()).unwrap();
        assert_eq!(exported["summary"]["overall_average"], json!(3.0));
        assert!(exported["session"]["records"].as_array().unwrap().is_empty());
        assert_eq!(exported["assessment"]["categories"].as_array().unwrap().len(), 6);
    }
}
