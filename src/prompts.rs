//! Prompt builders for the three request kinds sent to the model.
//!
//! The JSON shapes embedded here are documentation to the model, not a contract
//! the caller relies on: replies still go through json repair and normalization.

use crate::assessment::{CategoryAssessment, CompanyContext};
use crate::card::CategoryFragment;
use crate::error::Result;

/// Schema instruction placed at the top of every card prompt.
pub const CARD_SCHEMA: &str = r#"
You are an experienced CTO advisor. Return ONLY valid JSON that exactly follows this structure (no explanatory text, no markdown fences):

{
  "executive": {
    "summary": "2-3 sentence summary",
    "recommendation": "2+ sentence justification",
    "activities": ["Activity 1", "Activity 2", "..."],
    "focus_8w": ["Sprint1 item", "Sprint2 item", "..."],
    "plan_3y": ["Year1 item", "Year2 item", "..."],
    "assumptions": ["Assumption 1", "..."]
  },
  "technical": {
    "summary": "2-3 sentence summary",
    "recommendation": "2+ sentence technical justification",
    "activities": ["Tactic 1", "Tactic 2", "..."],
    "focus_8w": ["Sprint-level technical task", "..."],
    "plan_3y": ["Year1 technical plan", "..."],
    "assumptions": ["Assumption A", "..."],
    "team": ["Role: count", "..."]
  }
}

Make sure:
- All keys are double quoted.
- All lists are JSON arrays.
- Keep entries concise.
- Use the inputs below for context.
"#;

const CONSOLIDATION_SCHEMA: &str = r#"{
  "focus_8w": {
    "sprint1": ["..."],
    "sprint2": ["..."],
    "sprint3": ["..."],
    "sprint4": ["..."]
  },
  "plan_3y": {
    "year1": ["..."],
    "year2": ["..."],
    "year3": ["..."]
  }
}"#;

fn or_none(text: &str) -> &str {
    let t = text.trim();
    if t.is_empty() { "None" } else { t }
}

/// Per-category baseball card request.
pub fn card_prompt(ctx: &CompanyContext, category: &CategoryAssessment) -> String {
    let included = if category.include { "Yes" } else { "No" };
    let average = if category.include {
        category.average().to_string()
    } else {
        "N/A".to_string()
    };
    let uses_cloud = if ctx.uses_cloud { "Yes" } else { "No" };

    format!(
        "{schema}

Context:
Industry: {industry}
Company size: {company_size}
IT department size: {it_size}
Uses cloud: {uses_cloud} {platform}
Priority projects: {priorities}
Category: {category}
Included flag: {included}
Category maturity average (if included): {average}
Sub-capability scores: {scores}
Category comments: {comment}
Overall context: {overall}
Seed scenario: {seed}

Return the JSON only, exactly matching the schema at the top.
",
        schema = CARD_SCHEMA,
        industry = ctx.industry,
        company_size = ctx.company_size,
        it_size = ctx.it_size,
        platform = ctx.cloud_platform(),
        priorities = or_none(&ctx.priority_projects),
        category = category.name,
        scores = category.scores_json(),
        comment = category.comment().unwrap_or("None"),
        overall = or_none(&ctx.overall_context),
        seed = ctx.seed_scenario().unwrap_or("None"),
    )
}

/// One request that spreads every fragment across 4 sprints and 3 years.
pub fn consolidation_prompt(fragments: &[CategoryFragment]) -> Result<String> {
    let fragments_json = serde_json::to_string_pretty(fragments)?;
    Ok(format!(
        "
You are a CTO. Consolidate these category-level fragments into ONE JSON roadmap. Return ONLY JSON matching this structure:

{CONSOLIDATION_SCHEMA}

Category fragments:
{fragments_json}

Distribute initiatives sensibly across sprints and years. Return JSON only.
"
    ))
}

/// Free-text phased roadmap request whose reply feeds phase extraction.
pub fn phased_roadmap_prompt(ctx: &CompanyContext, categories: &[&CategoryAssessment]) -> String {
    let averages = categories
        .iter()
        .map(|c| format!("{}: {}", c.name, c.average()))
        .collect::<Vec<_>>()
        .join(", ");
    let names = categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let overall = if ctx.overall_context.trim().is_empty() {
        "No additional context provided."
    } else {
        ctx.overall_context.trim()
    };

    format!(
        "As a strategic transformation advisor for the {industry} industry, create a comprehensive 18-month roadmap \
based on these current maturity levels: {{{averages}}}. \
Industry context: {industry}. \
Additional overall context: {overall} \
Only include the following categories in your analysis: {names}. \
Structure the roadmap in 4 phases (0-6 months, 6-12 months, 12-18 months, 18+ months), \
each introduced by a heading of the form '## Phase <n> (<duration>)', with: \
- Strategic objectives for each phase \
- Key initiatives and deliverables \
- Success criteria and milestones (as '- ' bullet points) \
- Resource requirements and investment priorities \
- Risk mitigation strategies \
Focus on business value creation, competitive advantage, and sustainable transformation. \
Consider industry-specific challenges and opportunities in {industry}. \
Use bullet points and numbered lists for clarity.",
        industry = ctx.industry,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentInput;

    #[test]
    fn card_prompt_carries_context() {
        let a = AssessmentInput::default().resolve().unwrap();
        let prompt = card_prompt(&a.context, &a.categories[1]);
        assert!(prompt.starts_with(CARD_SCHEMA));
        assert!(prompt.contains("Category: Data Management"));
        assert!(prompt.contains("Included flag: Yes"));
        assert!(prompt.contains("Category maturity average (if included): 3"));
        assert!(prompt.contains("\"Data Quality\":3"));
        assert!(prompt.contains("Category comments: None"));
        assert!(prompt.contains("Uses cloud: Yes Azure"));
    }

    #[test]
    fn excluded_category_hides_average() {
        let mut a = AssessmentInput::default().resolve().unwrap();
        a.categories[0].include = false;
        a.categories[0].comment = "legacy DCs".to_string();
        let prompt = card_prompt(&a.context, &a.categories[0]);
        assert!(prompt.contains("Included flag: No"));
        assert!(prompt.contains("(if included): N/A"));
        assert!(prompt.contains("Category comments: legacy DCs"));
    }

    #[test]
    fn consolidation_prompt_embeds_fragments() {
        let frags = vec![CategoryFragment {
            category: "Cloud Architecture".to_string(),
            focus_8w: vec!["Landing zone".to_string()],
            plan_3y: vec![],
        }];
        let prompt = consolidation_prompt(&frags).unwrap();
        assert!(prompt.contains("\"sprint4\""));
        assert!(prompt.contains("\"category\": \"Cloud Architecture\""));
        assert!(prompt.contains("Landing zone"));
    }

    #[test]
    fn roadmap_prompt_lists_categories() {
        let a = AssessmentInput::default().resolve().unwrap();
        let cats: Vec<_> = a.included().take(2).collect();
        let prompt = phased_roadmap_prompt(&a.context, &cats);
        assert!(prompt.contains("Cloud Architecture, Data Management"));
        assert!(prompt.contains("## Phase <n> (<duration>)"));
        assert!(prompt.contains("Success criteria and milestones"));
    }
}
