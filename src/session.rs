//! Assessment runs: per-category card generation, roadmap consolidation and the
//! phased roadmap, all recorded on an explicit [`AssessmentSession`].
//!
//! Requests are issued one at a time. A failure in one category (provider error
//! or unparseable reply) is recorded and the run moves on; partial success is the
//! normal outcome, not an edge case.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assessment::{Assessment, CategoryAssessment};
use crate::card::{self, Card, CategoryFragment};
use crate::clients::TextGenerator;
use crate::config::GenerationConfig;
use crate::error::{AdvisorError, Result};
use crate::json_repair;
use crate::phases::{self, Phase};
use crate::prompts;
use crate::roadmap::{ConsolidatedSchedule, RoadmapConsolidator};

/// Key under which the consolidation reply is stored in `raw_outputs`.
pub const CONSOLIDATE_KEY: &str = "consolidate";
/// Key under which the phased-roadmap reply is stored in `raw_outputs`.
pub const ROADMAP_KEY: &str = "roadmap";
const NO_RAW: &str = "<no raw captured>";

/// Everything produced for one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub category: String,
    pub raw: String,
    pub parsed: Value,
    pub card: Card,
    pub show_avg: bool,
    pub average: Option<f64>,
}

/// Which step failed for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Request,
    Parse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub category: String,
    pub stage: FailureStage,
    pub message: String,
}

/// State of one assessment run. Replaced wholesale by [`Advisor::generate_cards`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub started_at: DateTime<Utc>,
    pub records: Vec<CardRecord>,
    pub fragments: Vec<CategoryFragment>,
    pub raw_outputs: BTreeMap<String, String>,
    pub failures: Vec<CategoryFailure>,
    pub consolidated: Option<ConsolidatedSchedule>,
    pub phases: Option<Vec<Phase>>,
}

impl Default for AssessmentSession {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            records: Vec::new(),
            fragments: Vec::new(),
            raw_outputs: BTreeMap::new(),
            failures: Vec::new(),
            consolidated: None,
            phases: None,
        }
    }
}

impl AssessmentSession {
    pub fn has_fragments(&self) -> bool {
        !self.fragments.is_empty()
    }
}

/// Drives the text-generation collaborator for an assessment.
pub struct Advisor<G: TextGenerator> {
    generator: G,
    generation: GenerationConfig,
}

impl<G: TextGenerator> Advisor<G> {
    pub fn new(generator: G, generation: GenerationConfig) -> Self {
        Self {
            generator,
            generation,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Start a fresh session and generate a card for every selected category.
    pub async fn generate_cards(&self, assessment: &Assessment) -> AssessmentSession {
        let mut session = AssessmentSession::default();
        let selected: Vec<&CategoryAssessment> = assessment.selected().collect();
        if selected.is_empty() {
            tracing::info!("no categories selected; include a category or add a comment");
            return session;
        }

        for category in selected {
            self.generate_card(assessment, category, &mut session).await;
        }

        tracing::info!(
            "generated {} card(s), {} failure(s)",
            session.records.len(),
            session.failures.len()
        );
        session
    }

    async fn generate_card(
        &self,
        assessment: &Assessment,
        category: &CategoryAssessment,
        session: &mut AssessmentSession,
    ) {
        let prompt = prompts::card_prompt(&assessment.context, category);
        tracing::debug!("requesting card for '{}'", category.name);

        let raw = match self
            .generator
            .generate(
                &prompt,
                self.generation.card_max_tokens,
                self.generation.card_temperature,
            )
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("card request failed for '{}': {}", category.name, e);
                session
                    .raw_outputs
                    .insert(category.name.clone(), NO_RAW.to_string());
                session.failures.push(CategoryFailure {
                    category: category.name.clone(),
                    stage: FailureStage::Request,
                    message: e.to_string(),
                });
                return;
            }
        };
        session.raw_outputs.insert(category.name.clone(), raw.clone());

        let parsed = match json_repair::parse(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("card reply unparseable for '{}': {}", category.name, e);
                session.failures.push(CategoryFailure {
                    category: category.name.clone(),
                    stage: FailureStage::Parse,
                    message: e.to_string(),
                });
                return;
            }
        };

        let card = card::normalize(Some(&parsed));
        session
            .fragments
            .push(CategoryFragment::from_card(category.name.clone(), &card));
        session.records.push(CardRecord {
            category: category.name.clone(),
            raw,
            parsed,
            card,
            show_avg: category.include,
            average: category.include.then(|| category.average()),
        });
    }

    /// Consolidate the session's fragments into the 4-sprint / 3-year schedule.
    ///
    /// Card records are never touched; on failure the previous schedule is cleared.
    pub async fn consolidate(&self, session: &mut AssessmentSession) -> Result<()> {
        if !session.has_fragments() {
            return Err(AdvisorError::Validation {
                message: "no roadmap fragments yet; generate cards for at least one category first"
                    .to_string(),
            });
        }

        let consolidator = RoadmapConsolidator::new(
            &self.generator,
            self.generation.consolidate_max_tokens,
            self.generation.consolidate_temperature,
        );
        let outcome = consolidator.consolidate_with_raw(&session.fragments).await;
        session.raw_outputs.insert(
            CONSOLIDATE_KEY.to_string(),
            outcome.raw.unwrap_or_else(|| NO_RAW.to_string()),
        );

        match outcome.result {
            Ok(schedule) => {
                session.consolidated = Some(schedule);
                Ok(())
            }
            Err(e) => {
                session.consolidated = None;
                Err(e)
            }
        }
    }

    /// Ask for a free-text phased roadmap and extract its phases.
    ///
    /// A failed request falls back to the default phases instead of erroring.
    pub async fn phased_roadmap(
        &self,
        assessment: &Assessment,
        session: &mut AssessmentSession,
    ) -> Vec<Phase> {
        let included: Vec<&CategoryAssessment> = assessment.included().collect();
        let prompt = prompts::phased_roadmap_prompt(&assessment.context, &included);

        let phases = match self
            .generator
            .generate(
                &prompt,
                self.generation.roadmap_max_tokens,
                self.generation.roadmap_temperature,
            )
            .await
        {
            Ok(prose) => {
                let phases = phases::extract(&prose);
                session.raw_outputs.insert(ROADMAP_KEY.to_string(), prose);
                phases
            }
            Err(e) => {
                tracing::warn!("roadmap request failed, using default phases: {}", e);
                phases::default_phases()
            }
        };

        session.phases = Some(phases.clone());
        phases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentInput;
    use crate::clients::ProviderError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies in order; `None` simulates a provider failure.
    struct Scripted {
        replies: Mutex<Vec<Option<String>>>,
    }

    impl Scripted {
        fn new(replies: Vec<Option<&str>>) -> Self {
            let mut replies: Vec<Option<String>> =
                replies.into_iter().map(|r| r.map(str::to_string)).collect();
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(
            &self,
            _prompt: &str,
            _max_output_tokens: u32,
            _temperature: f32,
        ) -> std::result::Result<String, ProviderError> {
            match self.replies.lock().unwrap().pop() {
                Some(Some(reply)) => Ok(reply),
                _ => Err(ProviderError::Http("connection refused".to_string())),
            }
        }
    }

    fn two_category_assessment() -> Assessment {
        let mut assessment = AssessmentInput::default().resolve().unwrap();
        for category in assessment.categories.iter_mut().skip(2) {
            category.include = false;
        }
        assessment
    }

    #[tokio::test]
    async fn failures_do_not_stop_other_categories() {
        let advisor = Advisor::new(
            Scripted::new(vec![None, Some(r#"{"executive": {"focus_8w": ["a"]}}"#)]),
            GenerationConfig::default(),
        );
        let session = advisor.generate_cards(&two_category_assessment()).await;
        assert_eq!(session.records.len(), 1);
        assert_eq!(session.records[0].category, "Data Management");
        assert_eq!(session.failures.len(), 1);
        assert_eq!(session.failures[0].stage, FailureStage::Request);
        assert_eq!(session.raw_outputs["Cloud Architecture"], NO_RAW);
        assert_eq!(session.fragments[0].focus_8w, vec!["a"]);
    }

    #[tokio::test]
    async fn unparseable_reply_keeps_raw_text() {
        let advisor = Advisor::new(
            Scripted::new(vec![Some("Sorry, no JSON today."), Some("{}")]),
            GenerationConfig::default(),
        );
        let session = advisor.generate_cards(&two_category_assessment()).await;
        assert_eq!(session.failures[0].stage, FailureStage::Parse);
        assert_eq!(session.raw_outputs["Cloud Architecture"], "Sorry, no JSON today.");
        assert_eq!(session.records.len(), 1);
    }

    #[tokio::test]
    async fn consolidate_requires_fragments() {
        let advisor = Advisor::new(Scripted::new(vec![]), GenerationConfig::default());
        let mut session = AssessmentSession::default();
        let err = advisor.consolidate(&mut session).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Validation { .. }));
    }

    #[tokio::test]
    async fn roadmap_request_failure_uses_defaults() {
        let advisor = Advisor::new(Scripted::new(vec![None]), GenerationConfig::default());
        let assessment = two_category_assessment();
        let mut session = AssessmentSession::default();
        let phases = advisor.phased_roadmap(&assessment, &mut session).await;
        assert_eq!(phases, phases::default_phases());
        assert_eq!(session.phases.as_deref(), Some(phases.as_slice()));
    }
}
