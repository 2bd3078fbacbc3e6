//! Maturity assessment inputs: the category catalog, 1-5 scores, and company context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdvisorError, Result};

/// Maturity scale labels, index 0 = level 1.
pub const LEVEL_NAMES: [&str; 5] = [
    "Greenfield",
    "Emerging",
    "Developing",
    "Established",
    "Optimized",
];

/// Slider default for a sub-capability nobody scored.
pub const DEFAULT_SCORE: u8 = 3;

pub const SEED_SCENARIO: &str = "The client is a manufacturer and distributor of charitable gaming products. \
They operate three business units with silos, ~10 ERPs, no consolidated data, and many long-tenured staff resistant to change.";

/// One assessed category and its fixed sub-capabilities.
#[derive(Debug, Clone, Copy)]
pub struct CategorySpec {
    pub name: &'static str,
    pub sub_capabilities: &'static [&'static str],
}

pub const DEFAULT_CATALOG: &[CategorySpec] = &[
    CategorySpec {
        name: "Cloud Architecture",
        sub_capabilities: &[
            "Infrastructure Design",
            "Scalability & Performance",
            "Multi-cloud Strategy",
            "Cost Optimization",
            "Disaster Recovery",
            "Service Architecture",
        ],
    },
    CategorySpec {
        name: "Data Management",
        sub_capabilities: &[
            "Data Quality",
            "Data Integration",
            "Master Data Management",
            "Data Lifecycle",
            "Data Storage Strategy",
            "Real-time Processing",
        ],
    },
    CategorySpec {
        name: "Data Visualization & Insights",
        sub_capabilities: &[
            "Dashboard Design",
            "Data Storytelling",
            "Interactive Visualizations",
            "Advanced Analytics Techniques",
            "Self-Service Analytics",
            "Insight Communication",
        ],
    },
    CategorySpec {
        name: "AI/ML Integration",
        sub_capabilities: &[
            "Model Development",
            "MLOps & Deployment",
            "AI Ethics & Bias",
            "Business Integration",
            "AutoML Capabilities",
            "AI Governance",
        ],
    },
    CategorySpec {
        name: "Governance & Security",
        sub_capabilities: &[
            "Data Privacy",
            "Compliance Management",
            "Access Controls",
            "Risk Management",
            "Audit & Monitoring",
            "Policy Enforcement",
        ],
    },
    CategorySpec {
        name: "Business Engagement",
        sub_capabilities: &[
            "Stakeholder Alignment",
            "Change Management",
            "Skills & Training",
            "Value Measurement",
            "Business Process Integration",
            "Strategic Planning",
        ],
    },
];

/// Label for an integer level, `None` outside 1..=5.
pub fn level_name(level: u8) -> Option<&'static str> {
    LEVEL_NAMES.get(usize::from(level).checked_sub(1)?).copied()
}

/// Nearest whole level for an average score, clamped to the scale.
pub fn level_for_average(avg: f64) -> u8 {
    avg.round().clamp(1.0, 5.0) as u8
}

/// Organization facts that go into every prompt
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompanyContext {
    pub industry: String,
    pub company_size: String,
    pub it_size: String,
    pub uses_cloud: bool,
    pub cloud_platform: String,
    pub priority_projects: String,
    pub use_seed_scenario: bool,
    pub overall_context: String,
}

impl Default for CompanyContext {
    fn default() -> Self {
        Self {
            industry: "Homebuilding & Real Estate".to_string(),
            company_size: "1,200 employees".to_string(),
            it_size: "50".to_string(),
            uses_cloud: true,
            cloud_platform: "Azure".to_string(),
            priority_projects: "ERP consolidation, eCommerce upgrade".to_string(),
            use_seed_scenario: true,
            overall_context: String::new(),
        }
    }
}

impl CompanyContext {
    pub fn seed_scenario(&self) -> Option<&'static str> {
        self.use_seed_scenario.then_some(SEED_SCENARIO)
    }

    /// Platform text, only meaningful when the company uses cloud.
    pub fn cloud_platform(&self) -> &str {
        if self.uses_cloud {
            self.cloud_platform.trim()
        } else {
            ""
        }
    }
}

/// A category as written in the assessment input file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default = "default_include")]
    pub include: bool,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub scores: BTreeMap<String, u8>,
}

fn default_include() -> bool {
    true
}

/// The assessment input file (TOML)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssessmentInput {
    #[serde(default)]
    pub context: CompanyContext,
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

impl AssessmentInput {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AdvisorError::Validation {
            message: format!("invalid assessment file: {}", e),
        })
    }

    /// Resolve against the default catalog.
    pub fn resolve(&self) -> Result<Assessment> {
        self.resolve_with(DEFAULT_CATALOG)
    }

    /// Resolve against `catalog`: every catalog category appears, in catalog order,
    /// with unscored sub-capabilities at [`DEFAULT_SCORE`].
    pub fn resolve_with(&self, catalog: &[CategorySpec]) -> Result<Assessment> {
        for input in &self.categories {
            if !catalog.iter().any(|c| c.name.eq_ignore_ascii_case(input.name.trim())) {
                return Err(AdvisorError::Validation {
                    message: format!("unknown category '{}'", input.name),
                });
            }
        }

        let mut categories = Vec::with_capacity(catalog.len());
        for spec in catalog {
            let input = self
                .categories
                .iter()
                .find(|c| c.name.trim().eq_ignore_ascii_case(spec.name));
            categories.push(CategoryAssessment::from_input(spec, input)?);
        }

        Ok(Assessment {
            context: self.context.clone(),
            categories,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub name: String,
    pub score: u8,
}

/// One category with its validated scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAssessment {
    pub name: String,
    pub scores: Vec<SubScore>,
    pub include: bool,
    pub comment: String,
}

impl CategoryAssessment {
    fn from_input(spec: &CategorySpec, input: Option<&CategoryInput>) -> Result<Self> {
        if let Some(input) = input {
            for key in input.scores.keys() {
                if !spec.sub_capabilities.iter().any(|s| s.eq_ignore_ascii_case(key.trim())) {
                    return Err(AdvisorError::Validation {
                        message: format!(
                            "unknown sub-capability '{}' in category '{}'",
                            key, spec.name
                        ),
                    });
                }
            }
        }

        let mut scores = Vec::with_capacity(spec.sub_capabilities.len());
        for sub in spec.sub_capabilities {
            let score = input
                .and_then(|i| {
                    i.scores
                        .iter()
                        .find(|(k, _)| k.trim().eq_ignore_ascii_case(sub))
                        .map(|(_, v)| *v)
                })
                .unwrap_or(DEFAULT_SCORE);
            if !(1..=5).contains(&score) {
                return Err(AdvisorError::Validation {
                    message: format!(
                        "score for '{}' / '{}' must be 1-5, got {}",
                        spec.name, sub, score
                    ),
                });
            }
            scores.push(SubScore {
                name: sub.to_string(),
                score,
            });
        }

        Ok(Self {
            name: spec.name.to_string(),
            scores,
            include: input.is_none_or(|i| i.include),
            comment: input.map(|i| i.comment.clone()).unwrap_or_default(),
        })
    }

    /// Mean of the sub-capability scores, rounded to one decimal.
    pub fn average(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.scores.iter().map(|s| u32::from(s.score)).sum();
        let mean = f64::from(sum) / self.scores.len() as f64;
        (mean * 10.0).round() / 10.0
    }

    pub fn level_name(&self) -> &'static str {
        level_name(level_for_average(self.average())).unwrap_or("")
    }

    pub fn comment(&self) -> Option<&str> {
        let c = self.comment.trim();
        (!c.is_empty()).then_some(c)
    }

    /// Processed when explicitly included, or when the user left a comment.
    pub fn is_selected(&self) -> bool {
        self.include || self.comment().is_some()
    }

    /// Sub-capability scores as a JSON object for prompts.
    pub fn scores_json(&self) -> Value {
        let map: Map<String, Value> = self
            .scores
            .iter()
            .map(|s| (s.name.clone(), Value::from(s.score)))
            .collect();
        Value::Object(map)
    }
}

/// A resolved assessment ready for generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub context: CompanyContext,
    pub categories: Vec<CategoryAssessment>,
}

impl Assessment {
    /// Categories to send to the model, in catalog order.
    pub fn selected(&self) -> impl Iterator<Item = &CategoryAssessment> {
        self.categories.iter().filter(|c| c.is_selected())
    }

    /// Explicitly included categories (the ones whose averages are reported).
    pub fn included(&self) -> impl Iterator<Item = &CategoryAssessment> {
        self.categories.iter().filter(|c| c.include)
    }

    pub fn summary(&self) -> AssessmentSummary {
        let included: Vec<&CategoryAssessment> = self.included().collect();
        let overall_average = if included.is_empty() {
            None
        } else {
            let total: f64 = included.iter().map(|c| c.average()).sum();
            Some((total / included.len() as f64 * 10.0).round() / 10.0)
        };
        AssessmentSummary {
            overall_average,
            strengths: included
                .iter()
                .filter(|c| c.average() >= 3.0)
                .map(|c| c.name.clone())
                .collect(),
            priorities: included
                .iter()
                .filter(|c| c.average() <= 2.0)
                .map(|c| c.name.clone())
                .collect(),
        }
    }
}

/// Headline numbers across included categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub overall_average: Option<f64>,
    pub strengths: Vec<String>,
    pub priorities: Vec<String>,
}
