use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

const DEFAULT_CONFIG_PATH: &str = "maturity_advisor.toml";
const MAX_TOKENS_CEILING: u32 = 16_000;
/// Tracing filter used when RUST_LOG is unset or unparseable.
pub const DEFAULT_LOG_FILTER: &str = "maturity_advisor=info";

/// Main configuration structure loaded from maturity_advisor.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Chat-completions endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Token budgets and sampling temperatures per request kind
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub card_max_tokens: u32,
    pub card_temperature: f32,
    pub consolidate_max_tokens: u32,
    pub consolidate_temperature: f32,
    pub roadmap_max_tokens: u32,
    pub roadmap_temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            card_max_tokens: 1000,
            card_temperature: 0.4,
            consolidate_max_tokens: 800,
            consolidate_temperature: 0.4,
            roadmap_max_tokens: 1200,
            roadmap_temperature: 0.7,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
    /// Tracing filter directive for the CLI subscriber
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            log_level: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            log_level: std::env::var("RUST_LOG")
                .ok()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses MATURITY_ADVISOR_CONFIG environment variable or defaults to "maturity_advisor.toml"
    pub fn load() -> Result<Self> {
        // 1) MATURITY_ENV_FILE if set, 2) ./.env
        if let Ok(env_path) = std::env::var("MATURITY_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = std::env::var("MATURITY_ADVISOR_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Env-first overrides for the provider and generation settings
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MATURITY_BASE_URL") {
            self.provider.base_url = url;
            tracing::debug!("MATURITY_BASE_URL env override applied");
        }
        if let Ok(model) = std::env::var("MATURITY_MODEL") {
            self.provider.model = model;
            tracing::debug!("MATURITY_MODEL env override applied");
        }
        if let Some(timeout) = env_parse::<u64>("MATURITY_TIMEOUT_MS") {
            self.provider.timeout_ms = timeout;
        }
        if let Some(tokens) = env_parse::<u32>("MATURITY_CARD_MAX_TOKENS") {
            self.generation.card_max_tokens = tokens;
        }
        if let Some(temp) = env_parse::<f32>("MATURITY_CARD_TEMPERATURE") {
            self.generation.card_temperature = temp;
        }
        if let Some(tokens) = env_parse::<u32>("MATURITY_CONSOLIDATE_MAX_TOKENS") {
            self.generation.consolidate_max_tokens = tokens;
        }
        if let Some(tokens) = env_parse::<u32>("MATURITY_ROADMAP_MAX_TOKENS") {
            self.generation.roadmap_max_tokens = tokens;
        }
    }

    /// Validate the configuration, clamping token budgets into range
    pub fn validate(&mut self) -> Result<()> {
        let url = &self.provider.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AdvisorError::Config {
                message: format!("base_url '{}' must start with http:// or https://", url),
            });
        }
        if self.provider.model.trim().is_empty() {
            return Err(AdvisorError::Config {
                message: "model must not be empty".to_string(),
            });
        }
        if self.provider.timeout_ms == 0 {
            return Err(AdvisorError::Config {
                message: "timeout_ms must be > 0".to_string(),
            });
        }

        let g = &mut self.generation;
        for (name, temp) in [
            ("card_temperature", g.card_temperature),
            ("consolidate_temperature", g.consolidate_temperature),
            ("roadmap_temperature", g.roadmap_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                return Err(AdvisorError::Config {
                    message: format!("{} must be between 0.0 and 2.0, got {}", name, temp),
                });
            }
        }
        for tokens in [
            &mut g.card_max_tokens,
            &mut g.consolidate_max_tokens,
            &mut g.roadmap_max_tokens,
        ] {
            if *tokens == 0 {
                *tokens = 1;
            } else if *tokens > MAX_TOKENS_CEILING {
                tracing::warn!(
                    "max tokens {} exceeds {}, clamping",
                    tokens,
                    MAX_TOKENS_CEILING
                );
                *tokens = MAX_TOKENS_CEILING;
            }
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [provider]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.provider.model, "gpt-4o-mini");
        assert_eq!(cfg.provider.base_url, "https://api.openai.com/v1");
        assert_eq!(cfg.generation.card_max_tokens, 1000);
        assert_eq!(cfg.generation.consolidate_max_tokens, 800);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = Config::from_toml_str("[provider\nmodel = 1").unwrap_err();
        assert!(matches!(err, AdvisorError::Config { .. }));
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut cfg = Config::default();
        cfg.provider.base_url = "ftp://nowhere".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_temperature() {
        let mut cfg = Config::default();
        cfg.generation.roadmap_temperature = 3.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_clamps_tokens() {
        let mut cfg = Config::default();
        cfg.generation.card_max_tokens = 0;
        cfg.generation.roadmap_max_tokens = 1_000_000;
        cfg.validate().unwrap();
        assert_eq!(cfg.generation.card_max_tokens, 1);
        assert_eq!(cfg.generation.roadmap_max_tokens, MAX_TOKENS_CEILING);
    }
}
