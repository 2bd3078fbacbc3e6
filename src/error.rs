//! Domain-specific error types for maturity-advisor

use thiserror::Error;

use crate::clients::ProviderError;

/// Main error type for the advisor library
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Raised by the JSON repair parser once every salvage strategy has failed.
///
/// The original model reply is kept so operators can see what came back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse JSON from the model output: {}", snippet(.raw, 200))]
pub struct ParseError {
    pub raw: String,
}

impl ParseError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl From<anyhow::Error> for AdvisorError {
    fn from(err: anyhow::Error) -> Self {
        AdvisorError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AdvisorError {
    fn from(err: serde_json::Error) -> Self {
        AdvisorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AdvisorError {
    fn from(err: toml::de::Error) -> Self {
        AdvisorError::Config {
            message: format!("invalid TOML: {}", err),
        }
    }
}

impl From<reqwest::Error> for AdvisorError {
    fn from(err: reqwest::Error) -> Self {
        AdvisorError::Provider(ProviderError::from(err))
    }
}

impl From<std::io::Error> for AdvisorError {
    fn from(err: std::io::Error) -> Self {
        AdvisorError::Io {
            message: err.to_string(),
        }
    }
}

/// First `max` characters of `input`, with an ellipsis when cut.
pub(crate) fn snippet(input: &str, max: usize) -> String {
    let mut out = String::new();
    for (idx, ch) in input.trim().chars().enumerate() {
        if idx >= max {
            out.push_str("...");
            break;
        }
        out.push(ch);
    }
    out
}

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;
