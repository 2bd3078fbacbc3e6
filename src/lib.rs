//! Maturity assessment advisor: turns unreliable model replies into structured
//! recommendation cards, a consolidated sprint/year schedule and a phased roadmap.

pub mod assessment;
pub mod card;
pub mod clients;
pub mod config;
pub mod error;
pub mod field;
pub mod json_repair;
pub mod phases;
pub mod prompts;
pub mod report;
pub mod roadmap;
pub mod session;

pub use error::{AdvisorError, ParseError, Result};

/// Load `.env` from the working directory if present, so RUST_LOG and
/// OPENAI_API_KEY can live there. A missing file is not an error.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
