//! Layered salvage of "almost JSON" replies from chat-completion models.
//!
//! Models asked for JSON routinely wrap it in markdown fences, emit Python-style
//! single-quoted dicts, leave trailing commas, or add chatter around the object.
//! [`parse`] tries progressively looser strategies and keeps the first success.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;

static FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```(?:json)?\s*([\s\S]*?)\s*```").expect("fence regex should compile")
});

static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("trailing comma regex should compile"));

/// Which salvage step produced the parsed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Strict,
    QuoteSwap,
    TrailingCommas,
    BraceSlice,
    BraceSliceQuoteSwap,
}

/// Parse `raw` into a JSON value, or fail with the raw text attached.
pub fn parse(raw: &str) -> Result<Value, ParseError> {
    parse_with_strategy(raw).map(|(value, _)| value)
}

/// Same as [`parse`] but also reports the strategy that succeeded.
pub fn parse_with_strategy(raw: &str) -> Result<(Value, Strategy), ParseError> {
    let text = unfence(raw);

    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Ok(found(v, Strategy::Strict));
    }

    if let Ok(v) = serde_json::from_str::<Value>(&swap_quotes(text)) {
        return Ok(found(v, Strategy::QuoteSwap));
    }

    let cleaned = TRAILING_COMMA_RE.replace_all(text, "$1");
    if let Ok(v) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(found(v, Strategy::TrailingCommas));
    }

    if let Some(candidate) = brace_slice(text) {
        if let Ok(v) = serde_json::from_str::<Value>(candidate) {
            return Ok(found(v, Strategy::BraceSlice));
        }
        if let Ok(v) = serde_json::from_str::<Value>(&swap_quotes(candidate)) {
            return Ok(found(v, Strategy::BraceSliceQuoteSwap));
        }
    }

    tracing::debug!("json repair exhausted all strategies ({} bytes)", raw.len());
    Err(ParseError::new(raw))
}

fn found(value: Value, strategy: Strategy) -> (Value, Strategy) {
    tracing::debug!("json repair succeeded via {:?}", strategy);
    (value, strategy)
}

/// Trimmed inner text of the first fenced block, or the trimmed input.
pub fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

fn swap_quotes(text: &str) -> String {
    text.replace('\'', "\"")
}

/// Substring from the first `{` to the last `}` inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
