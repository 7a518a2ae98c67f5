//! Post-processing of image-analysis completions.
//!
//! Turns the raw text returned by the vision model into an [`ImageAnalysis`]
//! record. Pure and deterministic.

use super::message::ImageAnalysis;
use once_cell::sync::Lazy;
use regex::Regex;

/// Confidence reported when the completion carries no `NN%` figure.
pub const DEFAULT_CONFIDENCE: u8 = 85;

/// Maximum number of tags kept.
pub const MAX_TAGS: usize = 5;

/// Tokens must be strictly longer than this to become tags.
const MIN_TAG_LEN: usize = 3;

// Word characters and digits are ASCII only; other scripts separate tokens
// and never count as a percentage.
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").expect("valid regex"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)%").expect("valid regex"));

/// Extracts description, tags and confidence from `raw_text`.
pub fn analyze(raw_text: &str) -> ImageAnalysis {
    ImageAnalysis {
        description: extract_description(raw_text),
        tags: extract_tags(raw_text),
        confidence: extract_confidence(raw_text),
    }
}

/// Text up to the first line break, or the whole text.
pub fn extract_description(text: &str) -> String {
    let first = text.split('\n').next().unwrap_or_default();
    first.strip_suffix('\r').unwrap_or(first).to_string()
}

/// Distinct lowercase tokens longer than three characters, first five kept.
pub fn extract_tags(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);

    for token in NON_WORD.split(&lowered) {
        if tags.len() == MAX_TAGS {
            break;
        }
        if token.len() > MIN_TAG_LEN && !tags.iter().any(|t| t == token) {
            tags.push(token.to_string());
        }
    }

    tags
}

/// First ASCII integer immediately followed by `%`, clamped to 100.
pub fn extract_confidence(text: &str) -> u8 {
    let Some(captures) = PERCENT.captures(text) else {
        return DEFAULT_CONFIDENCE;
    };

    // Overflowing digit runs are still "more than 100".
    let value = captures[1].parse::<u32>().unwrap_or(u32::MAX);
    value.min(100) as u8
}
