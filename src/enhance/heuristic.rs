//! Local text heuristics: extractive summary, key points and a keyword-count
//! sentiment label. Deterministic and allocation-light; no models involved.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::Enhancer;
use crate::errors::SearchError;
use crate::models::{EnhancedResult, SearchResult, Sentiment};

pub const SUMMARY_MAX_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";
pub const MAX_KEY_POINTS: usize = 3;
const MIN_KEY_POINT_CHARS: usize = 20;
pub const DEFAULT_RELEVANCE: f64 = 0.5;

const POSITIVE_WORDS: [&str; 6] = ["great", "excellent", "good", "amazing", "wonderful", "best"];
const NEGATIVE_WORDS: [&str; 6] = ["bad", "terrible", "awful", "worst", "horrible", "poor"];

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();
}

/// Shorten `content` to at most 150 characters, cutting back to the last
/// whitespace when one exists, and mark the cut with `...`.
pub fn summarize(content: &str) -> String {
    if content.chars().count() <= SUMMARY_MAX_CHARS {
        return content.to_string();
    }

    let truncated: String = content.chars().take(SUMMARY_MAX_CHARS).collect();
    let cut = match truncated.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &truncated[..idx],
        _ => truncated.as_str(),
    };

    format!("{}{}", cut, ELLIPSIS)
}

/// First three sentences longer than 20 characters, trimmed, in order.
pub fn extract_key_points(content: &str) -> Vec<String> {
    SENTENCE_END
        .split(content)
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_KEY_POINT_CHARS)
        .take(MAX_KEY_POINTS)
        .map(str::to_string)
        .collect()
}

pub fn classify_sentiment(content: &str) -> Sentiment {
    let lower = content.to_lowercase();
    let count = |words: &[&str]| -> usize { words.iter().map(|w| lower.matches(w).count()).sum() };

    let positive = count(&POSITIVE_WORDS);
    let negative = count(&NEGATIVE_WORDS);

    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

pub fn relevance_of(result: &SearchResult) -> f64 {
    clamp_unit(result.score.unwrap_or(DEFAULT_RELEVANCE))
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// The basic enhancement of a single result.
pub fn enhance_one(result: &SearchResult) -> EnhancedResult {
    EnhancedResult {
        original: result.clone(),
        summary: summarize(&result.content),
        relevance_score: relevance_of(result),
        key_points: extract_key_points(&result.content),
        sentiment: classify_sentiment(&result.content),
    }
}

pub fn enhance_all(results: &[SearchResult]) -> Vec<EnhancedResult> {
    results.iter().map(enhance_one).collect()
}

/// Enhancer that only runs the local heuristics. Never fails.
#[derive(Debug, Default, Clone)]
pub struct HeuristicEnhancer;

#[async_trait]
impl Enhancer for HeuristicEnhancer {
    async fn enhance(
        &self,
        _query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<EnhancedResult>, SearchError> {
        Ok(enhance_all(results))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
