use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Canonical, normalized search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub engine: String,
    pub score: Option<f64>,
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Lenient parse used for labels coming from remote services.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search result with derived summary, key points, relevance and sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedResult {
    pub original: SearchResult,
    pub summary: String,
    /// Always within `[0, 1]`.
    pub relevance_score: f64,
    /// At most three entries.
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Hour => "hour",
            TimeRange::Day => "day",
            TimeRange::Week => "week",
            TimeRange::Month => "month",
            TimeRange::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafeSearch {
    Off = 0,
    Moderate = 1,
    Strict = 2,
}

impl SafeSearch {
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for SafeSearch {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SafeSearch::Off),
            1 => Ok(SafeSearch::Moderate),
            2 => Ok(SafeSearch::Strict),
            other => Err(format!("safe search must be 0, 1 or 2, got {}", other)),
        }
    }
}

/// Request shaping options. Every field is optional; unset fields are not
/// sent to the backend at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub engines: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub language: Option<String>,
    pub time_range: Option<TimeRange>,
    pub safe_search: Option<SafeSearch>,
}

impl SearchFilters {
    pub fn with_engines<I, S>(mut self, engines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.engines = Some(engines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn with_safe_search(mut self, safe_search: SafeSearch) -> Self {
        self.safe_search = Some(safe_search);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub total_results: usize,
    pub query_time_ms: u64,
    /// Distinct engine names reported across the returned results.
    pub engines: BTreeSet<String>,
}

impl SearchMetrics {
    pub fn from_results(results: &[SearchResult], query_time_ms: u64) -> Self {
        Self {
            total_results: results.len(),
            query_time_ms,
            engines: results.iter().map(|r| r.engine.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub search_id: Uuid,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub metrics: SearchMetrics,
    /// Related queries the backend proposed alongside the results.
    pub suggestions: Vec<String>,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Autocomplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub confidence: f64,
}

/// Confidence attached to every autocomplete suggestion. Not measured.
pub const AUTOCOMPLETE_CONFIDENCE: f64 = 0.8;

impl Suggestion {
    pub fn autocomplete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: SuggestionKind::Autocomplete,
            confidence: AUTOCOMPLETE_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy { url: String, response_time_ms: u64 },
    Unhealthy { url: String, error: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy { .. })
    }
}
