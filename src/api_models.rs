use serde::{Deserialize, Serialize};

use crate::models::SearchResult;

// SearXNG `/search?format=json` body. Records are heterogeneous across
// engines: they stay untyped here and go through `decode_records` one by one,
// and defaults are applied during normalization.
#[derive(Deserialize, Debug, Default)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Decode each record independently. A record that does not fit
/// [`RawResult`] is logged and dropped; the rest of the batch survives.
pub fn decode_records(values: Vec<serde_json::Value>) -> Vec<RawResult> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<RawResult>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Skipping malformed result #{}: {}", index, e);
                None
            }
        })
        .collect()
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub engines: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "publishedDate")]
    pub published_date: Option<String>,
}

// `/autocompleter` answers either with a flat list or with the OpenSearch
// pair `[query, [suggestions...]]`.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawAutocomplete {
    Flat(Vec<String>),
    OpenSearch(String, Vec<String>),
}

impl RawAutocomplete {
    pub fn into_strings(self) -> Vec<String> {
        match self {
            RawAutocomplete::Flat(items) => items,
            RawAutocomplete::OpenSearch(_, items) => items,
        }
    }
}

// Request body for the remote enhancement service.
#[derive(Serialize, Debug)]
pub struct EnhanceRequest<'a> {
    pub query: &'a str,
    pub results: Vec<EnhanceRequestResult<'a>>,
    pub enhancement_type: &'static str,
}

#[derive(Serialize, Debug)]
pub struct EnhanceRequestResult<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub content: &'a str,
    pub engine: &'a str,
    pub score: f64,
    pub category: &'a str,
}

impl<'a> From<&'a SearchResult> for EnhanceRequestResult<'a> {
    fn from(result: &'a SearchResult) -> Self {
        EnhanceRequestResult {
            title: &result.title,
            url: &result.url,
            content: &result.content,
            engine: &result.engine,
            score: result.score.unwrap_or(0.0),
            category: result.category.as_deref().unwrap_or("general"),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct EnhancedResultPayload {
    pub ai_summary: String,
    pub relevance_score: f64,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_response_tolerates_missing_fields() {
        let body = r#"{"results":[{"url":"https://a.example"},{"title":"B","snippet":"s","publishedDate":"2025-01-02"}]}"#;
        let parsed: RawSearchResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.suggestions.is_empty());

        let records = decode_records(parsed.results);
        assert_eq!(records.len(), 2);
        assert!(records[0].title.is_none());
        assert_eq!(records[1].snippet.as_deref(), Some("s"));
        assert_eq!(records[1].published_date.as_deref(), Some("2025-01-02"));
    }

    #[test]
    fn malformed_records_are_dropped_individually() {
        let body = r#"{"results":[
            {"title":"good one","engine":"google","score":0.9},
            {"title":"bad one","engines":null},
            {"title":42},
            {"title":"string score","score":"high"},
            {"title":"also good"}
        ]}"#;
        let parsed: RawSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 5);

        let records = decode_records(parsed.results);
        let titles: Vec<_> = records.iter().map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("good one"), Some("also good")]);
        assert_eq!(records[0].score, Some(0.9));
    }

    #[test]
    fn autocomplete_accepts_both_shapes() {
        let flat: RawAutocomplete = serde_json::from_str(r#"["rust book","rust lang"]"#).unwrap();
        assert_eq!(flat.into_strings(), vec!["rust book", "rust lang"]);

        let open: RawAutocomplete =
            serde_json::from_str(r#"["rust",["rust book","rust lang"]]"#).unwrap();
        assert_eq!(open.into_strings(), vec!["rust book", "rust lang"]);
    }
}
