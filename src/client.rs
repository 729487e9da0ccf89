use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api_models::{decode_records, RawAutocomplete, RawResult, RawSearchResponse};
use crate::config::ClientConfig;
use crate::enhance::{self, Enhancer};
use crate::errors::SearchError;
use crate::models::{
    EnhancedResult, HealthStatus, SearchFilters, SearchMetrics, SearchResponse, SearchResult,
    Suggestion, TimeRange,
};

/// Client for a SearXNG instance plus the configured result enhancer.
#[derive(Clone)]
pub struct SearchClient {
    http: Client,
    config: Arc<ClientConfig>,
    enhancer: Arc<dyn Enhancer>,
}

impl SearchClient {
    pub fn new(config: ClientConfig) -> Result<Self, SearchError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| SearchError::invalid_config("http_client", e.to_string()))?;

        let enhancer = enhance::from_config(&config, http.clone());

        Ok(Self {
            http,
            config: Arc::new(config),
            enhancer,
        })
    }

    /// Replace the enhancer picked from configuration.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn enhancer_name(&self) -> &str {
        self.enhancer.name()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Run one query against `/search` and normalize the answer.
    ///
    /// The query is sent as given; trimming and emptiness checks belong to
    /// the caller. Fails fast, there is no retry.
    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchResponse, SearchError> {
        let search_id = Uuid::new_v4();
        let start = Instant::now();
        let params = build_search_params(query, filters);

        log::debug!("[{}] GET /search {:?}", search_id, params);

        let outcome = self.fetch_results(&params).await;
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("[{}] search failed for '{}': {}", search_id, query, e);
                return Err(e);
            }
        };

        let mut results = normalize_results(decode_records(raw.results));
        if let Some(limit) = self.config.max_results {
            results.truncate(limit);
        }

        let query_time_ms = start.elapsed().as_millis() as u64;
        let metrics = SearchMetrics::from_results(&results, query_time_ms);

        log::info!(
            "[{}] '{}' returned {} results from {} engines in {}ms",
            search_id,
            query,
            metrics.total_results,
            metrics.engines.len(),
            query_time_ms
        );

        Ok(SearchResponse {
            search_id,
            query: query.to_string(),
            results,
            metrics,
            suggestions: raw.suggestions,
            searched_at: chrono::Utc::now(),
        })
    }

    /// Same as [`search`](Self::search) but gives up as soon as `token` is
    /// cancelled.
    pub async fn search_cancellable(
        &self,
        query: &str,
        filters: &SearchFilters,
        token: CancellationToken,
    ) -> Result<SearchResponse, SearchError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                log::debug!("search for '{}' cancelled", query);
                Err(SearchError::cancelled(query))
            }
            outcome = self.search(query, filters) => outcome,
        }
    }

    /// News search: forces the `news` category and defaults to the past year.
    pub async fn search_news(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<SearchResponse, SearchError> {
        self.search(query, &news_filters(filters)).await
    }

    async fn fetch_results(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<RawSearchResponse, SearchError> {
        let base = self.config.base_url.as_str();

        let response = self
            .http
            .get(self.endpoint("search"))
            .query(params)
            .send()
            .await
            .map_err(|e| SearchError::from_request(base, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_request(base, e))?;

        if !status.is_success() {
            return Err(SearchError::from_status(status, &body));
        }

        if body.trim().is_empty() {
            return Err(SearchError::unexpected("Empty response from SearXNG"));
        }

        serde_json::from_str(&body)
            .map_err(|e| SearchError::decode("Invalid JSON response from SearXNG", e))
    }

    /// Autocomplete suggestions. Best effort: any failure yields an empty list.
    pub async fn get_suggestions(&self, query: &str) -> Vec<Suggestion> {
        match self.fetch_suggestions(query).await {
            Ok(items) => items.into_iter().map(Suggestion::autocomplete).collect(),
            Err(e) => {
                log::warn!("autocomplete failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let base = self.config.base_url.as_str();

        let response = self
            .http
            .get(self.endpoint("autocompleter"))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| SearchError::from_request(base, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::from_request(base, e))?;

        if !status.is_success() {
            return Err(SearchError::from_status(status, &body));
        }

        let parsed: RawAutocomplete = serde_json::from_str(&body)
            .map_err(|e| SearchError::decode("Invalid autocomplete response", e))?;
        Ok(parsed.into_strings())
    }

    /// Enhance a result batch. Never fails: enhancer errors degrade to the
    /// local heuristics.
    pub async fn enhance_results(
        &self,
        query: &str,
        results: &[SearchResult],
    ) -> Vec<EnhancedResult> {
        enhance::enhance_with_fallback(self.enhancer.as_ref(), query, results).await
    }

    /// Probe the instance via `/config`.
    pub async fn health_status(&self) -> HealthStatus {
        let url = self.config.base_url.clone();
        let start = Instant::now();

        let outcome = match self.http.get(self.endpoint("config")).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(SearchError::from_status(response.status(), "").to_user_message()),
            Err(e) => Err(SearchError::from_request(&url, e).message()),
        };

        match outcome {
            Ok(()) => HealthStatus::Healthy {
                url,
                response_time_ms: start.elapsed().as_millis() as u64,
            },
            Err(error) => {
                log::warn!("SearXNG at {} is unhealthy: {}", url, error);
                HealthStatus::Unhealthy { url, error }
            }
        }
    }
}

/// `filters` narrowed to the news category, past year unless a range is set.
pub fn news_filters(filters: &SearchFilters) -> SearchFilters {
    let mut filters = filters.clone();
    filters.categories = Some(vec!["news".to_string()]);
    if filters.time_range.is_none() {
        filters.time_range = Some(TimeRange::Year);
    }
    filters
}

/// Query-string pairs for `/search`. Unset (or empty) filters are left out.
pub fn build_search_params(query: &str, filters: &SearchFilters) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.to_string()), ("format", "json".to_string())];

    if let Some(categories) = joined(&filters.categories) {
        params.push(("categories", categories));
    }
    if let Some(engines) = joined(&filters.engines) {
        params.push(("engines", engines));
    }
    if let Some(language) = &filters.language {
        params.push(("language", language.clone()));
    }
    if let Some(time_range) = filters.time_range {
        params.push(("time_range", time_range.as_str().to_string()));
    }
    if let Some(safe_search) = filters.safe_search {
        params.push(("safesearch", safe_search.level().to_string()));
    }

    params
}

// Comma-joined, trimmed and deduplicated. `None` when nothing is left.
fn joined(list: &Option<Vec<String>>) -> Option<String> {
    let mut seen: Vec<&str> = Vec::new();
    for item in list.iter().flatten().map(|s| s.trim()) {
        if !item.is_empty() && !seen.contains(&item) {
            seen.push(item);
        }
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen.join(","))
    }
}

/// Default score for a record at `index` that carries none. `index` counts
/// kept records only, so a dropped malformed record does not leave a gap.
/// Not floored: it goes negative past the tenth position.
pub fn positional_score(index: usize) -> f64 {
    1.0 - index as f64 * 0.1
}

pub fn normalize_results(raw: Vec<RawResult>) -> Vec<SearchResult> {
    raw.into_iter()
        .enumerate()
        .map(|(index, item)| normalize_result(index, item))
        .collect()
}

fn normalize_result(index: usize, item: RawResult) -> SearchResult {
    let RawResult {
        title,
        url,
        content,
        snippet,
        engine,
        engines,
        score,
        category,
        published_date,
    } = item;

    SearchResult {
        title: title.unwrap_or_else(|| "Untitled".to_string()),
        url: url.unwrap_or_default(),
        content: content.or(snippet).unwrap_or_default(),
        engine: engine
            .or_else(|| engines.into_iter().next())
            .unwrap_or_else(|| "unknown".to_string()),
        score: Some(score.unwrap_or_else(|| positional_score(index))),
        category: Some(category.unwrap_or_else(|| "general".to_string())),
        published_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SafeSearch;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn unset_filters_are_omitted() {
        let params = build_search_params("rust", &SearchFilters::default());
        assert_eq!(
            params,
            vec![("q", "rust".to_string()), ("format", "json".to_string())]
        );
    }

    #[test]
    fn filters_map_to_wire_keys() {
        let filters = SearchFilters::default()
            .with_engines(["google", "bing", "google"])
            .with_categories(["general", "it"])
            .with_language("en")
            .with_time_range(TimeRange::Month)
            .with_safe_search(SafeSearch::Strict);
        let params = build_search_params("rust vs go", &filters);

        assert_eq!(param(&params, "engines"), Some("google,bing"));
        assert_eq!(param(&params, "categories"), Some("general,it"));
        assert_eq!(param(&params, "language"), Some("en"));
        assert_eq!(param(&params, "time_range"), Some("month"));
        assert_eq!(param(&params, "safesearch"), Some("2"));
    }

    #[test]
    fn empty_lists_are_omitted() {
        let filters = SearchFilters::default()
            .with_engines(Vec::<String>::new())
            .with_categories([" ", ""]);
        let params = build_search_params("rust", &filters);
        assert!(param(&params, "engines").is_none());
        assert!(param(&params, "categories").is_none());
    }

    #[test]
    fn normalization_applies_defaults() {
        let raw = vec![
            RawResult {
                title: Some("Rust".into()),
                url: Some("https://rust-lang.org".into()),
                content: Some("A language".into()),
                snippet: Some("ignored".into()),
                engine: Some("google".into()),
                score: Some(0.9),
                category: Some("it".into()),
                ..Default::default()
            },
            RawResult {
                snippet: Some("From the snippet".into()),
                ..Default::default()
            },
            RawResult {
                engines: vec!["brave".into(), "bing".into()],
                ..Default::default()
            },
        ];
        let results = normalize_results(raw);

        assert_eq!(results[0].content, "A language");
        assert_eq!(results[0].score, Some(0.9));
        assert_eq!(results[0].category.as_deref(), Some("it"));

        assert_eq!(results[1].title, "Untitled");
        assert_eq!(results[1].url, "");
        assert_eq!(results[1].content, "From the snippet");
        assert_eq!(results[1].engine, "unknown");
        assert_eq!(results[1].score, Some(0.9));
        assert_eq!(results[1].category.as_deref(), Some("general"));

        assert_eq!(results[2].engine, "brave");
        assert!((results[2].score.unwrap() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn news_filters_keep_explicit_range() {
        let filters = SearchFilters::default()
            .with_categories(["science"])
            .with_time_range(TimeRange::Day)
            .with_language("de");
        let news = news_filters(&filters);
        assert_eq!(news.categories, Some(vec!["news".to_string()]));
        assert_eq!(news.time_range, Some(TimeRange::Day));
        assert_eq!(news.language.as_deref(), Some("de"));

        let defaulted = news_filters(&SearchFilters::default());
        assert_eq!(defaulted.time_range, Some(TimeRange::Year));
    }

    #[test]
    fn positional_score_is_not_floored() {
        assert_eq!(positional_score(0), 1.0);
        assert!((positional_score(5) - 0.5).abs() < 1e-9);
        assert!(positional_score(12) < 0.0);
    }

    #[test]
    fn constructor_rejects_invalid_config() {
        let config = ClientConfig {
            base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(SearchClient::new(config).is_err());
    }
}
