use async_trait::async_trait;
use std::time::Duration;

use super::heuristic::{self, clamp_unit, MAX_KEY_POINTS};
use super::Enhancer;
use crate::api_models::{EnhanceRequest, EnhanceRequestResult, EnhancedResultPayload};
use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::models::{EnhancedResult, SearchResult, Sentiment};

pub const RELEVANCE_BOOST: f64 = 0.2;
pub const VERIFIED_KEY_POINT: &str = "AI-verified content";

enum Backend {
    /// Deterministic stand-in for a model: heuristics plus fixed augmentations.
    Simulated { delay: Duration },
    /// An external enhancement service speaking the `/enhance-results` contract.
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
}

pub struct RemoteEnhancer {
    backend: Backend,
}

impl RemoteEnhancer {
    pub fn simulated(delay: Duration) -> Self {
        Self {
            backend: Backend::Simulated { delay },
        }
    }

    pub fn http(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            backend: Backend::Http {
                client,
                endpoint: endpoint.into().trim_end_matches('/').to_string(),
            },
        }
    }

    pub fn from_config(config: &ClientConfig, client: reqwest::Client) -> Self {
        match &config.ai_endpoint {
            Some(endpoint) => Self::http(client, endpoint.clone()),
            None => Self::simulated(Duration::from_millis(config.ai_simulated_delay_ms)),
        }
    }

    async fn call_service(
        client: &reqwest::Client,
        endpoint: &str,
        query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<EnhancedResult>, SearchError> {
        let url = format!("{}/enhance-results", endpoint);
        let body = EnhanceRequest {
            query,
            results: results.iter().map(EnhanceRequestResult::from).collect(),
            enhancement_type: "all",
        };

        log::debug!("POST {} ({} results)", url, results.len());

        let response = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::from_request(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::from_request(endpoint, e))?;

        if !status.is_success() {
            return Err(SearchError::from_status(status, &text));
        }

        let payload: Vec<EnhancedResultPayload> = serde_json::from_str(&text)
            .map_err(|e| SearchError::decode("Invalid JSON from enhancement service", e))?;

        if payload.len() != results.len() {
            return Err(SearchError::unexpected(format!(
                "Enhancement service returned {} results for {} inputs",
                payload.len(),
                results.len()
            )));
        }

        Ok(results
            .iter()
            .zip(payload)
            .map(|(original, item)| from_payload(original, item))
            .collect())
    }
}

// The service never supplies `original`; it always comes from our input.
fn from_payload(original: &SearchResult, item: EnhancedResultPayload) -> EnhancedResult {
    let mut key_points = item.key_points;
    key_points.truncate(MAX_KEY_POINTS);

    EnhancedResult {
        original: original.clone(),
        summary: item.ai_summary,
        relevance_score: clamp_unit(item.relevance_score),
        key_points,
        sentiment: item
            .sentiment
            .as_deref()
            .map(Sentiment::from_label)
            .unwrap_or(Sentiment::Neutral),
    }
}

/// Heuristic enhancement decorated the way the simulated model answers.
pub fn augment(query: &str, result: &SearchResult) -> EnhancedResult {
    let mut enhanced = heuristic::enhance_one(result);

    let template = format!(
        "This result is relevant to your search for \"{}\".",
        query
    );
    enhanced.summary = if enhanced.summary.is_empty() {
        template
    } else {
        format!("{} {}", enhanced.summary, template)
    };

    // Room for the two fixed points while staying within three.
    enhanced.key_points.truncate(MAX_KEY_POINTS - 2);
    enhanced.key_points.push(format!("Relates to: {}", query));
    enhanced.key_points.push(VERIFIED_KEY_POINT.to_string());

    enhanced.relevance_score = (enhanced.relevance_score + RELEVANCE_BOOST).min(1.0);
    enhanced
}

#[async_trait]
impl Enhancer for RemoteEnhancer {
    async fn enhance(
        &self,
        query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<EnhancedResult>, SearchError> {
        match &self.backend {
            Backend::Simulated { delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                Ok(results.iter().map(|r| augment(query, r)).collect())
            }
            Backend::Http { client, endpoint } => {
                Self::call_service(client, endpoint, query, results).await
            }
        }
    }

    fn name(&self) -> &str {
        match self.backend {
            Backend::Simulated { .. } => "simulated-ai",
            Backend::Http { .. } => "remote-ai",
        }
    }
}
