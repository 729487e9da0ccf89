//! Result enhancement.
//!
//! An [`Enhancer`] turns a batch of [`SearchResult`]s into
//! [`EnhancedResult`]s, one per input and in the same order. Two
//! implementations exist: [`HeuristicEnhancer`] (always available, never
//! fails) and [`RemoteEnhancer`] (AI-style enhancement, simulated locally or
//! delegated to an HTTP service). [`enhance_with_fallback`] wraps any
//! enhancer so that failures degrade to the heuristics instead of surfacing.

pub mod heuristic;
pub mod remote;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::models::{EnhancedResult, SearchResult};

pub use heuristic::HeuristicEnhancer;
pub use remote::RemoteEnhancer;

#[async_trait]
pub trait Enhancer: Send + Sync {
    async fn enhance(
        &self,
        query: &str,
        results: &[SearchResult],
    ) -> Result<Vec<EnhancedResult>, SearchError>;

    fn name(&self) -> &str;
}

/// Pick the enhancer matching the configuration flag.
pub fn from_config(config: &ClientConfig, http: reqwest::Client) -> Arc<dyn Enhancer> {
    if config.ai_enhancement {
        Arc::new(RemoteEnhancer::from_config(config, http))
    } else {
        Arc::new(HeuristicEnhancer)
    }
}

/// Run `enhancer`, falling back to the heuristics on error or when the
/// output does not line up 1:1 with the input.
pub async fn enhance_with_fallback(
    enhancer: &dyn Enhancer,
    query: &str,
    results: &[SearchResult],
) -> Vec<EnhancedResult> {
    match enhancer.enhance(query, results).await {
        Ok(enhanced) if lines_up(results, &enhanced) => enhanced,
        Ok(enhanced) => {
            log::warn!(
                "{} enhancer returned {} results for {} inputs, using heuristics",
                enhancer.name(),
                enhanced.len(),
                results.len()
            );
            heuristic::enhance_all(results)
        }
        Err(e) => {
            log::warn!(
                "{} enhancer failed, using heuristics: {}",
                enhancer.name(),
                e
            );
            heuristic::enhance_all(results)
        }
    }
}

fn lines_up(input: &[SearchResult], output: &[EnhancedResult]) -> bool {
    input.len() == output.len()
        && input
            .iter()
            .zip(output)
            .all(|(original, enhanced)| &enhanced.original == original)
        && output
            .iter()
            .all(|e| e.key_points.len() <= heuristic::MAX_KEY_POINTS)
}
