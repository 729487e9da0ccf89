//! Terminal client for a self-hosted SearXNG metasearch instance.
//!
//! [`SearchClient`] issues queries, normalizes the heterogeneous result
//! records SearXNG returns and post-processes them through an [`Enhancer`]
//! (local heuristics, or an AI-style enhancer that is either simulated or
//! backed by an HTTP service).

pub mod api_models;
pub mod cli;
pub mod client;
pub mod config;
pub mod enhance;
pub mod errors;
pub mod intent;
pub mod models;
pub mod session;

pub use client::SearchClient;
pub use config::ClientConfig;
pub use enhance::{Enhancer, HeuristicEnhancer, RemoteEnhancer};
pub use errors::SearchError;
pub use intent::{extract_intent, suggest_refinements, SearchIntent};
pub use models::{
    EnhancedResult, HealthStatus, SafeSearch, SearchFilters, SearchMetrics, SearchResponse,
    SearchResult, Sentiment, Suggestion, TimeRange,
};
