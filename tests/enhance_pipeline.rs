//! Enhancement pipeline behaviour through the public client API, plus config
//! loading from a dotenv file.

use searxng_assistant::enhance::heuristic::{self, MAX_KEY_POINTS, SUMMARY_MAX_CHARS};
use searxng_assistant::enhance::remote::{RELEVANCE_BOOST, VERIFIED_KEY_POINT};
use searxng_assistant::{ClientConfig, SearchClient, SearchResult};
use std::io::Write;

fn result(title: &str, content: &str, score: Option<f64>) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: format!("https://example.com/{}", title.to_lowercase()),
        content: content.to_string(),
        engine: "google".to_string(),
        score,
        category: Some("general".to_string()),
        published_date: None,
    }
}

fn batch() -> Vec<SearchResult> {
    vec![
        result(
            "Four",
            "Rust compiles to efficient native machine code. \
             The borrow checker prevents data races at compile time. \
             Cargo makes dependency management pleasant for teams. \
             Async runtimes such as tokio power many network services.",
            Some(0.7),
        ),
        result("Short", "A tiny snippet.", None),
        result("Long", &"lorem ipsum dolor ".repeat(20), Some(0.2)),
    ]
}

fn simulated_ai_config() -> ClientConfig {
    ClientConfig {
        ai_enhancement: true,
        ai_simulated_delay_ms: 0,
        ..Default::default()
    }
}

#[tokio::test]
async fn heuristics_preserve_cardinality_and_order() {
    let client = SearchClient::new(ClientConfig::default()).expect("valid config");
    let input = batch();
    let enhanced = client.enhance_results("rust", &input).await;

    assert_eq!(client.enhancer_name(), "heuristic");
    assert_eq!(enhanced.len(), input.len());
    for (e, original) in enhanced.iter().zip(&input) {
        assert_eq!(&e.original, original);
        assert!(e.key_points.len() <= MAX_KEY_POINTS);
        assert!((0.0..=1.0).contains(&e.relevance_score));
    }

    // Four long sentences: exactly the first three become key points.
    assert_eq!(
        enhanced[0].key_points,
        vec![
            "Rust compiles to efficient native machine code",
            "The borrow checker prevents data races at compile time",
            "Cargo makes dependency management pleasant for teams",
        ]
    );

    // Content within the limit is its own summary.
    assert_eq!(enhanced[1].summary, "A tiny snippet.");
    assert_eq!(enhanced[1].relevance_score, 0.5);

    // Long content is cut and marked.
    assert!(enhanced[2].summary.ends_with("..."));
    assert!(enhanced[2].summary.chars().count() <= SUMMARY_MAX_CHARS + 3);
}

#[tokio::test]
async fn disabled_ai_adds_no_augmentation() {
    let client = SearchClient::new(ClientConfig::default()).expect("valid config");
    let input = batch();
    let enhanced = client.enhance_results("rust", &input).await;

    assert_eq!(enhanced, heuristic::enhance_all(&input));
    for e in &enhanced {
        assert!(!e.summary.contains("relevant to your search"));
        assert!(!e.key_points.iter().any(|p| p == VERIFIED_KEY_POINT));
    }
    assert_eq!(enhanced[0].relevance_score, 0.7);
}

#[tokio::test]
async fn simulated_ai_boosts_and_annotates() {
    let client = SearchClient::new(simulated_ai_config()).expect("valid config");
    let input = batch();
    let enhanced = client.enhance_results("rust", &input).await;

    assert_eq!(client.enhancer_name(), "simulated-ai");
    assert_eq!(enhanced.len(), input.len());

    for (e, original) in enhanced.iter().zip(&input) {
        assert_eq!(&e.original, original);
        assert!(e
            .summary
            .ends_with("This result is relevant to your search for \"rust\"."));
        assert!(e.key_points.len() <= MAX_KEY_POINTS);
        assert_eq!(e.key_points.last().map(String::as_str), Some(VERIFIED_KEY_POINT));
        assert!(e.key_points.iter().any(|p| p == "Relates to: rust"));
    }

    assert!((enhanced[0].relevance_score - (0.7 + RELEVANCE_BOOST)).abs() < 1e-9);
    assert!((enhanced[1].relevance_score - 0.7).abs() < 1e-9);
    assert!((enhanced[2].relevance_score - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn empty_batch_enhances_to_empty() {
    let client = SearchClient::new(simulated_ai_config()).expect("valid config");
    assert!(client.enhance_results("rust", &[]).await.is_empty());
}

#[test]
fn config_loads_from_dotenv_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "# local instance").unwrap();
    writeln!(file, "SEARXNG_URL=http://search.local:8080/").unwrap();
    writeln!(file, "SEARXNG_TIMEOUT=12").unwrap();
    writeln!(file, "SEARXNG_MAX_RESULTS=20").unwrap();
    writeln!(file, "AI_ENHANCEMENT_ENABLED=true").unwrap();
    file.flush().unwrap();

    let config = ClientConfig::from_env_file(file.path()).expect("config loads");

    assert_eq!(config.base_url, "http://search.local:8080");
    assert_eq!(config.timeout_seconds, 12);
    assert_eq!(config.max_results, Some(20));
    assert!(config.ai_enhancement);
    assert!(config.ai_endpoint.is_none());
}

#[test]
fn invalid_dotenv_values_are_reported() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "SEARXNG_TIMEOUT=never").unwrap();
    file.flush().unwrap();

    let err = ClientConfig::from_env_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("SEARXNG_TIMEOUT"));
}

#[test]
fn missing_dotenv_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.env");
    assert!(ClientConfig::from_env_file(&missing).is_err());
}
