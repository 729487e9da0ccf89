//! Rule-table query classification.
//!
//! Rules are evaluated top to bottom and the first match wins, so the order
//! of the tables below is part of their meaning.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Informational,
    Navigational,
    Transactional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Health,
    News,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    pub query: String,
    pub intent: Intent,
    pub category: Category,
    pub urgency: Urgency,
    pub confidence: f64,
}

const INTENT_RULES: &[(&[&str], Intent)] = &[
    (&["buy", "purchase", "price", "cost"], Intent::Transactional),
    (&["how to", "tutorial", "guide"], Intent::Informational),
    (&["login", "website", "official"], Intent::Navigational),
];

const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["tech", "programming", "software"], Category::Technology),
    (&["health", "medical", "doctor"], Category::Health),
    (&["news", "current", "latest"], Category::News),
];

const RULE_CONFIDENCE: f64 = 0.8;
const MAX_REFINEMENTS: usize = 5;

fn first_match<T: Copy>(query: &str, rules: &[(&[&str], T)], default: T) -> T {
    let lower = query.to_lowercase();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, label)| *label)
        .unwrap_or(default)
}

pub fn classify_intent(query: &str) -> Intent {
    first_match(query, INTENT_RULES, Intent::Informational)
}

pub fn classify_category(query: &str) -> Category {
    first_match(query, CATEGORY_RULES, Category::General)
}

pub fn extract_intent(query: &str) -> SearchIntent {
    SearchIntent {
        query: query.to_string(),
        intent: classify_intent(query),
        category: classify_category(query),
        urgency: Urgency::Medium,
        confidence: RULE_CONFIDENCE,
    }
}

/// Alternative phrasings worth offering when a query comes back thin.
pub fn suggest_refinements(query: &str) -> Vec<String> {
    let query = query.trim();
    let mut refinements = vec![query.to_string()];

    if query.contains(' ') && !query.contains('"') {
        refinements.push(format!("\"{}\"", query));
    }

    refinements.extend([
        format!("{} tutorial", query),
        format!("{} guide", query),
        format!("{} {}", query, chrono::Utc::now().year()),
        format!("how to {}", query),
        format!("{} best practices", query),
    ]);

    refinements.truncate(MAX_REFINEMENTS);
    refinements
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Intent::Informational => "informational",
            Intent::Navigational => "navigational",
            Intent::Transactional => "transactional",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::Technology => "technology",
            Category::Health => "health",
            Category::News => "news",
            Category::General => "general",
        };
        f.write_str(label)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transactional_rule_wins_over_later_rules() {
        // "guide" would be informational, "official" navigational.
        assert_eq!(
            classify_intent("Buy the official Rust guide"),
            Intent::Transactional
        );
    }

    #[test]
    fn informational_checked_before_navigational() {
        assert_eq!(
            classify_intent("how to login to the website"),
            Intent::Informational
        );
        assert_eq!(classify_intent("github login"), Intent::Navigational);
    }

    #[test]
    fn default_intent_is_informational() {
        assert_eq!(classify_intent("rust vs go performance"), Intent::Informational);
    }

    #[test]
    fn categories_follow_rule_order() {
        assert_eq!(classify_category("latest programming news"), Category::Technology);
        assert_eq!(classify_category("find a doctor"), Category::Health);
        assert_eq!(classify_category("current events"), Category::News);
        assert_eq!(classify_category("banana bread"), Category::General);
    }

    #[test]
    fn extract_intent_combines_rules() {
        let intent = extract_intent("software price comparison");
        assert_eq!(intent.intent, Intent::Transactional);
        assert_eq!(intent.category, Category::Technology);
        assert_eq!(intent.urgency, Urgency::Medium);
        assert_eq!(intent.confidence, 0.8);
        assert_eq!(intent.query, "software price comparison");
    }

    #[test]
    fn refinements_quote_multi_word_queries() {
        let refinements = suggest_refinements("rust async");
        assert_eq!(refinements.len(), 5);
        assert_eq!(refinements[0], "rust async");
        assert_eq!(refinements[1], "\"rust async\"");
        assert_eq!(refinements[2], "rust async tutorial");
    }

    #[test]
    fn refinements_skip_quoting_single_words() {
        let refinements = suggest_refinements("tokio");
        assert_eq!(refinements[1], "tokio tutorial");
        assert_eq!(refinements.len(), 5);
        assert!(refinements.iter().all(|r| r.contains("tokio")));
    }
}
