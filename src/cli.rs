use std::io::{self, Write};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::ClientConfig;
use crate::errors::SearchError;
use crate::intent::SearchIntent;
use crate::models::{
    EnhancedResult, HealthStatus, SafeSearch, SearchFilters, SearchResponse, SearchResult,
    Suggestion, TimeRange,
};

const TITLE_WIDTH: usize = 50;
const SNIPPET_WIDTH: usize = 70;

/// Query a SearXNG instance from the terminal.
#[derive(Parser, Debug)]
#[command(name = "searxng-assistant", version, about)]
pub struct Cli {
    /// SearXNG base URL (overrides SEARXNG_URL).
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Request timeout in seconds (overrides SEARXNG_TIMEOUT).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Keep at most this many results (overrides SEARXNG_MAX_RESULTS).
    #[arg(long, global = true)]
    pub max_results: Option<usize>,

    /// Use the AI enhancer instead of the local heuristics.
    #[arg(long, global = true)]
    pub ai: bool,

    /// Remote enhancement service (overrides AI_ENHANCER_URL).
    #[arg(long, global = true)]
    pub ai_endpoint: Option<String>,

    /// Debug logging (RUST_LOG still wins when set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, value_enum, global = true, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a search.
    Search(SearchArgs),

    /// Search the news category (past year unless --time-range is given).
    News(SearchArgs),

    /// Autocomplete suggestions for a partial query.
    Suggest {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Classify a query and propose refinements. Works offline.
    Intent {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Check that the SearXNG instance answers.
    Health,

    /// Interactive search prompt (the default).
    Interactive,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Comma separated engine names.
    #[arg(long, value_delimiter = ',')]
    pub engines: Option<Vec<String>>,

    /// Comma separated categories.
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    #[arg(long)]
    pub language: Option<String>,

    #[arg(long, value_enum)]
    pub time_range: Option<TimeRange>,

    /// 0 = off, 1 = moderate, 2 = strict.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub safe_search: Option<u8>,

    /// Add summaries, key points and sentiment to each result.
    #[arg(short, long)]
    pub enhance: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl Cli {
    /// Command line flags win over everything loaded from the environment.
    pub fn apply_overrides(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(max_results) = self.max_results {
            config.max_results = Some(max_results);
        }
        if self.ai {
            config.ai_enhancement = true;
        }
        if let Some(endpoint) = &self.ai_endpoint {
            config.ai_enhancement = true;
            config.ai_endpoint = Some(endpoint.trim_end_matches('/').to_string());
        }
    }
}

impl SearchArgs {
    pub fn query(&self) -> String {
        join_query(&self.query)
    }

    pub fn filters(&self) -> Result<SearchFilters, SearchError> {
        let safe_search = self
            .safe_search
            .map(SafeSearch::try_from)
            .transpose()
            .map_err(|e| SearchError::invalid_config("safe_search", e))?;

        Ok(SearchFilters {
            engines: self.engines.clone(),
            categories: self.categories.clone(),
            language: self.language.clone(),
            time_range: self.time_range,
            safe_search,
        })
    }
}

pub fn join_query(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

// Presentation

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

pub fn print_header() {
    let term = Term::stdout();
    let _ = term.clear_screen();

    println!("{}", "╔══════════════════════════════════════╗".cyan());
    println!("{}", "║        🔍 SearXNG Assistant          ║".cyan());
    println!("{}", "╚══════════════════════════════════════╝".cyan());
    println!();
}

pub fn print_separator() {
    println!("{}", "─".repeat(50).dimmed());
}

pub fn print_error(error: &SearchError) {
    if error.is_cancelled() {
        println!("{} {}", "⏹".yellow(), error);
        return;
    }
    println!("{} {}", "❌".red(), error.to_user_message());
    if let SearchError::Transport { .. } = error {
        println!(
            "{} Check that SearXNG is running and SEARXNG_URL points to it",
            "💡".yellow()
        );
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Engine")]
    engine: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Snippet")]
    snippet: String,
}

#[derive(Tabled)]
struct EnhancedRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Relevance")]
    relevance: String,
    #[tabled(rename = "Sentiment")]
    sentiment: String,
    #[tabled(rename = "Summary")]
    summary: String,
}

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Suggestion")]
    text: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

// Flat record for CSV export; the csv crate cannot serialize nested values.
#[derive(Serialize, Debug, PartialEq)]
pub struct CsvRecord<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub engine: &'a str,
    pub score: Option<f64>,
    pub category: Option<&'a str>,
    pub content: &'a str,
    pub summary: Option<&'a str>,
    pub relevance: Option<f64>,
    pub sentiment: Option<&'static str>,
    pub key_points: Option<String>,
}

impl<'a> From<&'a SearchResult> for CsvRecord<'a> {
    fn from(result: &'a SearchResult) -> Self {
        CsvRecord {
            title: &result.title,
            url: &result.url,
            engine: &result.engine,
            score: result.score,
            category: result.category.as_deref(),
            content: &result.content,
            summary: None,
            relevance: None,
            sentiment: None,
            key_points: None,
        }
    }
}

impl<'a> From<&'a EnhancedResult> for CsvRecord<'a> {
    fn from(enhanced: &'a EnhancedResult) -> Self {
        CsvRecord {
            summary: Some(&enhanced.summary),
            relevance: Some(enhanced.relevance_score),
            sentiment: Some(enhanced.sentiment.as_str()),
            key_points: Some(enhanced.key_points.join(" | ")),
            ..CsvRecord::from(&enhanced.original)
        }
    }
}

pub fn write_csv<'a, W, I>(writer: W, records: I) -> anyhow::Result<()>
where
    W: Write,
    I: IntoIterator<Item = CsvRecord<'a>>,
{
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis.
pub fn truncate_cell(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string())
}

fn print_metrics(response: &SearchResponse) {
    let engines: Vec<&str> = response.metrics.engines.iter().map(String::as_str).collect();
    println!(
        "{} {} results in {}ms from {}",
        "📊".blue(),
        response.metrics.total_results.to_string().bold(),
        response.metrics.query_time_ms,
        if engines.is_empty() {
            "no engines".to_string()
        } else {
            engines.join(", ")
        }
    );
}

fn print_backend_suggestions(response: &SearchResponse) {
    if response.suggestions.is_empty() {
        return;
    }
    println!("{}", "💡 Related searches:".yellow());
    for suggestion in &response.suggestions {
        println!("  {} {}", "•".yellow(), suggestion);
    }
}

pub fn render_results(response: &SearchResponse, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(response),
        OutputFormat::Csv => write_csv(io::stdout(), response.results.iter().map(CsvRecord::from)),
        OutputFormat::Table => {
            println!();
            println!(
                "{}",
                format!("🔍 Results for \"{}\"", response.query).cyan().bold()
            );
            print_separator();

            if response.results.is_empty() {
                println!("{}", "No results found".yellow());
            } else {
                let rows: Vec<ResultRow> = response
                    .results
                    .iter()
                    .enumerate()
                    .map(|(i, r)| ResultRow {
                        index: i + 1,
                        title: truncate_cell(&r.title, TITLE_WIDTH),
                        engine: r.engine.clone(),
                        score: format_score(r.score),
                        snippet: truncate_cell(&r.content, SNIPPET_WIDTH),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table.with(Style::modern());
                println!("{}", table);

                for (i, result) in response.results.iter().enumerate() {
                    if !result.url.is_empty() {
                        println!("  {} {}", format!("[{}]", i + 1).dimmed(), result.url.blue());
                    }
                }
            }

            println!();
            print_metrics(response);
            print_backend_suggestions(response);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct EnhancedOutput<'a> {
    #[serde(flatten)]
    response: &'a SearchResponse,
    enhanced: &'a [EnhancedResult],
}

pub fn render_enhanced(
    response: &SearchResponse,
    enhanced: &[EnhancedResult],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&EnhancedOutput { response, enhanced }),
        OutputFormat::Csv => write_csv(io::stdout(), enhanced.iter().map(CsvRecord::from)),
        OutputFormat::Table => {
            println!();
            println!(
                "{}",
                format!("✨ Enhanced results for \"{}\"", response.query)
                    .cyan()
                    .bold()
            );
            print_separator();

            if enhanced.is_empty() {
                println!("{}", "No results found".yellow());
            } else {
                let rows: Vec<EnhancedRow> = enhanced
                    .iter()
                    .enumerate()
                    .map(|(i, e)| EnhancedRow {
                        index: i + 1,
                        title: truncate_cell(&e.original.title, TITLE_WIDTH),
                        relevance: format!("{:.2}", e.relevance_score),
                        sentiment: e.sentiment.to_string(),
                        summary: truncate_cell(&e.summary, SNIPPET_WIDTH),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table.with(Style::modern());
                println!("{}", table);

                for (i, e) in enhanced.iter().enumerate() {
                    println!("{} {}", format!("[{}]", i + 1).bold(), e.original.url.blue());
                    for point in &e.key_points {
                        println!("    {} {}", "•".blue(), point);
                    }
                }
            }

            println!();
            print_metrics(response);
            print_backend_suggestions(response);
            Ok(())
        }
    }
}

pub fn render_suggestions(
    query: &str,
    suggestions: &[Suggestion],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(suggestions),
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(io::stdout());
            for suggestion in suggestions {
                csv.serialize(suggestion)?;
            }
            csv.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            if suggestions.is_empty() {
                println!("{} No suggestions for \"{}\"", "⚠".yellow(), query);
                return Ok(());
            }
            let rows: Vec<SuggestionRow> = suggestions
                .iter()
                .map(|s| SuggestionRow {
                    text: s.text.clone(),
                    confidence: format!("{:.2}", s.confidence),
                })
                .collect();
            let mut table = Table::new(rows);
            table.with(Style::modern());
            println!("{}", "Suggestions:".cyan().bold());
            println!("{}", table);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct IntentOutput<'a> {
    #[serde(flatten)]
    intent: &'a SearchIntent,
    refinements: &'a [String],
}

pub fn render_intent(
    intent: &SearchIntent,
    refinements: &[String],
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&IntentOutput {
            intent,
            refinements,
        }),
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(io::stdout());
            csv.serialize(intent)?;
            csv.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            println!("{}", format!("🧭 \"{}\"", intent.query).cyan().bold());
            print_separator();
            println!("  {} {}", "Intent:".blue(), intent.intent);
            println!("  {} {}", "Category:".blue(), intent.category);
            println!("  {} {}", "Urgency:".blue(), intent.urgency);
            println!("  {} {:.2}", "Confidence:".blue(), intent.confidence);
            println!();
            println!("{}", "Try also:".blue());
            for refinement in refinements {
                println!("  {} {}", "•".blue(), refinement);
            }
            Ok(())
        }
    }
}

pub fn render_health(status: &HealthStatus, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(io::stdout());
            csv.write_record(["status", "url", "detail"])?;
            match status {
                HealthStatus::Healthy {
                    url,
                    response_time_ms,
                } => {
                    let detail = format!("{}ms", response_time_ms);
                    csv.write_record(["healthy", url.as_str(), detail.as_str()])?
                }
                HealthStatus::Unhealthy { url, error } => {
                    csv.write_record(["unhealthy", url.as_str(), error.as_str()])?
                }
            }
            csv.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            match status {
                HealthStatus::Healthy {
                    url,
                    response_time_ms,
                } => println!(
                    "{} {} is healthy ({}ms)",
                    "✅".green(),
                    url,
                    response_time_ms
                ),
                HealthStatus::Unhealthy { url, error } => {
                    println!("{} {} is unhealthy: {}", "❌".red(), url, error)
                }
            }
            Ok(())
        }
    }
}
