use colored::Colorize;
use console::Term;
use dialoguer::Input;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::cli::{self, OutputFormat};
use crate::client::{news_filters, SearchClient};
use crate::errors::SearchError;
use crate::intent::{extract_intent, suggest_refinements};
use crate::models::{SearchFilters, SearchResponse};

const HISTORY_SHOWN: usize = 10;

/// Tracks the single in-flight query. Starting a new one cancels whatever
/// was running before.
#[derive(Debug, Default)]
pub struct QueryGuard {
    current: Option<CancellationToken>,
}

impl QueryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> CancellationToken {
        self.cancel();
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }
}

/// Drive `work` to completion unless `interrupt` fires first. An interrupt
/// cancels `token` and yields `None`.
pub async fn interruptible<W, I>(
    token: &CancellationToken,
    work: W,
    interrupt: I,
) -> Option<W::Output>
where
    W: Future,
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => {
            token.cancel();
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Search(String),
    News(String),
    Suggest(String),
    Intent(String),
    Health,
    ToggleEnhance,
    History,
    Clear,
    Help,
    Exit,
    Empty,
}

pub fn is_exit_command(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    matches!(lower.as_str(), "quit" | "exit" | "bye" | "goodbye")
}

/// Interpret one line typed at the prompt. Anything that is not a `:`
/// command is a search.
pub fn parse_command(input: &str) -> SessionCommand {
    let input = input.trim();
    if input.is_empty() {
        return SessionCommand::Empty;
    }
    if is_exit_command(input) {
        return SessionCommand::Exit;
    }

    let Some(rest) = input.strip_prefix(':') else {
        return SessionCommand::Search(input.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match (name.to_lowercase().as_str(), arg) {
        ("news", q) if !q.is_empty() => SessionCommand::News(q.to_string()),
        ("suggest", q) if !q.is_empty() => SessionCommand::Suggest(q.to_string()),
        ("intent", q) if !q.is_empty() => SessionCommand::Intent(q.to_string()),
        ("health", _) => SessionCommand::Health,
        ("enhance", _) => SessionCommand::ToggleEnhance,
        ("history", _) => SessionCommand::History,
        ("clear", _) => SessionCommand::Clear,
        ("quit", _) | ("exit", _) => SessionCommand::Exit,
        _ => SessionCommand::Help,
    }
}

pub struct SearchSession {
    client: SearchClient,
    guard: QueryGuard,
    enhance: bool,
    output: OutputFormat,
    history: Vec<String>,
}

impl SearchSession {
    pub fn new(client: SearchClient, output: OutputFormat) -> Self {
        let enhance = client.config().ai_enhancement;
        Self {
            client,
            guard: QueryGuard::new(),
            enhance,
            output,
            history: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        cli::print_header();
        self.show_welcome();

        loop {
            let user_input = match self.get_user_input() {
                Ok(input) => input,
                Err(_) => {
                    println!("\n{}", "Session ended by user".yellow());
                    break;
                }
            };

            match parse_command(&user_input) {
                SessionCommand::Exit => {
                    println!("{}", "Goodbye! 👋".cyan());
                    break;
                }
                SessionCommand::Empty => continue,
                SessionCommand::Help => self.show_help(),
                SessionCommand::Clear => {
                    let _ = Term::stdout().clear_screen();
                }
                SessionCommand::History => self.show_history(),
                SessionCommand::ToggleEnhance => {
                    self.enhance = !self.enhance;
                    println!(
                        "{} Enhancement {}",
                        "✨".cyan(),
                        if self.enhance { "on" } else { "off" }
                    );
                }
                SessionCommand::Health => {
                    let status = self.client.health_status().await;
                    cli::render_health(&status, self.output)?;
                }
                SessionCommand::Intent(query) => {
                    let intent = extract_intent(&query);
                    cli::render_intent(&intent, &suggest_refinements(&query), self.output)?;
                }
                SessionCommand::Suggest(query) => {
                    let suggestions = self.client.get_suggestions(&query).await;
                    cli::render_suggestions(&query, &suggestions, self.output)?;
                }
                SessionCommand::Search(query) => self.process_search(&query, false).await?,
                SessionCommand::News(query) => self.process_search(&query, true).await?,
            }

            println!();
        }

        self.guard.cancel();
        Ok(())
    }

    fn show_welcome(&self) {
        println!("{}", "Search your SearXNG instance from the terminal".cyan().bold());
        println!("Instance: {}", self.client.config().base_url.yellow());
        println!("Enhancer: {}", self.client.enhancer_name().yellow());
        println!();
        println!("{}", "Commands:".blue());
        println!("  {} <query>            search", "•".blue());
        println!("  {} :news <query>      news from the past year", "•".blue());
        println!("  {} :suggest <query>   autocomplete", "•".blue());
        println!("  {} :intent <query>    classify a query", "•".blue());
        println!("  {} :enhance           toggle summaries and key points", "•".blue());
        println!("  {} :health  :history  :clear", "•".blue());
        println!();
        println!("{}", "Ctrl-C cancels a running search".dimmed());
        println!("{}", "Type 'quit' or 'exit' to end the session".dimmed());
        println!();
    }

    fn show_help(&self) {
        println!("{} Unknown command", "⚠".yellow());
        self.show_welcome();
    }

    fn show_history(&self) {
        if self.history.is_empty() {
            println!("{}", "No searches yet".dimmed());
            return;
        }
        for (i, query) in self.history.iter().rev().take(HISTORY_SHOWN).enumerate() {
            println!("  {} {}", format!("{:>2}.", i + 1).dimmed(), query);
        }
    }

    async fn process_search(&mut self, query: &str, news: bool) -> anyhow::Result<()> {
        let start_time = Instant::now();
        self.history.push(query.to_string());
        let token = self.guard.begin();

        match self.run_query(query, news, &token).await {
            Ok(response) if response.results.is_empty() => {
                cli::render_results(&response, self.output)?;
                self.show_refinements(query);
            }
            Ok(response) if self.enhance => {
                let spinner = cli::spinner("Enhancing results...");
                let enhanced = interruptible(
                    &token,
                    self.client.enhance_results(query, &response.results),
                    tokio::signal::ctrl_c(),
                )
                .await;
                spinner.finish_and_clear();

                match enhanced {
                    Some(enhanced) => cli::render_enhanced(&response, &enhanced, self.output)?,
                    None => {
                        println!("{} Enhancement cancelled", "⏹".yellow());
                        cli::render_results(&response, self.output)?;
                    }
                }
            }
            Ok(response) => cli::render_results(&response, self.output)?,
            Err(e) => cli::print_error(&e),
        }

        println!(
            "{} Completed in {:.2}s",
            "⏱".dimmed(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(())
    }

    async fn run_query(
        &self,
        query: &str,
        news: bool,
        token: &CancellationToken,
    ) -> Result<SearchResponse, SearchError> {
        let filters = if news {
            news_filters(&SearchFilters::default())
        } else {
            SearchFilters::default()
        };
        let spinner = cli::spinner(&format!("Searching for \"{}\"...", query));

        let outcome = interruptible(
            token,
            self.client.search_cancellable(query, &filters, token.clone()),
            tokio::signal::ctrl_c(),
        )
        .await
        .unwrap_or_else(|| Err(SearchError::cancelled(query)));

        spinner.finish_and_clear();
        outcome
    }

    fn show_refinements(&self, query: &str) {
        println!("{}", "Try one of these instead:".blue());
        for refinement in suggest_refinements(query).iter().skip(1) {
            println!("  {} {}", "•".blue(), refinement);
        }
    }

    fn get_user_input(&self) -> anyhow::Result<String> {
        cli::print_separator();
        let input: String = Input::new()
            .with_prompt("🔍 Search")
            .allow_empty(true)
            .interact_text()?;
        Ok(input)
    }
}
