use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use searxng_assistant::cli::{self, Cli, Command, OutputFormat, SearchArgs};
use searxng_assistant::session::SearchSession;
use searxng_assistant::{extract_intent, suggest_refinements, ClientConfig, SearchClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let mut config = ClientConfig::from_env().context("failed to load configuration")?;
    args.apply_overrides(&mut config);
    log::debug!("configuration: {:?}", config);

    let client = SearchClient::new(config).context("invalid configuration")?;
    let output = args.output;

    match args.command.unwrap_or(Command::Interactive) {
        Command::Search(search) => run_search(&client, &search, false, output).await,
        Command::News(search) => run_search(&client, &search, true, output).await,
        Command::Suggest { query } => {
            let query = cli::join_query(&query);
            let spinner = cli::spinner("Fetching suggestions...");
            let suggestions = client.get_suggestions(&query).await;
            spinner.finish_and_clear();
            cli::render_suggestions(&query, &suggestions, output)
        }
        Command::Intent { query } => {
            let query = cli::join_query(&query);
            cli::render_intent(&extract_intent(&query), &suggest_refinements(&query), output)
        }
        Command::Health => {
            let status = client.health_status().await;
            cli::render_health(&status, output)?;
            if !status.is_healthy() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Interactive => SearchSession::new(client, output).run().await,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();
}

async fn run_search(
    client: &SearchClient,
    search: &SearchArgs,
    news: bool,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let query = search.query();
    if query.is_empty() {
        anyhow::bail!("query must not be empty");
    }
    let filters = search.filters()?;

    let spinner = cli::spinner(&format!("Searching for \"{}\"...", query));
    let outcome = if news {
        client.search_news(&query, &filters).await
    } else {
        client.search(&query, &filters).await
    };

    let response = match outcome {
        Ok(response) => {
            spinner.finish_and_clear();
            response
        }
        Err(e) => {
            spinner.finish_with_message("✗ Search failed".red().to_string());
            cli::print_error(&e);
            std::process::exit(1);
        }
    };

    let enhance = search.enhance || client.config().ai_enhancement;
    if enhance && !response.results.is_empty() {
        let spinner = cli::spinner("Enhancing results...");
        let enhanced = client.enhance_results(&query, &response.results).await;
        spinner.finish_and_clear();
        cli::render_enhanced(&response, &enhanced, output)
    } else {
        cli::render_results(&response, output)
    }
}
