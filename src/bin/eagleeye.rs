//! CLI binary for EagleEye.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use eagleeye::{App, ParsedQuery, Settings};
use eagleeye_search::{
    NormalizedResult, ProgressStatus, SearchProgress, SourceKind, SourceRegistry, progress_channel,
};

/// EagleEye: search Slack, Notion, Linear and GitHub at once.
#[derive(Parser)]
#[command(name = "eagleeye", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, global = true)]
    debug: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search every relevant source and list the hits.
    ///
    /// Prefix words with --slack, --notion, --linear or --github to limit
    /// the sources, e.g. `eagleeye search --limit 5 --linear login bug`.
    Search {
        /// Results per source.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,

        /// Query text, optionally with source flags.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Ask the agent and print its answer.
    Ask {
        /// Question text.
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// List the active sources.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.debug {
        settings.logging.debug = true;
    }
    let _log_guard = eagleeye::logging::init(&settings.logging)?;

    match cli.command {
        Command::Sources => {
            list_sources(&settings);
            Ok(ExitCode::SUCCESS)
        }
        Command::Search { limit, json, query } => run_search(settings, &query.join(" "), limit, json).await,
        Command::Ask { query } => run_ask(settings, &query.join(" ")).await,
    }
}

fn list_sources(settings: &Settings) {
    let registry = SourceRegistry::from_config(&settings.sources);
    if registry.configured_kinds().is_empty() {
        println!("No sources configured.");
        return;
    }
    for descriptor in registry.descriptors() {
        println!(
            "{:<8} search tool: {}  server: {} {}",
            descriptor.kind.name(),
            descriptor.search_tool,
            descriptor.command,
            descriptor.args.join(" ")
        );
    }
}

async fn run_search(settings: Settings, input: &str, limit: Option<usize>, json: bool) -> anyhow::Result<ExitCode> {
    let query = ParsedQuery::parse(input);
    if query.is_empty() {
        anyhow::bail!("query must not be empty");
    }

    let app = App::start(settings, tokio::runtime::Handle::current()).await?;
    let results = app.search(&query, limit).await;
    app.shutdown().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_grouped(&results);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_grouped(results: &[NormalizedResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    let mut groups: BTreeMap<SourceKind, Vec<&NormalizedResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.source()).or_default().push(result);
    }
    for (kind, items) in groups {
        println!("{} ({})", kind.label(), items.len());
        for item in items {
            println!("  • {}", item.title());
            if !item.url().is_empty() {
                println!("    {}", item.url());
            }
            if !item.snippet().is_empty() {
                println!("    {}", item.snippet());
            }
            let meta: Vec<&str> = [item.author(), item.timestamp()].into_iter().flatten().collect();
            if !meta.is_empty() {
                println!("    {}", meta.join(" · "));
            }
        }
        println!();
    }
}

async fn run_ask(settings: Settings, input: &str) -> anyhow::Result<ExitCode> {
    if input.trim().is_empty() {
        anyhow::bail!("query must not be empty");
    }
    let buffer = settings.agent.progress_buffer;
    let app = App::start(settings, tokio::runtime::Handle::current()).await?;

    let (sink, mut rx) = progress_channel(buffer);
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            eprintln!("{}", describe(&update));
        }
    });

    let answer = app.ask(input.trim(), Some(&sink)).await;
    drop(sink);
    let _ = printer.await;
    app.shutdown().await;

    match answer {
        Ok(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn describe(update: &SearchProgress) -> String {
    let done: Vec<&str> = update.completed_tools.iter().map(|k| k.label()).collect();
    match update.status {
        ProgressStatus::Thinking => "… thinking".to_owned(),
        ProgressStatus::Searching => {
            let current = update.current_tool.map_or("source", |k| k.label());
            if done.is_empty() {
                format!("… searching {current}")
            } else {
                format!("… searching {current} (done: {})", done.join(", "))
            }
        }
        ProgressStatus::Consolidating => format!("… writing answer from {}", done.join(", ")),
    }
}
