//! Feedbackq - ask questions about customer-feedback data
//!
//! A CLI tool that loads cleaned feedback records and answers natural
//! language questions about them with a chart, a local LLM, or a
//! deterministic report built straight from the data.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable records, bad config, blank question, etc.)
//!   130 - Interrupted while waiting for an answer

mod analysis;
mod chart;
mod cli;
mod config;
mod delegate;
mod models;
mod orchestrator;
mod report;
mod store;

use analysis::AggregateOptions;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use delegate::DelegateChain;
use indicatif::{ProgressBar, ProgressStyle};
use models::QueryAnswer;
use orchestrator::{Plan, QueryEngine};
use report::Narrator;
use std::path::Path;
use std::time::Duration;
use store::RecordStore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const INTERRUPTED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("Feedbackq v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_query(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Query failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .feedbackq.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change delegate endpoints, models, and report sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so answers on stdout can be piped.
fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Answer the question from the command line. Returns the exit code.
async fn run_query(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let records_path = args
        .records
        .as_deref()
        .context("--records is required")?;
    let question = args.question.as_deref().context("--question is required")?;

    let store = RecordStore::new();
    store.replace(store::load_records(records_path)?);

    let delegates =
        DelegateChain::from_config(&config.delegates).context("Failed to set up delegates")?;
    if delegates.is_empty() {
        info!("No delegates configured, answering from the local report");
    } else {
        debug!("Delegate order: {}", delegates.names().join(" -> "));
    }

    let engine = QueryEngine::new(
        store,
        delegates,
        AggregateOptions::from(&config.analysis),
        Narrator::new(config.analysis.top_words, config.analysis.top_issues),
    );

    if args.dry_run {
        return handle_dry_run(&engine, question);
    }

    let spinner = if config.general.format == OutputFormat::Text && !args.quiet {
        Some(make_spinner()?)
    } else {
        None
    };

    let outcome = tokio::select! {
        answer = engine.answer_question(question) => Some(answer),
        _ = tokio::signal::ctrl_c() => None,
    };

    if let Some(ref pb) = spinner {
        pb.finish_and_clear();
    }

    let answer = match outcome {
        Some(answer) => answer?,
        None => {
            warn!("Interrupted, abandoning the question");
            return Ok(INTERRUPTED_EXIT_CODE);
        }
    };

    info!("Answered by {}", answer.source);
    print_answer(&answer, config.general.format)?;

    Ok(0)
}

fn make_spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message("Analyzing feedback...");
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn print_answer(answer: &QueryAnswer, format: OutputFormat) -> Result<()> {
    let output = match format {
        OutputFormat::Json => report::render_json(answer)?,
        OutputFormat::Text => report::render_text(answer),
    };
    println!("{}", output);
    Ok(())
}

/// Handle --dry-run: show what the question resolves to, call nothing.
fn handle_dry_run(engine: &QueryEngine, question: &str) -> Result<i32> {
    println!("\n🔍 Dry run: resolving question (no LLM call)...\n");

    match engine.plan(question)? {
        Plan::NoData => {
            println!("   No records loaded. The no-data answer would be returned.");
        }
        Plan::Chart { spec, records_used } => {
            println!("   Chart request over {} records:\n", records_used);
            println!("{}", report::render::render_chart_text(&spec));
        }
        Plan::Delegate {
            context,
            records_used,
            ..
        } => {
            println!(
                "   Context that would be sent to the delegates ({} records):\n",
                records_used
            );
            println!("{}", context);
        }
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
