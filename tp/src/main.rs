//! ToDo Prioritizer
//!
//! CLI entry point: run the HTTP API or analyze a task list from the terminal.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use prioritizer::cli::{Cli, Command, OutputFormat, get_log_path};
use prioritizer::config::Config;
use prioritizer::domain::{AnalysisResult, Priority};
use prioritizer::server::run_server;
use prioritizer::{Analyzer, splitter};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "Loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { listen } => {
            debug!(?listen, "main: matched Serve command");
            cmd_serve(&config, listen).await
        }
        Command::Analyze { text, file, format } => {
            debug!(?file, %format, "main: matched Analyze command");
            cmd_analyze(&config, text, file, format).await
        }
        Command::Split { text, file } => {
            debug!(?file, "main: matched Split command");
            cmd_split(text, file)
        }
    }
}

/// Resolve task text from the argument, a file, or stdin
fn read_input(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    debug!(has_text = text.is_some(), ?file, "read_input: called");
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path).context(format!("Failed to read {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read tasks from stdin")?;
    Ok(buf)
}

fn build_analyzer(config: &Config) -> Result<Arc<Analyzer>> {
    config.validate()?;
    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let analyzer = Analyzer::from_config(config, root)?;
    Ok(Arc::new(analyzer))
}

/// Run the HTTP API
async fn cmd_serve(config: &Config, listen: Option<std::net::SocketAddr>) -> Result<()> {
    debug!("cmd_serve: called");
    let analyzer = build_analyzer(config)?;
    let listen = listen.unwrap_or(config.server.listen);
    println!("{} http://{}", "Starting ToDo Prioritizer API on".green(), listen);
    run_server(config, analyzer, listen).await
}

/// Analyze once and print the result
async fn cmd_analyze(
    config: &Config,
    text: Option<String>,
    file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    debug!(%format, "cmd_analyze: called");
    let input = read_input(text, file)?;
    let analyzer = build_analyzer(config)?;
    let result = analyzer.analyze(&input).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result).context("Failed to serialize result")?);
        }
        OutputFormat::Text => print_analysis(&result),
    }
    Ok(())
}

/// Print parsed tasks without contacting the reasoning engine
fn cmd_split(text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    debug!("cmd_split: called");
    let input = read_input(text, file)?;
    let tasks = splitter::split(&input);
    if tasks.is_empty() {
        eprintln!("{}", "No tasks found".yellow());
        return Ok(());
    }
    for (i, task) in tasks.iter().enumerate() {
        println!("{}. {}", i + 1, task);
    }
    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    let next = &result.next_action;
    println!("{}", "Next action".bold().green());
    println!("  {} {} ({} min)", "→".green(), next.step.bold(), next.minutes);
    println!("    for: {}", next.task.dimmed());

    for priority in Priority::ALL {
        let tasks = result.priorities.bucket(priority);
        if tasks.is_empty() {
            continue;
        }
        let heading = priority.to_string().to_uppercase();
        let heading = match priority {
            Priority::Must => heading.red().bold(),
            Priority::Should => heading.yellow().bold(),
            Priority::Optional => heading.blue().bold(),
        };
        println!();
        println!("{}", heading);
        for task in tasks {
            let Some(breakdown) = result.breakdown.get(task) else {
                continue;
            };
            println!("  {} {}", task.bold(), format!("~{} min", breakdown.total_minutes()).dimmed());
            for (i, step) in breakdown.steps.iter().enumerate() {
                println!("    {}. {} ({} min)", i + 1, step.description, step.minutes);
            }
        }
    }
}
