//! CLI entry point for the data quality monitor.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use dq_monitor::reporting::{render_dashboard, render_empty};
use dq_monitor::{
    DataSource, MonitorConfig, MonitorError, Pipeline, PipelineBuilder, PipelineStage, RunOutcome,
};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

/// CLI-compatible source selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliSource {
    /// A MySQL table
    Mysql,
    /// A CSV object in S3
    S3,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LLM-assisted data quality dashboard",
    long_about = "Loads a MySQL table or an S3 CSV object, runs data-quality checks and \
                  summarizes the findings with a language model.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  DQ_MYSQL_HOST         MySQL host (required)\n  \
                  DQ_MYSQL_PORT         MySQL port (default 3306)\n  \
                  DQ_MYSQL_DB_NAME      MySQL database (required)\n  \
                  DQ_AWS_SECRET_NAME    Secrets Manager id holding {username, password} (required)\n  \
                  DQ_AWS_REGION         AWS region (default us-east-1)\n  \
                  AWS_ACCESS_KEY_ID     Static AWS key id (optional, with the secret key)\n  \
                  AWS_SECRET_ACCESS_KEY Static AWS secret key (optional)\n  \
                  OPENAI_API_KEY        API key for the summary model (required)\n  \
                  DQ_OPENAI_MODEL       Model override (default gpt-4o-mini)\n  \
                  DQ_OPENAI_BASE_URL    Chat-completions endpoint override\n\n\
                  EXAMPLES:\n  \
                  dq-monitor --source mysql --table orders\n  \
                  dq-monitor --source s3 --bucket lake --key daily/orders.csv --json\n  \
                  dq-monitor --interactive"
)]
struct Args {
    /// Data source to analyze
    #[arg(short, long, value_enum, required_unless_present = "interactive")]
    source: Option<CliSource>,

    /// MySQL table name (with --source mysql)
    #[arg(short, long, required_if_eq("source", "mysql"))]
    table: Option<String>,

    /// S3 bucket (with --source s3)
    #[arg(short, long, required_if_eq("source", "s3"))]
    bucket: Option<String>,

    /// S3 object key (with --source s3)
    #[arg(short, long, required_if_eq("source", "s3"))]
    key: Option<String>,

    /// Prompt for sources repeatedly instead of running once
    #[arg(short, long, conflicts_with = "json")]
    interactive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the text dashboard
    ///
    /// Disables all progress logs; only outputs the final JSON document.
    #[arg(long)]
    json: bool,
}

impl Args {
    /// The source selected on the command line, if complete.
    fn data_source(&self) -> Option<DataSource> {
        match self.source? {
            CliSource::Mysql => self.table.clone().map(DataSource::table),
            CliSource::S3 => match (&self.bucket, &self.key) {
                (Some(bucket), Some(key)) => Some(DataSource::object(bucket, key)),
                _ => None,
            },
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dotenv().ok();
    init_logging(&args.log_level, args.quiet, args.json);

    // Settings are validated before any run is attempted.
    let config = match MonitorConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            let err = MonitorError::from(e);
            if args.json {
                print_json_error(&err)?;
                std::process::exit(1);
            }
            return Err(anyhow!(err));
        }
    };
    debug!("Loaded configuration: {:?}", config);

    let pipeline = build_pipeline(&args, config).await?;

    if args.interactive {
        return run_interactive(&pipeline).await;
    }

    let source = args
        .data_source()
        .ok_or_else(|| anyhow!("A complete source selection is required"))?;

    match pipeline.run(&source).await {
        Ok(outcome) => print_outcome(&outcome, args.json),
        Err(e) => {
            if args.json {
                print_json_error(&e)?;
                std::process::exit(1);
            }
            Err(anyhow!(e))
        }
    }
}

async fn build_pipeline(args: &Args, config: Arc<MonitorConfig>) -> Result<Pipeline> {
    let mut builder = PipelineBuilder::from_config(config).await?;

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            if !update.stage.is_terminal() {
                eprintln!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
            } else if update.stage == PipelineStage::Failed {
                eprintln!("[fail] {}", update.stage.display_name());
            }
        });
    }

    Ok(builder.build()?)
}

/// Print a run result.
///
/// Note: this uses `println!` intentionally; the dashboard is the primary
/// output and must be visible regardless of log level.
fn print_outcome(outcome: &RunOutcome, json: bool) -> Result<()> {
    match outcome {
        RunOutcome::Empty {
            source,
            column_count,
        } => {
            if json {
                let doc = serde_json::json!({
                    "status": "empty",
                    "source": source,
                    "column_count": column_count,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}", render_empty(source, *column_count));
            }
        }
        RunOutcome::Completed(run) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&run.to_json())?);
            } else {
                println!("{}", render_dashboard(run));
            }
        }
    }
    Ok(())
}

fn print_json_error(err: &MonitorError) -> Result<()> {
    let doc = serde_json::json!({ "status": "error", "error": err });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn prompt(message: &str) -> Result<()> {
    print!("{}", message);
    std::io::stdout().flush()?;
    Ok(())
}

/// Read one trimmed line; `None` on end of input.
async fn read_answer(lines: &mut Lines<BufReader<Stdin>>, message: &str) -> Result<Option<String>> {
    prompt(message)?;
    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

/// Ask for a source until a complete selection is given.
///
/// Returns `None` when the user quits or input ends.
async fn ask_source(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<DataSource>> {
    loop {
        let Some(choice) = read_answer(lines, "\nSelect data source [mysql/s3] (q to quit): ").await?
        else {
            return Ok(None);
        };

        let source = match CliSource::from_str(&choice, true) {
            Ok(CliSource::Mysql) => {
                let Some(table) = read_answer(lines, "Enter MySQL table name: ").await? else {
                    return Ok(None);
                };
                (!table.is_empty()).then(|| DataSource::table(table))
            }
            Ok(CliSource::S3) => {
                let Some(bucket) = read_answer(lines, "Enter S3 bucket name: ").await? else {
                    return Ok(None);
                };
                let Some(key) = read_answer(lines, "Enter S3 file key (CSV): ").await? else {
                    return Ok(None);
                };
                (!bucket.is_empty() && !key.is_empty()).then(|| DataSource::object(bucket, key))
            }
            Err(_) if matches!(choice.as_str(), "q" | "quit" | "exit") => return Ok(None),
            Err(_) => {
                println!("Unknown source '{}'. Choose mysql or s3.", choice);
                continue;
            }
        };

        match source {
            Some(source) => return Ok(Some(source)),
            None => println!("All fields are required for this source."),
        }
    }
}

/// Prompt loop: each run's failure is reported and the loop continues.
async fn run_interactive(pipeline: &Pipeline) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "=".repeat(80));
    println!("LLM DATA QUALITY MONITOR");
    println!("{}", "=".repeat(80));

    while let Some(source) = ask_source(&mut lines).await? {
        match pipeline.run(&source).await {
            Ok(outcome) => print_outcome(&outcome, false)?,
            Err(e) => println!("Error [{}]: {}", e.error_code(), e),
        }
    }

    info!(
        "Session ended ({} cached summaries)",
        pipeline.summarizer().cache().len()
    );
    Ok(())
}
