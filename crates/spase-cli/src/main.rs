//! # spase-cli
//!
//! Command-line interface for the SPASE schema tools: emit graph and JSON
//! schemas from a model, validate records, and repair them.

mod config;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use spase_doc::Record;
use spase_emit::{schema_for_class, GraphSchema};
use spase_model::{ModelLoader, SpaseModel};
use spase_pipeline::{RepairOutcome, RepairPipeline};
use spase_validation::{ValidationEngine, ValidationReport, ValidationReporter};

use crate::config::CliConfig;

#[derive(Parser)]
#[command(name = "spase")]
#[command(about = "SPASE schema translation, validation and repair")]
#[command(version)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the graph-database schema for a model
    GraphSchema {
        /// Model file, or a version resolved through `model_paths`
        model: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Emit the JSON Schema for one class of a model
    JsonSchema {
        /// Model file, or a version resolved through `model_paths`
        model: String,

        /// Class to emit, e.g. DisplayData
        #[arg(long)]
        class: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a record; exits with 1 if it has issues
    Validate {
        /// Record file, bare or wrapped in a Spase envelope
        record: PathBuf,

        #[arg(short, long)]
        model: String,

        /// Record class (default: taken from the envelope)
        #[arg(long)]
        class: Option<String>,

        /// Write the issues as a CSV table
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Repair a record; exits with 1 if it cannot be made valid
    Repair {
        /// Record file, bare or wrapped in a Spase envelope
        record: PathBuf,

        #[arg(short, long)]
        model: String,

        /// Record class (default: taken from the envelope)
        #[arg(long)]
        class: Option<String>,

        /// Where to write the repaired record body (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override `repair.max_iterations`
        #[arg(long)]
        max_iterations: Option<usize>,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::GraphSchema { model, output } => {
            let graph = graph_schema(&config, &model)?;
            info!(entries = graph.len(), "Emitted graph schema");
            write_json(output.as_deref(), &graph.to_json())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::JsonSchema {
            model,
            class,
            output,
        } => {
            let schema = json_schema(&config, &model, &class)?;
            write_json(output.as_deref(), &schema)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            record,
            model,
            class,
            report,
        } => {
            let (record, class) = read_record(&record, class.as_deref())?;
            let engine = ValidationEngine::new(&json_schema(&config, &model, &class)?)?;
            let source = record.metadata.source.clone().unwrap_or_default();
            let result = ValidationReport::new(class, source, engine.validate(&record.body));

            print!("{}", result.render_text());
            if let Some(path) = report {
                let file = fs::File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                ValidationReporter::new().write_csv(file, std::slice::from_ref(&result))?;
                info!(path = %path.display(), "Wrote error table");
            }

            Ok(if result.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Repair {
            record,
            model,
            class,
            output,
            max_iterations,
        } => {
            let (record, class) = read_record(&record, class.as_deref())?;
            let mut repair_config = config.repair.clone();
            if let Some(max) = max_iterations {
                repair_config.max_iterations = max;
            }
            let pipeline = RepairPipeline::from_schema(&json_schema(&config, &model, &class)?)?
                .with_config(repair_config);

            let run = pipeline.run(record.body)?;
            match &run.outcome {
                RepairOutcome::Valid => {
                    for (rule, count) in &run.rule_counts {
                        eprintln!("{rule}: {count}");
                    }
                    write_json(output.as_deref(), &run.document)?;
                    Ok(ExitCode::SUCCESS)
                }
                outcome => {
                    let source = record.metadata.source.unwrap_or_default();
                    let report = ValidationReport::new(class, source, outcome.remaining().to_vec());
                    print!("{}", report.render_text());
                    if matches!(outcome, RepairOutcome::IterationLimit { .. }) {
                        eprintln!("Stopped after {} repair passes", run.iterations);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// Treat `model` as a file if it exists, otherwise as a version number
fn load_model(config: &CliConfig, model: &str) -> anyhow::Result<SpaseModel> {
    let mut loader = ModelLoader::new(config.model_paths.clone());
    let path = Path::new(model);
    if path.is_file() {
        loader
            .load_from_file(path)
            .with_context(|| format!("Failed to load model {}", path.display()))
    } else {
        loader
            .load(model)
            .with_context(|| format!("Failed to load model version {model}"))
    }
}

fn graph_schema(config: &CliConfig, model: &str) -> anyhow::Result<GraphSchema> {
    let model = load_model(config, model)?;
    Ok(GraphSchema::from_model(&model, config.context.clone())?)
}

fn json_schema(config: &CliConfig, model: &str, class: &str) -> anyhow::Result<Value> {
    let graph = graph_schema(config, model)?;
    schema_for_class(&graph, class).with_context(|| format!("Cannot build schema for {class}"))
}

/// Read a record file and settle its class
fn read_record(path: &Path, class: Option<&str>) -> anyhow::Result<(Record, String)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    let record = Record::from_envelope(value, class)?.with_source(path.display().to_string());
    let class = record
        .resource_type()
        .context("Record class is unknown; pass --class")?
        .to_string();
    Ok((record, class))
}

fn write_json(path: Option<&Path>, value: &Value) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
            Ok(())
        }
    }
}
