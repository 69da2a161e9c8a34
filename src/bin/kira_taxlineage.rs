use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_taxlineage::app::{App, ProgressSink};
use kira_taxlineage::config::{ConfigLoader, ConfigOverrides};
use kira_taxlineage::datasets::DatasetsCli;
use kira_taxlineage::error::TaxError;
use kira_taxlineage::output::{ConsoleOutput, JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "kira-taxlineage")]
#[command(about = "Fetch taxonomy lineage for the TaxIDs of a TSV file")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "Input TSV file containing a \"TaxID\" column")]
    input: Utf8PathBuf,

    #[arg(long, help = "Output TSV file to save taxonomy information")]
    output: Utf8PathBuf,

    #[arg(long)]
    config: Option<String>,

    #[arg(long, help = "Lookup attempts per TaxID (default 3)")]
    max_retries: Option<u32>,

    #[arg(long, help = "Seconds to wait between retry rounds (default 2)")]
    delay_secs: Option<f64>,

    #[arg(long, help = "Path to the NCBI datasets executable")]
    datasets_bin: Option<String>,

    #[arg(long, help = "Print a JSON run summary instead of progress lines")]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TaxError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TaxError) -> u8 {
    match error {
        TaxError::InputNotFound(_)
        | TaxError::InputEmpty(_)
        | TaxError::InputRead { .. }
        | TaxError::MissingTaxIdColumn
        | TaxError::NoTaxIds => 2,
        TaxError::MissingTool(_) => 3,
        _ => 1,
    }
}

/// Per-TaxID lookup failures are logged at warn, so they show without RUST_LOG.
const DEFAULT_LOG_FILTER: &str = "warn";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Console
    };

    let resolved = ConfigLoader::resolve(
        cli.config.as_deref(),
        ConfigOverrides {
            max_retries: cli.max_retries,
            delay_secs: cli.delay_secs,
            datasets_bin: cli.datasets_bin,
        },
    )?;
    let tool = DatasetsCli::resolve(&resolved.datasets_bin)?;
    let app = App::new(tool, resolved.policy);

    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Console => &ConsoleOutput,
        OutputMode::Json => &JsonOutput,
    };
    let summary = app.run(&cli.input, &cli.output, sink)?;

    if matches!(output_mode, OutputMode::Json) {
        JsonOutput::print_summary(&summary).into_diagnostic()?;
    } else if !summary.exhausted.is_empty() {
        eprintln!(
            "{} TaxIDs could not be resolved: {}",
            summary.exhausted.len(),
            summary.exhausted.join(", ")
        );
    }
    Ok(())
}
