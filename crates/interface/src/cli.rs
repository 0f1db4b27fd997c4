//! CLI - Command Line Interface
//!
//! Available Commands:
//! - bops replay [FILE]  - Replay a captured SSE stream into a transcript
//! - bops config         - Print the effective assembler configuration
//!
//! `replay` reads stdin when FILE is omitted or `-`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

use bops_core::{AssemblerConfig, FrameReader, StatusEvent};
use bops_transcript::{
    AssemblerStats, RunOutcome, TranscriptAssembler, TranscriptEntry, render_plain_text,
};

/// CLI Errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Input error: {0}")]
    InputError(String),

    #[error("Output error: {0}")]
    OutputError(String),
}

/// CLI Configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Assembler config file
    pub config_path: Option<PathBuf>,

    /// Verbose output
    pub verbose: bool,

    /// Output format
    pub output_format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            verbose: false,
            output_format: OutputFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Minimal,
}

/// BOPS CLI
#[derive(Parser, Debug)]
#[command(name = "bops")]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Assembler config file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Replay a captured event stream and print the transcript
    Replay(ReplayArgs),

    /// Print the effective assembler configuration
    Config,
}

#[derive(Args, Debug)]
pub(crate) struct ReplayArgs {
    /// Stream capture; stdin when omitted or `-`
    pub file: Option<PathBuf>,
}

/// Machine-readable replay report.
#[derive(Debug, Serialize)]
pub(crate) struct ReplayReport<'a> {
    pub session_id: Ulid,
    pub entries: &'a [TranscriptEntry],
    pub outcome: Option<&'a RunOutcome>,
    pub last_status: Option<&'a StatusEvent>,
    pub saw_stream_running: bool,
    pub saw_stream_finish: bool,
    pub stats: AssemblerStats,
}

impl<'a> ReplayReport<'a> {
    pub(crate) fn new(asm: &'a TranscriptAssembler) -> Self {
        Self {
            session_id: asm.session_id(),
            entries: asm.entries(),
            outcome: asm.outcome(),
            last_status: asm.last_status(),
            saw_stream_running: asm.saw_stream_running(),
            saw_stream_finish: asm.saw_stream_finish(),
            stats: asm.stats(),
        }
    }
}

/// Parse CLI arguments and execute commands
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = CliConfig {
        config_path: cli.config,
        verbose: cli.verbose,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
    };

    if config.verbose {
        // A subscriber may already be installed.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .try_init();
    }

    match cli.command {
        Commands::Replay(args) => cmd_replay(args, &config).await,
        Commands::Config => cmd_config(&config),
    }
}

async fn cmd_replay(args: ReplayArgs, config: &CliConfig) -> Result<(), CliError> {
    let assembler_config = load_assembler_config(config)?;

    let asm = match args.file.as_deref() {
        Some(path) if path != Path::new("-") => {
            info!("Replaying stream from {}", path.display());
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| CliError::InputError(format!("{}: {e}", path.display())))?;
            replay_stream(BufReader::new(file), assembler_config).await?
        }
        _ => {
            info!("Replaying stream from stdin");
            replay_stream(BufReader::new(tokio::io::stdin()), assembler_config).await?
        }
    };

    println!("{}", format_report(&asm, config.output_format)?);
    Ok(())
}

fn cmd_config(config: &CliConfig) -> Result<(), CliError> {
    let assembler_config = load_assembler_config(config)?;
    let rendered = match config.output_format {
        OutputFormat::Json => serde_json::to_string_pretty(&assembler_config)
            .map_err(|e| CliError::OutputError(e.to_string()))?,
        OutputFormat::Pretty | OutputFormat::Minimal => {
            serde_yaml::to_string(&assembler_config)
                .map_err(|e| CliError::OutputError(e.to_string()))?
        }
    };
    print!("{rendered}");
    Ok(())
}

pub(crate) fn load_assembler_config(config: &CliConfig) -> Result<AssemblerConfig, CliError> {
    AssemblerConfig::load(config.config_path.as_deref())
        .map_err(|e| CliError::ConfigError(e.to_string()))
}

/// Feed every frame from `reader` into a fresh assembler.
pub(crate) async fn replay_stream<R>(
    reader: R,
    config: AssemblerConfig,
) -> Result<TranscriptAssembler, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let mut frames = FrameReader::new(reader);
    let mut asm = TranscriptAssembler::new(config);
    let session = asm.session_id();
    while let Some(frame) = frames.next_frame().await.map_err(|e| {
        warn!(%session, error = %e, "stream read failed");
        CliError::InputError(e.to_string())
    })? {
        let outcome = asm.push_frame(&frame);
        debug!(%session, ?outcome, "frame processed");
    }
    let stats = asm.stats();
    info!(
        %session,
        entries = asm.entries().len(),
        applied = stats.applied,
        ignored = stats.ignored,
        dropped = stats.dropped,
        "replay complete"
    );
    Ok(asm)
}

pub(crate) fn format_report(
    asm: &TranscriptAssembler,
    format: OutputFormat,
) -> Result<String, CliError> {
    let stats = asm.stats();
    match format {
        OutputFormat::Pretty => {
            let mut out = render_plain_text(asm.entries());
            if let Some(outcome) = asm.outcome().filter(|o| !o.summary.is_empty()) {
                out.push_str(&format!("\nResult: {}\n", outcome.summary));
            }
            out.push_str(&format!(
                "\n{} entries ({} applied, {} ignored, {} dropped)",
                asm.entries().len(),
                stats.applied,
                stats.ignored,
                stats.dropped
            ));
            Ok(out)
        }
        OutputFormat::Json => serde_json::to_string_pretty(&ReplayReport::new(asm))
            .map_err(|e| CliError::OutputError(e.to_string())),
        OutputFormat::Minimal => Ok(format!(
            "entries={} applied={} ignored={} dropped={}",
            asm.entries().len(),
            stats.applied,
            stats.ignored,
            stats.dropped
        )),
    }
}
