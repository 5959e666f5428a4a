// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  logkpi — access log KPI summaries
//
//  Input:   newline-delimited JSON access records
//  Output:  one row per (UTC date, endpoint base), CSV or JSONL
//  Logs:    stderr only; stdout carries rows when no output path
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, ValueEnum};
use logkpi_core::config::{KpiConfig, OutputFormat};
use logkpi_core::{KpiError, run_batch};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "logkpi", version, about = "Per-day, per-endpoint KPIs from HTTP access logs")]
struct Cli {
    /// Newline-delimited JSON access log
    #[arg(short, long)]
    input: PathBuf,

    /// Output file. Rows go to stdout when neither this nor `output.path` is set.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (overrides `output.format`)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Path to configuration file
    #[arg(short, long, default_value = "logkpi.yaml")]
    config: PathBuf,

    /// Log level (overrides `log.level`; RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Config ──
    // Loaded before tracing so `log.level` can apply; a config error is
    // reported once the subscriber is up.
    let config = if cli.config.exists() {
        KpiConfig::load(&cli.config)
    } else {
        Ok(KpiConfig::default())
    };

    // ── Tracing ──
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.log.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "Failed to load config");
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Batch failed, no output written");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli, config: &KpiConfig) -> Result<(), KpiError> {
    let format = cli.format.map(OutputFormat::from).unwrap_or(config.output.format);
    let output = cli.output.as_ref().or(config.output.path.as_ref());

    info!(input = %cli.input.display(), ?format, "Computing KPIs");
    let summary = run_batch(&cli.input, &config.reader)?;

    if !summary.malformed_lines.is_empty() {
        warn!(
            skipped = summary.malformed_lines.len(),
            "Malformed lines skipped"
        );
    }

    match output {
        Some(path) => {
            logkpi_report::write_atomic(path, &summary.rows, format)?;
            info!(path = %path.display(), "Summary written");
        }
        None => {
            let stdout = std::io::stdout();
            logkpi_report::write_rows(&mut stdout.lock(), &summary.rows, format)?;
        }
    }

    info!(
        rows = summary.rows.len(),
        records = summary.records_read,
        malformed_lines = summary.malformed_lines.len(),
        "Done"
    );
    Ok(())
}
