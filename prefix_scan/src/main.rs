//! Prefix scan CLI.
//!
//! ```bash
//! # input.txt -> output.txt with the default block size of 256
//! prefix_scan
//!
//! prefix_scan --input data.txt --output sums.txt --block-size 128 --backend cpu
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use prefix_scan::{io, Backend, ScanConfig, Scanner};

/// Exclusive prefix sum of a sequence of floats
#[derive(Parser, Debug)]
#[command(name = "prefix_scan")]
#[command(version)]
struct Cli {
    /// Input file: element count followed by the values
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    /// Output file
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// YAML scan configuration; explicit flags take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Elements per chunk (power of two)
    #[arg(short, long)]
    block_size: Option<usize>,

    /// Execution backend: auto, gpu or cpu
    #[arg(long)]
    backend: Option<Backend>,

    /// Base log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level, cli.log_dir.as_deref());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(block_size) = cli.block_size {
        config.block_size = block_size;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let values = io::read_sequence(BufReader::new(input))
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let mut scanner = Scanner::new(config).context("failed to initialize scanner")?;
    tracing::info!(
        "Scanning {} values on {} with block size {}",
        values.len(),
        scanner.backend(),
        scanner.block_size()
    );

    let start = Instant::now();
    let (sums, stats) = scanner.scan_with_stats(&values)?;
    tracing::info!(
        "Scan finished in {:.2?} ({} levels)",
        start.elapsed(),
        stats.depth()
    );

    let output = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    io::write_sequence(BufWriter::new(output), &sums)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    Ok(())
}
