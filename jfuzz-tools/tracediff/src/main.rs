//! Trace comparison binary
//!
//! Run with: `jfuzz-tracediff [OPTIONS] [LEFT] [RIGHT]`

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jfuzz_tracediff::{compare_files, CompareOptions};

#[derive(Parser)]
#[command(name = "jfuzz-tracediff")]
#[command(about = "Compare two interpreter execution traces")]
#[command(version)]
struct Cli {
    /// Trace of the interpreter under test
    #[arg(value_name = "LEFT", default_value = "trace_riscv")]
    left: PathBuf,

    /// Reference trace
    #[arg(value_name = "RIGHT", default_value = "trace_zero")]
    right: PathBuf,

    /// Stop at the first mismatching record
    #[arg(short, long)]
    stop_at_first: bool,

    /// Ignore step counts when comparing records
    #[arg(long)]
    ignore_step: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let options = CompareOptions {
        stop_at_first: cli.stop_at_first,
        compare_step: !cli.ignore_step,
    };
    let report = compare_files(&cli.left, &cli.right, &options).with_context(|| {
        format!(
            "Failed to compare {} with {}",
            cli.left.display(),
            cli.right.display()
        )
    })?;

    for divergence in &report.divergences {
        println!("{}", divergence);
    }
    info!(
        "Compared {} records, {} divergences",
        report.compared,
        report.divergences.len()
    );

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
