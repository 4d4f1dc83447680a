//! jfuzz Binary
//!
//! Run with: `jfuzz generate [OPTIONS]`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use jfuzz::tokens::delimiter_balance;
use jfuzz::{generate_program, write_program, GenConfig};

#[derive(Parser)]
#[command(name = "jfuzz")]
#[command(about = "Random Java program generator for differential interpreter fuzzing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Java programs
    Generate(GenerateArgs),
    /// Check files for unbalanced delimiters
    Check {
        /// Files to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the default configuration
    Config,
}

#[derive(Args)]
struct GenerateArgs {
    /// Random seed (drawn at random when omitted)
    #[arg(short, long, env = "JFUZZ_SEED")]
    seed: Option<u64>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Fully-qualified class name
    #[arg(long)]
    class: Option<String>,

    /// Generated function name
    #[arg(long)]
    function: Option<String>,

    /// Configuration file path (TOML, or JSON by extension)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Number of programs to generate
    #[arg(short = 'n', long, default_value = "1")]
    count: u64,

    /// Print programs to stdout instead of writing files
    #[arg(long)]
    stdout: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Generate(args) => generate(args),
        Commands::Check { files } => check(files),
        Commands::Config => {
            print!("{}", GenConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn build_config(args: &GenerateArgs) -> Result<GenConfig> {
    let mut config = if let Some(config_path) = &args.config {
        GenConfig::from_path(config_path)
            .with_context(|| format!("Failed to load config file: {}", config_path.display()))?
    } else {
        GenConfig::default()
    };

    // Override with CLI options
    if let Some(class) = &args.class {
        config.class_name = class.clone();
    }
    if let Some(function) = &args.function {
        config.function_name = Some(function.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let config = build_config(args)?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!("Using seed {}", seed);

    for i in 0..args.count {
        let mut unit_config = config.clone();
        if args.count > 1 {
            let name = config.qualified_name()?.with_class_suffix(format!("_{i}"));
            unit_config.class_name = name.to_string();
        }
        let unit_seed = seed.wrapping_add(i);
        debug!("Generating {} with seed {}", unit_config.class_name, unit_seed);

        let program = generate_program(&unit_config, unit_seed)
            .with_context(|| format!("Failed to generate program with seed {unit_seed}"))?;

        if args.stdout {
            print!("{}", program.source);
        } else {
            let path = write_program(&args.out_dir, &program).with_context(|| {
                format!("Failed to write program to {}", args.out_dir.display())
            })?;
            info!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn check(files: &[PathBuf]) -> Result<()> {
    let mut failures = 0;
    for path in files {
        match check_file(path) {
            Ok(true) => debug!("{}: balanced", path.display()),
            Ok(false) => failures += 1,
            Err(e) => {
                error!("Error checking {}: {:#}", path.display(), e);
                failures += 1;
            }
        }
    }

    info!("Checked {} files, {} failed", files.len(), failures);
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_file(path: &Path) -> Result<bool> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let balance = delimiter_balance(&source);
    if !balance.is_balanced() {
        println!("{}: {}", path.display(), balance);
        return Ok(false);
    }
    Ok(true)
}
