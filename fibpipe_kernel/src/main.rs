//! fibpipe: command-line harness for the kernel.
//!
//! Values go to stdout; diagnostics go to stderr, filtered by `RUST_LOG`
//! (default `warn`).

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fibpipe_kernel::arithmetic::parse_integer;
use fibpipe_kernel::config::{Overrides, RunConfig, DEFAULT_COUNT};
use fibpipe_kernel::driver::Driver;
use fibpipe_kernel::hashing::canonical_hash;
use fibpipe_kernel::sink::{MemorySink, WriterSink};
use fibpipe_kernel::stages::build_pipeline;

#[derive(Parser)]
#[command(name = "fibpipe", version, about = "Pull Fibonacci values through a pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pull values and print them, optionally transformed.
    Sequence {
        #[arg(long)]
        count: Option<u64>,
        /// Stage spec such as `increment` or `mul:3`; repeat to chain.
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// TOML run configuration; flags override it.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Apply stages to a single integer.
    Compose {
        #[arg(long, allow_hyphen_values = true)]
        input: String,
        #[arg(long = "stage")]
        stages: Vec<String>,
    },
    /// Run twice and compare canonical hashes.
    Verify {
        #[arg(long, default_value_t = DEFAULT_COUNT)]
        count: u64,
        #[arg(long = "stage")]
        stages: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).compact())
        .init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Sequence {
            count,
            stages,
            config,
            json,
        } => {
            let base = match config {
                Some(path) => RunConfig::load(&path)?,
                None => RunConfig::default(),
            };
            let run = base.merge(Overrides {
                count,
                stages,
                json,
            });
            sequence(&run)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Compose { input, stages } => {
            let value = parse_integer(&input)?;
            let output = build_pipeline(&stages)?
                .apply(value)
                .with_context(|| format!("composing {}", input.trim()))?;
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { count, stages } => verify(count, &stages),
    }
}

fn sequence(run: &RunConfig) -> Result<()> {
    let mut driver = Driver::from_config(run)?;
    let stdout = io::stdout().lock();
    let mut sink = WriterSink::new(io::BufWriter::new(stdout), run.format);
    let trace = driver.run(run.count, &mut sink)?;
    sink.into_inner().flush().context("flushing stdout")?;
    info!(pulled = trace.len(), "sequence complete");
    Ok(())
}

fn verify(count: u64, stages: &[String]) -> Result<ExitCode> {
    let hash_of = || -> Result<String> {
        let mut driver = Driver::new();
        if !stages.is_empty() {
            driver = driver.with_pipeline(build_pipeline(stages)?);
        }
        let trace = driver.run(count, &mut MemorySink::new())?;
        Ok(canonical_hash(&trace))
    };

    let first = hash_of()?;
    let second = hash_of()?;
    match verdict(count, &first, &second) {
        Ok(line) => {
            println!("{}", line);
            Ok(ExitCode::SUCCESS)
        }
        Err(line) => {
            println!("{}", line);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Report line for two run hashes; `Err` when they differ.
fn verdict(count: u64, first: &str, second: &str) -> Result<String, String> {
    if first == second {
        Ok(format!("[OK] {} values, hash={}", count, first))
    } else {
        Err(format!("[FAIL] determinism: run1={} run2={}", first, second))
    }
}
