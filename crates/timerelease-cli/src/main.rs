mod puzzle;
mod signal;
mod storage;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::puzzle::Delay;
use crate::storage::load_puzzle_config;

#[derive(Parser, Debug)]
#[command(author, version, about = "Seal a secret so it can only be read after a chosen amount of sequential work")]
struct Cli {
    /// JSON file with puzzle tunables (prime_bits, benchmark_runs, benchmark_target).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Seal a secret into <dir>/timerelease.json.
    Encrypt {
        #[command(flatten)]
        secret: SecretSource,

        #[command(flatten)]
        delay: DelayArgs,

        /// Squarings per second to assume with --seconds; measured when omitted.
        #[arg(long, requires = "seconds")]
        rate: Option<u64>,

        /// Directory that receives the package.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Solve the package in <dir> and write the secret to stdout.
    Decrypt {
        #[arg(long, default_value = ".")]
        dir: PathBuf,

        /// Write the secret to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print this machine's squarings per second.
    Benchmark,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SecretSource {
    /// Secret given inline as UTF-8 text.
    #[arg(long)]
    secret: Option<String>,

    /// File whose bytes are the secret.
    #[arg(long)]
    secret_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct DelayArgs {
    /// Exact number of sequential squarings.
    #[arg(long)]
    iterations: Option<u64>,

    /// Target unlock delay in seconds on a machine like this one.
    #[arg(long)]
    seconds: Option<f64>,
}

impl SecretSource {
    fn read(&self) -> Result<Vec<u8>> {
        match (&self.secret, &self.secret_file) {
            (Some(text), _) => Ok(text.clone().into_bytes()),
            (None, Some(path)) => std::fs::read(path)
                .with_context(|| format!("reading secret from {}", path.display())),
            (None, None) => anyhow::bail!("no secret given"),
        }
    }
}

impl DelayArgs {
    fn delay(&self, rate: Option<u64>) -> Result<Delay> {
        match (self.iterations, self.seconds) {
            (Some(iterations), _) => Ok(Delay::Iterations(iterations)),
            (None, Some(seconds)) => Ok(Delay::Seconds { seconds, rate }),
            (None, None) => anyhow::bail!("no delay given"),
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so a decrypted secret on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_puzzle_config(cli.config.as_deref())?;
    let cancelled = signal::cancel_on_ctrl_c();

    match cli.cmd {
        Cmd::Encrypt {
            secret,
            delay,
            rate,
            dir,
        } => puzzle::encrypt(
            &secret.read()?,
            delay.delay(rate)?,
            &config,
            &dir,
            &cancelled,
        ),
        Cmd::Decrypt { dir, out } => puzzle::decrypt_to(&dir, out.as_deref(), &cancelled),
        Cmd::Benchmark => {
            let rate = puzzle::calibrate(&config, &cancelled)?;
            println!("{}", rate);
            Ok(())
        }
    }
}
