use anyhow::{bail, Context, Result};
use rand::rngs::OsRng;
use std::io::Write;
use std::path::Path;
use timerelease_puzzle::benchmark::{iterations_for_duration, BenchmarkCalibrator};
use timerelease_puzzle::solver::{CancellationToken, Progress, ProgressObserver};
use timerelease_puzzle::timelock::encrypt_secret_with;
use timerelease_puzzle::{unlock, PuzzleConfig};
use tracing::info;

use crate::storage::{open_storage, write_output};

/// How the unlock delay was requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    Iterations(u64),
    Seconds { seconds: f64, rate: Option<u64> },
}

/// Logs solve progress every ten percent.
#[derive(Debug, Default)]
pub struct LogProgress {
    next_decile: u64,
}

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, progress: Progress) {
        let decile = (progress.fraction() * 10.0).floor() as u64;
        if decile >= self.next_decile {
            info!(
                completed = progress.completed,
                total = progress.total,
                "{}% solved",
                decile * 10
            );
            self.next_decile = decile + 1;
        }
    }
}

/// Measures the squaring rate of this machine.
pub fn calibrate(config: &PuzzleConfig, cancelled: &CancellationToken) -> Result<u64> {
    info!(
        runs = config.benchmark_runs,
        target = ?config.benchmark_target,
        "calibrating squaring rate"
    );
    let calibration = BenchmarkCalibrator::new(config.clone()).calibrate(&mut OsRng, cancelled)?;
    info!(
        iterations = calibration.iterations,
        average = ?calibration.average(),
        "squarings per second: {}",
        calibration.squarings_per_second
    );
    Ok(calibration.squarings_per_second)
}

pub fn resolve_iterations(
    delay: Delay,
    config: &PuzzleConfig,
    cancelled: &CancellationToken,
) -> Result<u64> {
    match delay {
        Delay::Iterations(iterations) => Ok(iterations),
        Delay::Seconds { seconds, rate } => {
            let rate = match rate {
                Some(rate) => rate,
                None => calibrate(config, cancelled)?,
            };
            let iterations = iterations_for_duration(seconds, rate)?;
            info!(seconds, rate, iterations, "converted delay to iterations");
            Ok(iterations)
        }
    }
}

pub fn encrypt(
    secret: &[u8],
    delay: Delay,
    config: &PuzzleConfig,
    dir: &Path,
    cancelled: &CancellationToken,
) -> Result<()> {
    let storage = open_storage(dir, true)?;
    if storage.has_package() {
        bail!(
            "{} already holds a package; refusing to overwrite it",
            storage.config().package_path.display()
        );
    }

    let iterations = resolve_iterations(delay, config, cancelled)?;
    let package = encrypt_secret_with(secret, iterations, config, &mut OsRng)?;
    storage.write_package(&package)?;

    info!(
        iterations,
        path = %storage.config().package_path.display(),
        "secret sealed"
    );
    Ok(())
}

/// Solves the package in `dir` and returns the recovered secret.
pub fn decrypt(dir: &Path, cancelled: &CancellationToken) -> Result<Vec<u8>> {
    let storage = open_storage(dir, false)?;
    let package = storage.read_package()?;
    info!(iterations = package.iterations, "solving puzzle");

    let unlocked = unlock(&package, cancelled, &mut LogProgress::default())?;
    info!(
        elapsed_secs = unlocked.elapsed.as_secs_f64(),
        "completed in {:.2} seconds",
        unlocked.elapsed.as_secs_f64()
    );
    Ok(unlocked.secret)
}

/// Decrypts, then writes the secret to `out` or stdout.
///
/// Nothing is written unless decryption succeeds.
pub fn decrypt_to(dir: &Path, out: Option<&Path>, cancelled: &CancellationToken) -> Result<()> {
    let secret = decrypt(dir, cancelled)?;
    match out {
        Some(path) => write_output(path, &secret),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&secret)
                .context("writing recovered secret")?;
            stdout.flush().context("writing recovered secret")
        }
    }
}
