//! CPU calibration for the sequential-squaring cost model.
//!
//! Calibration runs the same squaring loop a decrypter runs, so the
//! resulting rate translates a desired unlock delay into an iteration count
//! for this machine. A machine with a faster single core will unlock sooner.

use std::time::{Duration, Instant};

use rand::{CryptoRng, RngCore};

use crate::config::PuzzleConfig;
use crate::error::{PuzzleError, Result};
use crate::modulus::{Trapdoor, random_base};
use crate::solver::{CancellationToken, NoProgress, square_chain};

/// Caller convention for raw "work units": one unit is 2^18 squarings.
pub const WORK_UNIT_SCALE: u64 = 1 << 18;

/// Outcome of a full calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Power-of-two iteration count found by the scaling phase.
    pub iterations: u64,
    /// Wall time of the scaling run that reached the target.
    pub scale_elapsed: Duration,
    /// Wall time of each measurement run.
    pub runs: Vec<Duration>,
    /// `iterations / mean(runs)`, truncated.
    pub squarings_per_second: u64,
}

impl Calibration {
    pub fn average(&self) -> Duration {
        average(&self.runs)
    }
}

pub struct BenchmarkCalibrator {
    config: PuzzleConfig,
}

impl BenchmarkCalibrator {
    pub fn new(config: PuzzleConfig) -> Self {
        BenchmarkCalibrator { config }
    }

    pub fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    /// Times `iterations` squarings against a freshly generated dummy modulus.
    ///
    /// Modulus generation is not part of the measured time.
    pub fn run_single<R: RngCore + CryptoRng>(
        &self,
        iterations: u64,
        rng: &mut R,
        cancelled: &CancellationToken,
    ) -> Result<Duration> {
        let modulus = Trapdoor::generate(self.config.prime_bits, rng)?.into_modulus();
        let mut value = random_base(&modulus, rng)?;

        let start = Instant::now();
        square_chain(&mut value, &modulus, iterations, cancelled, &mut NoProgress)?;
        let elapsed = start.elapsed();

        tracing::debug!(iterations, ?elapsed, "benchmark run");
        Ok(elapsed)
    }

    /// Doubles the iteration count from 1 until one run takes at least the target time.
    ///
    /// Returns the power-of-two count together with that run's wall time.
    pub fn find_scale<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        cancelled: &CancellationToken,
    ) -> Result<(u64, Duration)> {
        let mut iterations: u64 = 1;
        loop {
            iterations = iterations.checked_mul(2).ok_or_else(|| {
                PuzzleError::InvalidParameter(
                    "benchmark target unreachable within u64 iterations".to_string(),
                )
            })?;
            tracing::debug!(iterations, "scaling benchmark");

            let elapsed = self.run_single(iterations, rng, cancelled)?;
            if elapsed >= self.config.benchmark_target {
                return Ok((iterations, elapsed));
            }
        }
    }

    /// Finds the scale, then averages `benchmark_runs` independent runs at it.
    pub fn calibrate<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        cancelled: &CancellationToken,
    ) -> Result<Calibration> {
        if self.config.benchmark_runs == 0 {
            return Err(PuzzleError::InvalidParameter(
                "benchmark_runs must be positive".to_string(),
            ));
        }

        let (iterations, scale_elapsed) = self.find_scale(rng, cancelled)?;

        let runs = (0..self.config.benchmark_runs)
            .map(|run| {
                tracing::debug!(run = run + 1, total = self.config.benchmark_runs, "measuring");
                self.run_single(iterations, rng, cancelled)
            })
            .collect::<Result<Vec<_>>>()?;

        let squarings_per_second = rate(iterations, average(&runs));
        tracing::info!(iterations, squarings_per_second, "calibration finished");

        Ok(Calibration {
            iterations,
            scale_elapsed,
            runs,
            squarings_per_second,
        })
    }
}

fn average(runs: &[Duration]) -> Duration {
    if runs.is_empty() {
        return Duration::ZERO;
    }
    runs.iter().sum::<Duration>() / runs.len() as u32
}

fn rate(iterations: u64, average: Duration) -> u64 {
    let seconds = average.as_secs_f64();
    if seconds <= 0.0 {
        return u64::MAX;
    }
    (iterations as f64 / seconds) as u64
}

/// `round(seconds × squarings_per_second)`, refusing delays that round to nothing.
pub fn iterations_for_duration(seconds: f64, squarings_per_second: u64) -> Result<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(PuzzleError::InvalidParameter(format!(
            "unlock delay must be a non-negative number of seconds, got {seconds}"
        )));
    }

    let iterations = (seconds * squarings_per_second as f64).round();
    if iterations < 1.0 {
        return Err(PuzzleError::NonPositiveIterations);
    }
    if iterations >= u64::MAX as f64 {
        return Err(PuzzleError::InvalidParameter(format!(
            "{seconds} s at {squarings_per_second} squarings/s overflows the iteration count"
        )));
    }
    Ok(iterations as u64)
}
