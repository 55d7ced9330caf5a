use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for puzzle generation and CPU calibration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleConfig {
    /// Bit length of each of the two modulus primes.
    pub prime_bits: u32,
    /// Number of timed runs averaged by the calibrator.
    pub benchmark_runs: u32,
    /// Wall time a single calibration run must reach before measuring.
    pub benchmark_target: Duration,
}

impl PuzzleConfig {
    pub fn new(prime_bits: u32, benchmark_runs: u32, benchmark_target: Duration) -> Self {
        Self {
            prime_bits,
            benchmark_runs,
            benchmark_target,
        }
    }

    pub fn get_default() -> Self {
        Self {
            prime_bits: 512,
            benchmark_runs: 10,
            benchmark_target: Duration::from_secs(1),
        }
    }
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self::get_default()
    }
}
