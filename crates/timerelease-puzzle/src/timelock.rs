//! Entry points used by callers: seal a secret, unlock a package, calibrate.

use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use timerelease_types::TimeLockPackage;

use crate::benchmark::BenchmarkCalibrator;
use crate::cipher::{self, SealedSecret};
use crate::config::PuzzleConfig;
use crate::error::{PuzzleError, Result};
use crate::kdf::derive_key;
use crate::modulus::Trapdoor;
use crate::puzzle::RswPuzzle;
use crate::solver::{CancellationToken, NoProgress, ProgressObserver, SequentialSolver};

/// A recovered secret and how long the sequential solve took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlocked {
    pub secret: Vec<u8>,
    pub elapsed: Duration,
}

/// Seals `secret` behind `iterations` squarings using the OS random source
/// and 512-bit primes.
pub fn encrypt_secret(secret: &[u8], iterations: u64) -> Result<TimeLockPackage> {
    encrypt_secret_with(secret, iterations, &PuzzleConfig::get_default(), &mut OsRng)
}

pub fn encrypt_secret_with<R: RngCore + CryptoRng>(
    secret: &[u8],
    iterations: u64,
    config: &PuzzleConfig,
    rng: &mut R,
) -> Result<TimeLockPackage> {
    if iterations == 0 {
        return Err(PuzzleError::NonPositiveIterations);
    }

    tracing::info!(iterations, prime_bits = config.prime_bits, "preparing time lock");
    let trapdoor = Trapdoor::generate(config.prime_bits, rng)?;
    let (puzzle, solution) = RswPuzzle::lock(trapdoor, iterations, rng)?;
    seal_package(secret, puzzle, &solution, rng)
}

/// Binds `secret` to an already locked puzzle and its trapdoor-computed solution.
pub fn seal_package<R: RngCore + CryptoRng>(
    secret: &[u8],
    puzzle: RswPuzzle,
    solution: &rug::Integer,
    rng: &mut R,
) -> Result<TimeLockPackage> {
    if puzzle.iterations() == 0 {
        return Err(PuzzleError::NonPositiveIterations);
    }

    let puzzle_key = derive_key(solution);
    let sealed = cipher::seal(secret, &puzzle_key, rng)?;
    let (base, modulus, iterations) = puzzle.into_parts();
    tracing::info!(iterations, "time lock package ready");

    Ok(TimeLockPackage {
        base,
        modulus,
        iterations,
        secret_iv: sealed.secret_iv,
        encrypted_secret: sealed.encrypted_secret,
        key_iv: sealed.key_iv,
        encrypted_key: sealed.encrypted_key,
    })
}

/// Recovers the secret by solving the puzzle the slow way.
pub fn decrypt_secret(package: &TimeLockPackage) -> Result<Vec<u8>> {
    unlock(package, &CancellationToken::new(), &mut NoProgress).map(|unlocked| unlocked.secret)
}

/// Cancellable, observable form of [`decrypt_secret`].
pub fn unlock<O: ProgressObserver>(
    package: &TimeLockPackage,
    cancelled: &CancellationToken,
    observer: &mut O,
) -> Result<Unlocked> {
    package.validate()?;

    let puzzle = RswPuzzle::from_package(package)?;
    let start = Instant::now();
    let solution = SequentialSolver::new(&puzzle).solve_with_progress(cancelled, observer)?;
    let elapsed = start.elapsed();
    tracing::info!(iterations = puzzle.iterations(), ?elapsed, "time lock solved");

    let secret = cipher::open(&SealedSecret::from_package(package), &derive_key(&solution))?;
    Ok(Unlocked { secret, elapsed })
}

/// Estimates this machine's squarings per second with the default calibration.
pub fn run_benchmark() -> Result<u64> {
    let calibrator = BenchmarkCalibrator::new(PuzzleConfig::get_default());
    calibrator
        .calibrate(&mut OsRng, &CancellationToken::new())
        .map(|calibration| calibration.squarings_per_second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Layer;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rug::Integer;

    fn test_config() -> PuzzleConfig {
        PuzzleConfig::new(64, 1, Duration::from_millis(1))
    }

    #[test]
    fn test_round_trip() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let package = encrypt_secret_with(b"hello", 500, &test_config(), &mut rng).unwrap();

        assert_eq!(package.iterations, 500);
        assert!(package.validate().is_ok());
        assert_eq!(decrypt_secret(&package).unwrap(), b"hello");
    }

    #[test]
    fn test_zero_iterations_rejected_before_any_work() {
        struct PanickingRng;
        impl RngCore for PanickingRng {
            fn next_u32(&mut self) -> u32 {
                panic!("randomness drawn")
            }
            fn next_u64(&mut self) -> u64 {
                panic!("randomness drawn")
            }
            fn fill_bytes(&mut self, _dest: &mut [u8]) {
                panic!("randomness drawn")
            }
            fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                panic!("randomness drawn")
            }
        }
        impl CryptoRng for PanickingRng {}

        let result = encrypt_secret_with(b"hello", 0, &test_config(), &mut PanickingRng);
        assert!(matches!(result, Err(PuzzleError::NonPositiveIterations)));
    }

    #[test]
    fn test_concrete_scenario() {
        let trapdoor = Trapdoor::from_primes(Integer::from(61), Integer::from(53)).unwrap();
        let (puzzle, solution) = RswPuzzle::lock_with_base(trapdoor, Integer::from(5), 1000).unwrap();
        assert_eq!(solution, 2557);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let package = seal_package(b"hello", puzzle, &solution, &mut rng).unwrap();
        assert_eq!(package.modulus, 3233);
        assert_eq!(package.base, 5);

        let unlocked = unlock(&package, &CancellationToken::new(), &mut NoProgress).unwrap();
        assert_eq!(unlocked.secret, b"hello");
    }

    #[test]
    fn test_unlock_rejects_invalid_package() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut package = encrypt_secret_with(b"hello", 10, &test_config(), &mut rng).unwrap();
        package.iterations = 0;

        assert!(matches!(
            decrypt_secret(&package),
            Err(PuzzleError::InvalidPackage(_))
        ));
    }

    #[test]
    fn test_altered_iterations_fail_in_key_layer() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let package = encrypt_secret_with(b"hello", 100, &test_config(), &mut rng).unwrap();

        for iterations in [99, 101] {
            let mut altered = package.clone();
            altered.iterations = iterations;
            assert!(matches!(
                decrypt_secret(&altered),
                Err(PuzzleError::PaddingValidation(Layer::Key))
            ));
        }
    }

    #[test]
    fn test_cancelled_unlock() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let package = encrypt_secret_with(b"hello", 100, &test_config(), &mut rng).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        assert!(matches!(
            unlock(&package, &token, &mut NoProgress),
            Err(PuzzleError::Cancelled)
        ));
    }
}
