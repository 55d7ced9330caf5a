use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rug::Integer;
use std::time::Duration;
use timerelease_puzzle::modulus::Trapdoor;
use timerelease_puzzle::puzzle::RswPuzzle;
use timerelease_puzzle::solver::{CancellationToken, SequentialSolver};
use timerelease_puzzle::timelock::encrypt_secret_with;
use timerelease_puzzle::{Layer, PuzzleConfig, PuzzleError, decrypt_secret};

fn test_config() -> PuzzleConfig {
    PuzzleConfig::new(64, 1, Duration::from_millis(1))
}

/// Boundary conditions of the squaring count
#[cfg(test)]
mod iteration_boundary_tests {
    use super::*;

    #[test]
    fn test_zero_iterations_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = encrypt_secret_with(b"x", 0, &test_config(), &mut rng);
        assert!(matches!(result, Err(PuzzleError::NonPositiveIterations)));
    }

    #[test]
    fn test_single_iteration() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let package = encrypt_secret_with(b"one", 1, &test_config(), &mut rng).unwrap();
        assert_eq!(decrypt_secret(&package).unwrap(), b"one");
    }

    #[test]
    fn test_one_iteration_is_one_squaring() {
        let trapdoor = Trapdoor::from_primes(Integer::from(61), Integer::from(53)).unwrap();
        let (puzzle, solution) =
            RswPuzzle::lock_with_base(trapdoor, Integer::from(5), 1).unwrap();
        assert_eq!(solution, 25);

        let solved = SequentialSolver::new(&puzzle)
            .solve(&CancellationToken::new())
            .unwrap();
        assert_eq!(solved, 25);
    }

    #[test]
    fn test_iterations_crossing_totient_size() {
        // φ(3233) = 3120 lies between 2^11 and 2^12
        let trapdoor_for = || Trapdoor::from_primes(Integer::from(61), Integer::from(53)).unwrap();
        for iterations in [10u64, 11, 12, 13, 64, 65] {
            let (puzzle, solution) =
                RswPuzzle::lock_with_base(trapdoor_for(), Integer::from(7), iterations).unwrap();
            let solved = SequentialSolver::new(&puzzle)
                .solve(&CancellationToken::new())
                .unwrap();
            assert_eq!(solved, solution, "mismatch at T={}", iterations);
        }
    }

    #[test]
    fn test_large_iteration_count_through_trapdoor() {
        // Only the trapdoor side runs; it must stay fast for huge T
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let package = encrypt_secret_with(b"far future", u64::MAX, &test_config(), &mut rng).unwrap();
        assert_eq!(package.iterations, u64::MAX);
        assert!(package.validate().is_ok());
    }
}

/// Boundary conditions of the secret payload
#[cfg(test)]
mod secret_boundary_tests {
    use super::*;

    #[test]
    fn test_empty_secret() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let package = encrypt_secret_with(b"", 50, &test_config(), &mut rng).unwrap();
        assert_eq!(package.encrypted_secret.len(), 16);
        assert!(decrypt_secret(&package).unwrap().is_empty());
    }

    #[test]
    fn test_block_aligned_secret_gets_full_padding_block() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let secret = [0xAB; 32];
        let package = encrypt_secret_with(&secret, 50, &test_config(), &mut rng).unwrap();
        assert_eq!(package.encrypted_secret.len(), 48);
        assert_eq!(decrypt_secret(&package).unwrap(), secret);
    }

    #[test]
    fn test_large_binary_secret() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let secret: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
        let package = encrypt_secret_with(&secret, 50, &test_config(), &mut rng).unwrap();
        assert_eq!(decrypt_secret(&package).unwrap(), secret);
    }
}

/// Tampering with individual package fields
#[cfg(test)]
mod tamper_boundary_tests {
    use super::*;

    fn sealed_package(seed: u64) -> timerelease_puzzle::TimeLockPackage {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        encrypt_secret_with(b"tamper target", 200, &test_config(), &mut rng).unwrap()
    }

    #[test]
    fn test_altered_base_fails_in_key_layer() {
        let mut package = sealed_package(20);
        package.base += 1;
        if package.base >= package.modulus {
            package.base = Integer::from(2);
        }
        assert!(matches!(
            decrypt_secret(&package),
            Err(PuzzleError::PaddingValidation(Layer::Key))
        ));
    }

    #[test]
    fn test_altered_key_iv_never_returns_the_secret() {
        let mut package = sealed_package(21);
        // The IV only affects the first block; flip its last byte so the
        // recovered one-time key changes without touching the padding block.
        package.key_iv[15] ^= 0x01;
        let result = decrypt_secret(&package);
        assert!(!matches!(result, Ok(ref secret) if secret.as_slice() == b"tamper target"));
    }

    #[test]
    fn test_altered_encrypted_key_fails_in_key_layer() {
        let mut package = sealed_package(22);
        package.encrypted_key[20] ^= 0x80;
        assert!(matches!(
            decrypt_secret(&package),
            Err(PuzzleError::PaddingValidation(Layer::Key))
        ));
    }

    #[test]
    fn test_misaligned_ciphertext_rejected_before_solving() {
        let mut package = sealed_package(23);
        package.encrypted_secret.pop();
        assert!(matches!(
            decrypt_secret(&package),
            Err(PuzzleError::InvalidPackage(_))
        ));
    }

    #[test]
    fn test_base_out_of_range_rejected_before_solving() {
        let mut package = sealed_package(24);
        package.base = package.modulus.clone();
        assert!(matches!(
            decrypt_secret(&package),
            Err(PuzzleError::InvalidPackage(_))
        ));
    }
}
