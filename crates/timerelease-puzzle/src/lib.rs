//! Time-lock encryption built on the Rivest-Shamir-Wagner puzzle.
//!
//! Whoever holds the factorization of `N` evaluates `x^(2^T) mod N` almost
//! instantly; everyone else has to perform `T` sequential squarings. The
//! puzzle solution keys an AES layer that wraps the one-time key of the secret.

pub mod benchmark;
pub mod cipher;
pub mod config;
pub mod error;
pub mod kdf;
pub mod modulus;
pub mod puzzle;
pub mod solver;
pub mod timelock;

pub use config::PuzzleConfig;
pub use error::{Layer, PuzzleError};
pub use timelock::{Unlocked, decrypt_secret, encrypt_secret, run_benchmark, unlock};
pub use timerelease_types::TimeLockPackage;
