use rand::{CryptoRng, RngCore};
use timerelease_types::TimeLockPackage;

use crate::error::{PuzzleError, Result};
use crate::modulus::{Trapdoor, random_base};

// Rivest-Shamir-Wagner time-lock puzzle, public half
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RswPuzzle {
    base: rug::Integer,    // x - the value squared repeatedly
    modulus: rug::Integer, // N - p × q, factors unknown to the solver
    iterations: u64,       // T - number of sequential squarings
}

impl RswPuzzle {
    /// Builds a puzzle from public values, reducing `base` modulo `modulus`.
    ///
    /// A modulus below 3 leaves no valid base and is rejected.
    pub fn new(base: rug::Integer, modulus: rug::Integer, iterations: u64) -> Result<Self> {
        if modulus < 3 {
            return Err(PuzzleError::InvalidParameter(format!(
                "modulus must be at least 3, got {modulus}"
            )));
        }
        let base = base.rem_euc(&modulus);

        Ok(RswPuzzle {
            base,
            modulus,
            iterations,
        })
    }

    pub fn from_package(package: &TimeLockPackage) -> Result<Self> {
        RswPuzzle::new(
            package.base.clone(),
            package.modulus.clone(),
            package.iterations,
        )
    }

    /// Creates a puzzle with a random base and returns it with its solution.
    ///
    /// The trapdoor is consumed: once this returns, only the public modulus is left.
    pub fn lock<R: RngCore + CryptoRng>(
        trapdoor: Trapdoor,
        iterations: u64,
        rng: &mut R,
    ) -> Result<(Self, rug::Integer)> {
        let base = random_base(trapdoor.modulus(), rng)?;
        Self::lock_with_base(trapdoor, base, iterations)
    }

    /// Same as [`RswPuzzle::lock`] with a caller-chosen base in `[2, N)`.
    pub fn lock_with_base(
        trapdoor: Trapdoor,
        base: rug::Integer,
        iterations: u64,
    ) -> Result<(Self, rug::Integer)> {
        if base < 2 || base >= *trapdoor.modulus() {
            return Err(PuzzleError::InvalidParameter(format!(
                "base must satisfy 2 <= base < modulus, got {base}"
            )));
        }

        let solution = trapdoor.solve(&base, iterations)?;
        tracing::debug!(iterations, "evaluated puzzle through the trapdoor");

        let modulus = trapdoor.into_modulus();
        Ok((
            RswPuzzle {
                base,
                modulus,
                iterations,
            },
            solution,
        ))
    }

    pub fn base(&self) -> &rug::Integer {
        &self.base
    }

    pub fn modulus(&self) -> &rug::Integer {
        &self.modulus
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn into_parts(self) -> (rug::Integer, rug::Integer, u64) {
        (self.base, self.modulus, self.iterations)
    }
}
