use std::fmt;

use rand::{CryptoRng, RngCore};
use rug::Integer;
use rug::integer::{IsPrime, Order};

use crate::error::{PuzzleError, Result};

/// Default bit length of each modulus prime.
pub const DEFAULT_PRIME_BITS: u32 = 512;

/// Smallest prime size for which resampling on `p == q` terminates quickly.
pub const MIN_PRIME_BITS: u32 = 8;

const PRIMALITY_REPS: u32 = 30;

/// The factorization of a puzzle modulus.
///
/// Only the puzzle creator ever holds one. It is consumed when the puzzle is
/// locked so the factors do not outlive encryption.
pub struct Trapdoor {
    p: Integer,
    q: Integer,
    modulus: Integer,
}

impl Trapdoor {
    /// Samples two distinct probable primes of `prime_bits` bits each.
    pub fn generate<R: RngCore + CryptoRng>(prime_bits: u32, rng: &mut R) -> Result<Self> {
        if prime_bits < MIN_PRIME_BITS {
            return Err(PuzzleError::InvalidParameter(format!(
                "prime_bits must be at least {MIN_PRIME_BITS}, got {prime_bits}"
            )));
        }

        let p = random_prime(prime_bits, rng)?;
        let q = loop {
            let q = random_prime(prime_bits, rng)?;
            if q != p {
                break q;
            }
            tracing::debug!(prime_bits, "sampled equal primes, resampling");
        };

        let modulus = Integer::from(&p * &q);
        tracing::debug!(modulus_bits = modulus.significant_bits(), "generated modulus");
        Ok(Trapdoor { p, q, modulus })
    }

    /// Builds a trapdoor from known factors. Both must be probable primes and distinct.
    pub fn from_primes(p: Integer, q: Integer) -> Result<Self> {
        if p == q {
            return Err(PuzzleError::InvalidParameter(
                "modulus factors must be distinct".to_string(),
            ));
        }
        for factor in [&p, &q] {
            if *factor < 2 || factor.is_probably_prime(PRIMALITY_REPS) == IsPrime::No {
                return Err(PuzzleError::InvalidParameter(format!(
                    "{factor} is not a prime"
                )));
            }
        }
        let modulus = Integer::from(&p * &q);
        Ok(Trapdoor { p, q, modulus })
    }

    pub fn modulus(&self) -> &Integer {
        &self.modulus
    }

    /// Drops the factors and keeps only the public modulus.
    pub fn into_modulus(self) -> Integer {
        self.modulus
    }

    /// φ(N) = (p − 1)(q − 1)
    pub fn totient(&self) -> Integer {
        let p_minus_1 = Integer::from(&self.p - 1);
        let q_minus_1 = Integer::from(&self.q - 1);
        p_minus_1 * q_minus_1
    }

    /// Exponent `e` with `x^e ≡ x^(2^iterations) (mod N)` for every `x`.
    ///
    /// While `2^iterations < φ(N)` this is `2^iterations` itself. Past that it
    /// is `(2^iterations mod φ(N)) + φ(N)`; adding φ(N) changes nothing for
    /// bases coprime to N and keeps bases sharing a factor with N exact.
    pub fn reduced_exponent(&self, iterations: u64) -> Result<Integer> {
        let phi = self.totient();

        if iterations < u64::from(phi.significant_bits()) {
            let exact = Integer::from(1) << (iterations as u32);
            if exact < phi {
                return Ok(exact);
            }
        }

        let mut reduced = Integer::from(2)
            .pow_mod(&Integer::from(iterations), &phi)
            .map_err(|_| {
                PuzzleError::InvalidParameter("cannot reduce exponent modulo φ(N)".to_string())
            })?;
        reduced += &phi;
        Ok(reduced)
    }

    /// Computes `base^(2^iterations) mod N` in O(log iterations) multiplications.
    pub fn solve(&self, base: &Integer, iterations: u64) -> Result<Integer> {
        let exponent = self.reduced_exponent(iterations)?;
        Integer::from(base)
            .pow_mod(&exponent, &self.modulus)
            .map_err(|_| PuzzleError::InvalidParameter("modular exponentiation failed".to_string()))
    }
}

impl fmt::Debug for Trapdoor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trapdoor")
            .field("modulus_bits", &self.modulus.significant_bits())
            .finish_non_exhaustive()
    }
}

/// Fills `buf` from the secure source, surfacing exhaustion instead of retrying.
pub(crate) fn fill_random<R: RngCore + CryptoRng>(rng: &mut R, buf: &mut [u8]) -> Result<()> {
    rng.try_fill_bytes(buf)
        .map_err(|e| PuzzleError::RandomnessUnavailable(e.to_string()))
}

/// Random odd candidate with the top bit set, advanced to the next probable prime.
pub(crate) fn random_prime<R: RngCore + CryptoRng>(bits: u32, rng: &mut R) -> Result<Integer> {
    let mut buf = vec![0u8; (bits as usize).div_ceil(8)];
    fill_random(rng, &mut buf)?;

    let mut candidate = Integer::from_digits(&buf, Order::MsfBe);
    candidate.keep_bits_mut(bits);
    candidate.set_bit(bits - 1, true);
    candidate.set_bit(0, true);
    candidate.next_prime_mut();
    Ok(candidate)
}

/// Uniform-enough base in `[2, modulus)`; 64 surplus bits keep the modulo bias negligible.
pub(crate) fn random_base<R: RngCore + CryptoRng>(modulus: &Integer, rng: &mut R) -> Result<Integer> {
    if *modulus <= 3 {
        return Err(PuzzleError::InvalidParameter(format!(
            "modulus {modulus} leaves no room for a base"
        )));
    }
    let span = Integer::from(modulus - 2);
    let mut buf = vec![0u8; (span.significant_bits() as usize).div_ceil(8) + 8];
    fill_random(rng, &mut buf)?;

    let mut base = Integer::from_digits(&buf, Order::MsfBe);
    base %= &span;
    base += 2;
    Ok(base)
}
