use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::TypesError;

/// AES block size, which is also the length of both IVs.
pub const BLOCK_LEN: usize = 16;

/// A sealed secret together with the public half of its time-lock puzzle.
///
/// `base`, `modulus` and `iterations` are all a decrypter gets to recompute
/// the puzzle solution. The factors of `modulus` never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockPackage {
    #[serde(with = "decimal")]
    pub base: Integer,
    #[serde(with = "decimal")]
    pub modulus: Integer,
    pub iterations: u64,
    #[serde(with = "iv")]
    pub secret_iv: [u8; BLOCK_LEN],
    #[serde(with = "bytes")]
    pub encrypted_secret: Vec<u8>,
    #[serde(with = "iv")]
    pub key_iv: [u8; BLOCK_LEN],
    #[serde(with = "bytes")]
    pub encrypted_key: Vec<u8>,
}

impl TimeLockPackage {
    /// Renders the package as pretty JSON with four-space indentation.
    pub fn to_json(&self) -> Result<String, TypesError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| TypesError::Other(e.to_string()))
    }

    /// Parses and validates a package.
    pub fn from_json(text: &str) -> Result<Self, TypesError> {
        let package: TimeLockPackage = serde_json::from_str(text)?;
        package.validate()?;
        Ok(package)
    }

    /// Checks the structural invariants a well-formed package must satisfy.
    ///
    /// This cannot tell a tampered `base` or `modulus` from a genuine one;
    /// that only shows up as a key-layer failure after the solve.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.modulus <= 2 {
            return Err(TypesError::invalid("modulus", "must be greater than 2"));
        }
        if self.base < 2 || self.base >= self.modulus {
            return Err(TypesError::invalid("base", "must satisfy 2 <= base < modulus"));
        }
        if self.iterations == 0 {
            return Err(TypesError::invalid("iterations", "must be positive"));
        }
        check_ciphertext("encrypted_secret", &self.encrypted_secret)?;
        check_ciphertext("encrypted_key", &self.encrypted_key)?;
        Ok(())
    }
}

fn check_ciphertext(field: &'static str, bytes: &[u8]) -> Result<(), TypesError> {
    if bytes.is_empty() || bytes.len() % BLOCK_LEN != 0 {
        return Err(TypesError::invalid(
            field,
            format!(
                "length {} is not a positive multiple of {}",
                bytes.len(),
                BLOCK_LEN
            ),
        ));
    }
    Ok(())
}

/// Big integers travel as bare JSON numbers of arbitrary length.
mod decimal {
    use rug::Integer;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Integer, serializer: S) -> Result<S::Ok, S::Error> {
        let number: serde_json::Number =
            serde_json::from_str(&value.to_string()).map_err(S::Error::custom)?;
        number.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Integer, D::Error> {
        let number = serde_json::Number::deserialize(deserializer)?;
        let digits = number.to_string();
        Integer::from_str_radix(&digits, 10)
            .map_err(|e| D::Error::custom(format!("not a decimal integer `{digits}`: {e}")))
    }
}

mod bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(|e| D::Error::custom(format!("base64 decode error: {e}")))
    }
}

mod iv {
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    use super::BLOCK_LEN;

    pub fn serialize<S: Serializer>(
        value: &[u8; BLOCK_LEN],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        super::bytes::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[u8; BLOCK_LEN], D::Error> {
        let raw = super::bytes::deserialize(deserializer)?;
        <[u8; BLOCK_LEN]>::try_from(raw.as_slice()).map_err(|_| {
            D::Error::custom(format!("IV must be {BLOCK_LEN} bytes, got {}", raw.len()))
        })
    }
}
