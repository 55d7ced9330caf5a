use sha2::{Digest, Sha256};

/// Length of an AES-128 key.
pub const KEY_LEN: usize = 16;

/// Maps a puzzle solution to an AES-128 key.
///
/// The key is the first 16 bytes of SHA-256 over the canonical decimal
/// digits of `solution` (no sign, no leading zeros, no separators). Both the
/// trapdoor and the sequential path must feed the exact same text here.
pub fn derive_key(solution: &rug::Integer) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(solution.to_string().as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest[..KEY_LEN]);
    key
}
