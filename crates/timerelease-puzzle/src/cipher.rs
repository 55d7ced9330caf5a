use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{CryptoRng, RngCore};
use timerelease_types::{BLOCK_LEN, TimeLockPackage};

use crate::error::{Layer, PuzzleError, Result};
use crate::kdf::KEY_LEN;
use crate::modulus::fill_random;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Secret sealed under a one-time key, itself sealed under the puzzle key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub secret_iv: [u8; BLOCK_LEN],
    pub encrypted_secret: Vec<u8>,
    pub key_iv: [u8; BLOCK_LEN],
    pub encrypted_key: Vec<u8>,
}

impl SealedSecret {
    pub fn from_package(package: &TimeLockPackage) -> Self {
        SealedSecret {
            secret_iv: package.secret_iv,
            encrypted_secret: package.encrypted_secret.clone(),
            key_iv: package.key_iv,
            encrypted_key: package.encrypted_key.clone(),
        }
    }
}

/// Encrypts `secret` under a fresh one-time key, then wraps that key with `puzzle_key`.
pub fn seal<R: RngCore + CryptoRng>(
    secret: &[u8],
    puzzle_key: &[u8; KEY_LEN],
    rng: &mut R,
) -> Result<SealedSecret> {
    let mut one_time_key = [0u8; KEY_LEN];
    let mut secret_iv = [0u8; BLOCK_LEN];
    let mut key_iv = [0u8; BLOCK_LEN];
    fill_random(rng, &mut one_time_key)?;
    fill_random(rng, &mut secret_iv)?;
    fill_random(rng, &mut key_iv)?;

    let encrypted_secret = encrypt(&one_time_key, &secret_iv, secret);
    let encrypted_key = encrypt(puzzle_key, &key_iv, &one_time_key);
    tracing::debug!(
        secret_len = secret.len(),
        ciphertext_len = encrypted_secret.len(),
        "sealed secret"
    );

    Ok(SealedSecret {
        secret_iv,
        encrypted_secret,
        key_iv,
        encrypted_key,
    })
}

/// Reverses [`seal`].
///
/// A key-layer failure means `puzzle_key` is wrong for this package; a
/// secret-layer failure means the secret ciphertext is damaged.
pub fn open(sealed: &SealedSecret, puzzle_key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let one_time_key: [u8; KEY_LEN] = decrypt(puzzle_key, &sealed.key_iv, &sealed.encrypted_key)
        .and_then(|bytes| <[u8; KEY_LEN]>::try_from(bytes.as_slice()).ok())
        .ok_or(PuzzleError::PaddingValidation(Layer::Key))?;

    decrypt(&one_time_key, &sealed.secret_iv, &sealed.encrypted_secret)
        .ok_or(PuzzleError::PaddingValidation(Layer::Secret))
}

fn encrypt(key: &[u8; KEY_LEN], iv: &[u8; BLOCK_LEN], plaintext: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(&(*key).into(), &(*iv).into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

fn decrypt(key: &[u8; KEY_LEN], iv: &[u8; BLOCK_LEN], ciphertext: &[u8]) -> Option<Vec<u8>> {
    Aes128CbcDec::new(&(*key).into(), &(*iv).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .ok()
}
