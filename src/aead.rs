//! Sealed-box layer: AES-256-GCM with a random 96-bit nonce.
//!
//! Blob layout is `nonce(12) ‖ ciphertext ‖ tag(16)`.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand_core::{CryptoRng, RngCore};

use crate::error::AeadError;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

pub fn seal<R: RngCore + CryptoRng>(
    key: &[u8; 32],
    plaintext: &[u8],
    aad: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, AeadError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| AeadError::Seal)?;
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad })
        .map_err(|_| AeadError::Seal)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ct.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ct);
    Ok(blob)
}

pub fn open(key: &[u8; 32], blob: &[u8], aad: &[u8]) -> Result<Vec<u8>, AeadError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(AeadError::AuthenticationFailure);
    }
    let (nonce, ct) = blob.split_at(NONCE_LEN);
    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| AeadError::AuthenticationFailure)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ct, aad })
        .map_err(|_| AeadError::AuthenticationFailure)
}
