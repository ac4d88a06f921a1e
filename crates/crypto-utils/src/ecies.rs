//! ECIES over secp256k1.
//!
//! Payload layout: `ephemeral_public_key (65 bytes, uncompressed) || nonce ||
//! ciphertext || tag`. The AES-256-GCM key is `SHA-256(ecdh_x)`.

use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::encryption::{self, NONCE_SIZE, TAG_SIZE};
use crate::error::CryptoError;

const EPHEMERAL_KEY_SIZE: usize = 65;

fn shared_key(shared_x: &[u8]) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&Sha256::digest(shared_x));
    key
}

/// Encrypts `plaintext` for the holder of `public_key` (33 or 65 bytes).
pub fn encrypt(plaintext: &[u8], public_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let recipient = PublicKey::from_sec1_bytes(public_key)
        .map_err(|e| CryptoError::InvalidInput(format!("invalid recipient key: {e}")))?;

    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let shared = ephemeral.diffie_hellman(&recipient);
    let key = shared_key(shared.raw_secret_bytes());

    let body = encryption::encrypt(plaintext, &key)?;
    let ephemeral_public = ephemeral.public_key().to_encoded_point(false);

    let mut output = Vec::with_capacity(EPHEMERAL_KEY_SIZE + body.len());
    output.extend_from_slice(ephemeral_public.as_bytes());
    output.extend_from_slice(&body);
    Ok(output)
}

/// Decrypts a payload produced by [`encrypt`] with the 32-byte secret key.
pub fn decrypt(payload: &[u8], secret_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if payload.len() < EPHEMERAL_KEY_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "payload too short: {} bytes",
            payload.len()
        )));
    }
    if secret_key.len() != 32 {
        return Err(CryptoError::SecretKeyLength(secret_key.len()));
    }

    let secret = SecretKey::from_slice(secret_key)
        .map_err(|e| CryptoError::InvalidInput(format!("invalid secret key: {e}")))?;

    let (ephemeral, body) = payload.split_at(EPHEMERAL_KEY_SIZE);
    let ephemeral = PublicKey::from_sec1_bytes(ephemeral)
        .map_err(|e| CryptoError::DecryptionFailed(format!("invalid ephemeral key: {e}")))?;

    let shared = diffie_hellman(secret.to_nonzero_scalar(), ephemeral.as_affine());
    let key = shared_key(shared.raw_secret_bytes());

    encryption::decrypt(body, &key)
}

/// Hex convenience wrapper around [`encrypt`] for UTF-8 messages.
pub fn encrypt_hex(message: &str, public_key: &[u8]) -> Result<String, CryptoError> {
    Ok(hex::encode(encrypt(message.as_bytes(), public_key)?))
}

/// Hex convenience wrapper around [`decrypt`] for UTF-8 messages.
pub fn decrypt_hex(payload: &str, secret_key: &[u8]) -> Result<String, CryptoError> {
    let bytes = hex::decode(payload.trim().trim_start_matches("0x"))
        .map_err(|e| CryptoError::InvalidInput(format!("payload is not hex: {e}")))?;
    String::from_utf8(decrypt(&bytes, secret_key)?)
        .map_err(|e| CryptoError::DecryptionFailed(format!("plaintext is not UTF-8: {e}")))
}
