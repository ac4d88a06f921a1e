use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, KeyInit, Nonce};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// AES-256-GCM nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

/// AES-256-GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext` using AES-256-GCM with the given 32-byte `key`.
///
/// A random 12-byte nonce is generated and prepended to the ciphertext. The
/// returned vector has the layout: `[nonce (12 bytes) | ciphertext + tag]`.
pub fn encrypt(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypts data previously encrypted with [`encrypt`].
///
/// Expects `ciphertext_with_nonce` to begin with the 12-byte nonce followed by
/// the ciphertext and authentication tag.
pub fn decrypt(ciphertext_with_nonce: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext_with_nonce.len() < NONCE_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "ciphertext too short: expected at least {} bytes, got {}",
            NONCE_SIZE,
            ciphertext_with_nonce.len()
        )));
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// AES key bound to a signing key: `SHA-256(secret_key)`.
pub fn aes_key_from_secret_key(secret_key: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    if secret_key.len() != 32 {
        return Err(CryptoError::SecretKeyLength(secret_key.len()));
    }
    let mut key = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&Sha256::digest(secret_key));
    Ok(key)
}

/// Encrypts a UTF-8 message under the AES key of `secret_key` and returns
/// the hex of `nonce || ciphertext || tag`.
pub fn encrypt_with_secret_key(message: &str, secret_key: &[u8]) -> Result<String, CryptoError> {
    let key = aes_key_from_secret_key(secret_key)?;
    Ok(hex::encode(encrypt(message.as_bytes(), &key)?))
}

/// Reverses [`encrypt_with_secret_key`].
pub fn decrypt_with_secret_key(payload: &str, secret_key: &[u8]) -> Result<String, CryptoError> {
    let key = aes_key_from_secret_key(secret_key)?;
    let bytes = hex::decode(payload.trim().trim_start_matches("0x"))
        .map_err(|e| CryptoError::InvalidInput(format!("payload is not hex: {e}")))?;
    let plaintext = decrypt(&bytes, &key)?;
    String::from_utf8(plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("plaintext is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = i as u8;
        }
        key
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = b"hello, offline signer!";

        let encrypted = encrypt(plaintext, &key).expect("encryption should succeed");
        let decrypted = decrypt(&encrypted, &key).expect("decryption should succeed");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn encrypt_decrypt_empty_plaintext() {
        let key = test_key();
        let plaintext = b"";

        let encrypted = encrypt(plaintext, &key).expect("encryption should succeed");
        let decrypted = decrypt(&encrypted, &key).expect("decryption should succeed");

        assert_eq!(decrypted, plaintext.to_vec());
    }

    #[test]
    fn encrypt_produces_different_ciphertexts() {
        let key = test_key();
        let plaintext = b"determinism check";

        let enc1 = encrypt(plaintext, &key).expect("encryption should succeed");
        let enc2 = encrypt(plaintext, &key).expect("encryption should succeed");

        // Different random nonces produce different outputs.
        assert_ne!(enc1, enc2);
    }

    #[test]
    fn ciphertext_has_nonce_prepended() {
        let key = test_key();
        let plaintext = b"test";

        let encrypted = encrypt(plaintext, &key).expect("encryption should succeed");

        assert_eq!(encrypted.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let key = test_key();
        let mut wrong_key = test_key();
        wrong_key[0] ^= 0xff;

        let encrypted = encrypt(b"secret data", &key).expect("encryption should succeed");
        let result = decrypt(&encrypted, &wrong_key);

        assert!(result.is_err());
        match result.unwrap_err() {
            CryptoError::DecryptionFailed(_) => {}
            other => panic!("expected DecryptionFailed, got {:?}", other),
        }
    }

    #[test]
    fn decrypt_with_tampered_ciphertext_fails() {
        let key = test_key();
        let mut encrypted = encrypt(b"tamper test", &key).expect("encryption should succeed");

        // Flip a byte in the ciphertext portion (after the nonce).
        let last = encrypted.len() - 1;
        encrypted[last] ^= 0xff;

        let result = decrypt(&encrypted, &key);
        assert!(result.is_err());
    }

    #[test]
    fn decrypt_too_short_input_fails() {
        let key = test_key();

        let result = decrypt(&[0u8; 5], &key);
        assert!(result.is_err());
        match result.unwrap_err() {
            CryptoError::InvalidInput(msg) => {
                assert!(msg.contains("too short"));
            }
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn decrypt_empty_input_fails() {
        let key = test_key();
        let result = decrypt(&[], &key);
        assert!(result.is_err());
    }

    #[test]
    fn secret_key_roundtrip() {
        let secret = [0x46u8; 32];
        let payload = encrypt_with_secret_key("memo for later", &secret).unwrap();
        assert!(hex::decode(&payload).is_ok());
        assert_eq!(decrypt_with_secret_key(&payload, &secret).unwrap(), "memo for later");
        assert_eq!(
            decrypt_with_secret_key(&format!("0x{payload}"), &secret).unwrap(),
            "memo for later"
        );
    }

    #[test]
    fn secret_key_aes_key_is_sha256() {
        let key = aes_key_from_secret_key(&[0u8; 32]).unwrap();
        assert_eq!(
            hex::encode(*key),
            "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925"
        );
    }

    #[test]
    fn other_secret_key_cannot_decrypt() {
        let payload = encrypt_with_secret_key("private", &[1u8; 32]).unwrap();
        assert!(matches!(
            decrypt_with_secret_key(&payload, &[2u8; 32]),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn secret_key_must_be_32_bytes() {
        assert!(matches!(
            encrypt_with_secret_key("x", &[1u8; 16]),
            Err(CryptoError::SecretKeyLength(16))
        ));
        assert!(decrypt_with_secret_key("zz", &[1u8; 32]).is_err());
    }
}
