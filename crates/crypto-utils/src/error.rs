use thiserror::Error;

/// Failures of message encryption: AES-256-GCM under a key bound to the
/// account's secret key, or ECIES to a secp256k1 public key.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("message encryption failed: {0}")]
    EncryptionFailed(String),

    /// Wrong key, tampered payload or non UTF-8 plaintext.
    #[error("message decryption failed: {0}")]
    DecryptionFailed(String),

    /// Secret keys are raw 32-byte secp256k1 scalars.
    #[error("secret key must be 32 bytes, got {0}")]
    SecretKeyLength(usize),

    /// Malformed payload hex or recipient key.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
