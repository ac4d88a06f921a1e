//! EIP-191 `personal_sign` messages.

use sha3::{Digest, Keccak256};

use crate::address::{parse_address, to_checksum};
use crate::error::EvmError;
use crate::signature::{recover_address, sign_hash, RecoverableSignature};

/// `keccak256("\x19Ethereum Signed Message:\n" || len(message) || message)`.
pub fn hash_personal_message(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

/// Signs `message` and returns `r || s || v` with `v` 27 or 28.
pub fn sign_personal_message(message: &[u8], secret_key: &[u8]) -> Result<[u8; 65], EvmError> {
    let signature = sign_hash(secret_key, &hash_personal_message(message))?;
    Ok(signature.to_rsv(27 + signature.y_parity))
}

/// Recovers the checksummed address that produced `signature` over `message`.
///
/// Accepts `v` as 27/28 or 0/1.
pub fn recover_personal_signer(message: &[u8], signature: &[u8]) -> Result<String, EvmError> {
    if signature.len() != 65 {
        return Err(EvmError::Signing(format!(
            "expected a 65-byte signature, got {}",
            signature.len()
        )));
    }

    let y_parity = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        v => return Err(EvmError::Signing(format!("invalid v value {v}"))),
    };

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..64]);

    let address = recover_address(
        &hash_personal_message(message),
        &RecoverableSignature { r, s, y_parity },
    )?;
    Ok(to_checksum(&address))
}

/// `true` iff `signature` over `message` was made by `address`.
pub fn verify_personal_message(
    message: &[u8],
    signature: &[u8],
    address: &str,
) -> Result<bool, EvmError> {
    let expected = parse_address(address)?;
    let recovered = recover_personal_signer(message, signature)?;
    Ok(parse_address(&recovered)? == expected)
}
