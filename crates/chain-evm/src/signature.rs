use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::PublicKey;
use zeroize::Zeroize;

use crate::address::{address_bytes_from_key, ADDRESS_LEN};
use crate::error::EvmError;

/// A secp256k1 signature with its public key recovery bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1.
    pub y_parity: u8,
}

impl RecoverableSignature {
    /// `r || s || v`, the layout used by `personal_sign`.
    pub fn to_rsv(&self, v: u8) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = v;
        out
    }
}

fn signing_key(secret_key: &[u8]) -> Result<SigningKey, EvmError> {
    if secret_key.len() != 32 {
        return Err(EvmError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            secret_key.len()
        )));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(secret_key);
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| EvmError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    signing_key
}

/// Signs a 32-byte hash deterministically (RFC 6979) with a low-s signature.
pub fn sign_hash(secret_key: &[u8], hash: &[u8; 32]) -> Result<RecoverableSignature, EvmError> {
    let key = signing_key(secret_key)?;

    let (signature, recovery_id): (Signature, RecoveryId) = key
        .sign_prehash(hash)
        .map_err(|e| EvmError::Signing(e.to_string()))?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature.r().to_bytes());
    s.copy_from_slice(&signature.s().to_bytes());

    Ok(RecoverableSignature {
        r,
        s,
        y_parity: recovery_id.is_y_odd() as u8,
    })
}

/// Recovers the signer's address from a hash and signature.
pub fn recover_address(
    hash: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<[u8; ADDRESS_LEN], EvmError> {
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);

    let sig = Signature::from_slice(&rs)
        .map_err(|e| EvmError::Signing(format!("malformed signature: {e}")))?;
    let recovery_id = RecoveryId::from_byte(signature.y_parity)
        .ok_or_else(|| EvmError::Signing(format!("invalid recovery id {}", signature.y_parity)))?;

    let key = VerifyingKey::recover_from_prehash(hash, &sig, recovery_id)
        .map_err(|e| EvmError::Signing(format!("cannot recover signer: {e}")))?;

    Ok(address_bytes_from_key(&PublicKey::from(&key)))
}
