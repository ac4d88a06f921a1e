use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use sha3::{Digest, Keccak256};

use crate::error::EvmError;
use crate::quantity::strip_hex_prefix;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Derives the EIP-55 checksummed address of a secp256k1 public key.
///
/// Accepts either the 33-byte compressed or the 65-byte uncompressed SEC1
/// encoding. The address is the last 20 bytes of the Keccak-256 hash of the
/// 64-byte uncompressed point (without the `0x04` prefix).
pub fn address_from_public_key(public_key: &[u8]) -> Result<String, EvmError> {
    Ok(to_checksum(&address_bytes_from_public_key(public_key)?))
}

/// Same as [`address_from_public_key`], returning the raw 20 bytes.
pub fn address_bytes_from_public_key(public_key: &[u8]) -> Result<[u8; ADDRESS_LEN], EvmError> {
    let key = match public_key.len() {
        33 | 65 => PublicKey::from_sec1_bytes(public_key)
            .map_err(|e| EvmError::InvalidPublicKey(format!("not a secp256k1 point: {e}")))?,
        len => {
            return Err(EvmError::InvalidPublicKey(format!(
                "expected 33 or 65 bytes, got {len}"
            )))
        }
    };
    Ok(address_bytes_from_key(&key))
}

/// Address of the public key belonging to a 32-byte secret key.
pub fn address_from_secret_key(secret_key: &[u8]) -> Result<String, EvmError> {
    let secret = SecretKey::from_slice(secret_key)
        .map_err(|e| EvmError::InvalidPrivateKey(e.to_string()))?;
    Ok(to_checksum(&address_bytes_from_key(&secret.public_key())))
}

pub(crate) fn address_bytes_from_key(key: &PublicKey) -> [u8; ADDRESS_LEN] {
    let uncompressed = key.to_encoded_point(false);
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);

    let mut addr = [0u8; ADDRESS_LEN];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Renders 20 address bytes with the EIP-55 mixed-case checksum.
///
/// Each letter of the lowercase hex form is uppercased iff the nibble at the
/// same position of `keccak256(lowercase_hex)` is 8 or more.
pub fn to_checksum(addr: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(addr);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + 2 * ADDRESS_LEN);
    out.push_str("0x");

    for (i, c) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Parses `0x` + 40 hex characters (any case) into 20 bytes.
///
/// The checksum is not enforced here; use [`validate_address`] for that.
pub fn parse_address(address: &str) -> Result<[u8; ADDRESS_LEN], EvmError> {
    let trimmed = address.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(EvmError::InvalidAddress("address must start with 0x".into()));
    }
    let hex_part = strip_hex_prefix(trimmed);

    if hex_part.len() != 2 * ADDRESS_LEN {
        return Err(EvmError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|_| EvmError::InvalidAddress("address contains non-hex characters".into()))?;

    let mut addr = [0u8; ADDRESS_LEN];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Applies the EIP-55 checksum to an address string in any case.
pub fn checksum_address(address: &str) -> Result<String, EvmError> {
    Ok(to_checksum(&parse_address(address)?))
}

/// Validates an address string.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted as long as they are well formed. Mixed case must match EIP-55.
pub fn validate_address(address: &str) -> Result<bool, EvmError> {
    let bytes = parse_address(address)?;
    let hex_part = strip_hex_prefix(address.trim());

    let is_all_lower = !hex_part.chars().any(|c| c.is_ascii_uppercase());
    let is_all_upper = !hex_part.chars().any(|c| c.is_ascii_lowercase());

    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    Ok(strip_hex_prefix(&to_checksum(&bytes)) == hex_part)
}
