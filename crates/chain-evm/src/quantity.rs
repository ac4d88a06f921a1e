//! Hex helpers for JSON-RPC quantities and data strings.
//!
//! Quantities are rendered the way nodes expect them: `0x`-prefixed, no
//! leading zeros, `0x0` for zero. Parsing is lenient and also accepts
//! decimal strings, since unsigned transactions built elsewhere may carry
//! decimal values.

use alloy_primitives::U256;

use crate::error::EvmError;

/// Strips an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Renders `value` as a minimal `0x`-prefixed quantity.
pub fn to_quantity(value: U256) -> String {
    format!("0x{value:x}")
}

/// Renders a `u64` as a minimal `0x`-prefixed quantity.
pub fn u64_to_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

/// Parses a `0x` hex quantity or a plain decimal string.
///
/// A bare `0x` is read as zero.
pub fn parse_quantity(value: &str) -> Result<U256, EvmError> {
    let trimmed = value.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        let digits = strip_hex_prefix(trimmed);
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        return U256::from_str_radix(digits, 16)
            .map_err(|e| EvmError::InvalidValue(format!("invalid hex quantity {value:?}: {e}")));
    }

    if trimmed.is_empty() {
        return Err(EvmError::InvalidValue("empty quantity".into()));
    }

    U256::from_str_radix(trimmed, 10)
        .map_err(|e| EvmError::InvalidValue(format!("invalid decimal quantity {value:?}: {e}")))
}

/// Parses a quantity that must fit into a `u64` (nonces, gas limits).
pub fn parse_u64_quantity(value: &str) -> Result<u64, EvmError> {
    let parsed = parse_quantity(value)?;
    u64::try_from(parsed)
        .map_err(|_| EvmError::InvalidValue(format!("quantity {value:?} does not fit into u64")))
}

/// Decodes a `0x`-prefixed (or bare) hex data string. `0x` and the empty
/// string decode to no bytes.
pub fn decode_hex_data(value: &str) -> Result<Vec<u8>, EvmError> {
    let digits = strip_hex_prefix(value.trim());
    if digits.len() % 2 != 0 {
        return Err(EvmError::InvalidValue(format!(
            "hex data must have an even number of digits, got {}",
            digits.len()
        )));
    }
    hex::decode(digits).map_err(|e| EvmError::InvalidValue(format!("invalid hex data: {e}")))
}

/// Encodes bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Interprets big-endian bytes (at most 32) as an unsigned integer.
pub fn u256_from_be_slice(bytes: &[u8]) -> Result<U256, EvmError> {
    U256::try_from_be_slice(bytes)
        .ok_or_else(|| EvmError::InvalidValue(format!("{} bytes do not fit into uint256", bytes.len())))
}
