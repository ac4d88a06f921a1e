//! Minimal ABI encoding for EVM function calls.
//!
//! Just enough to build and read ERC-20 call data and the string/number
//! returns of `name()`, `symbol()` and `decimals()` without pulling in a full
//! ABI parser. Words are 32 bytes, i.e. 64 hex characters.

use alloy_primitives::U256;
use sha3::{Digest, Keccak256};

use crate::error::EvmError;
use crate::quantity::{decode_hex_data, strip_hex_prefix};

/// Hex length of one ABI word.
pub const WORD_HEX_LEN: usize = 64;

/// A single ABI-encoded parameter.
#[derive(Debug, Clone)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer.
    Uint256(U256),
}

/// Computes the 4-byte selector of a function signature such as
/// `"transfer(address,uint256)"`.
pub fn selector_bytes(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    selector
}

/// Same as [`selector_bytes`], rendered as `0x` + 8 hex characters.
pub fn selector(signature: &str) -> String {
    format!("0x{}", hex::encode(selector_bytes(signature)))
}

/// Encodes a function call as `selector || word(params[0]) || ...`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + params.len() * 32);
    data.extend_from_slice(&selector);

    for param in params {
        data.extend_from_slice(&encode_param(param));
    }

    data
}

fn encode_param(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint256(value) => value.to_be_bytes::<32>(),
    }
}

/// Left-pads a hex string (without `0x`) with zero nibbles until it is at
/// least `min_len` characters long and of even length. Never truncates.
pub fn pad_left(value: &str, min_len: usize) -> String {
    let mut width = value.len().max(min_len);
    if width % 2 != 0 {
        width += 1;
    }
    format!("{value:0>width$}")
}

/// Pads to one ABI word.
pub fn pad_word(value: &str) -> String {
    pad_left(value, WORD_HEX_LEN)
}

/// Removes leading zero nibbles. An all-zero input yields the empty string.
pub fn strip_leading_zeros(value: &str) -> &str {
    value.trim_start_matches('0')
}

fn word_at(bytes: &[u8], offset: usize) -> Result<U256, EvmError> {
    let end = offset
        .checked_add(32)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            EvmError::InvalidValue(format!(
                "ABI word at offset {offset} is out of bounds ({} bytes)",
                bytes.len()
            ))
        })?;
    Ok(U256::from_be_slice(&bytes[offset..end]))
}

fn to_usize(value: U256, what: &str) -> Result<usize, EvmError> {
    usize::try_from(value).map_err(|_| EvmError::InvalidValue(format!("ABI {what} {value} is too large")))
}

/// Decodes a dynamic `bytes`/`string` return value.
///
/// The first word is a byte offset into the payload; the word at that offset
/// is the length; the `length` bytes after it are the value.
pub fn decode_dynamic_bytes(payload: &str) -> Result<Vec<u8>, EvmError> {
    let bytes = decode_hex_data(payload)?;
    let offset = to_usize(word_at(&bytes, 0)?, "offset")?;
    let length = to_usize(word_at(&bytes, offset)?, "length")?;

    let start = offset + 32;
    let end = start
        .checked_add(length)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            EvmError::InvalidValue(format!(
                "ABI bytes of length {length} at offset {offset} exceed the payload"
            ))
        })?;

    Ok(bytes[start..end].to_vec())
}

/// Decodes a single `uint256` return word (e.g. `balanceOf`, `decimals`).
pub fn decode_uint256(payload: &str) -> Result<U256, EvmError> {
    let digits = strip_hex_prefix(payload);
    if digits.is_empty() {
        return Err(EvmError::InvalidValue("empty uint256 return value".into()));
    }
    if digits.len() > WORD_HEX_LEN {
        let bytes = decode_hex_data(digits)?;
        return word_at(&bytes, 0);
    }
    U256::from_str_radix(digits, 16).map_err(|e| EvmError::InvalidValue(format!("invalid uint256 word: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_selectors() {
        assert_eq!(selector("transfer(address,uint256)"), "0xa9059cbb");
        assert_eq!(selector("balanceOf(address)"), "0x70a08231");
        assert_eq!(selector("name()"), "0x06fdde03");
        assert_eq!(selector("symbol()"), "0x95d89b41");
        assert_eq!(selector("decimals()"), "0x313ce567");
    }

    #[test]
    fn encode_function_call_with_params() {
        let mut addr = [0u8; 20];
        addr[19] = 0x01;

        let params = [AbiParam::Address(addr), AbiParam::Uint256(U256::from(100u64))];
        let data = encode_function_call(selector_bytes("transfer(address,uint256)"), &params);

        assert_eq!(data.len(), 68);
        assert_eq!(&data[4..16], &[0u8; 12]);
        assert_eq!(data[35], 0x01);
        assert_eq!(data[67], 100);
    }

    #[test]
    fn pad_left_reaches_word_and_even_length() {
        assert_eq!(pad_word("ab").len(), 64);
        assert!(pad_word("ab").ends_with("ab"));
        assert_eq!(pad_left("abc", 2), "0abc");
        assert_eq!(pad_left("abc", 4), "0abc");
    }

    #[test]
    fn pad_left_never_truncates() {
        let long = "f".repeat(70);
        assert_eq!(pad_word(&long), long);
        let odd = "f".repeat(65);
        assert_eq!(pad_word(&odd).len(), 66);
    }

    #[test]
    fn strip_leading_zeros_variants() {
        assert_eq!(strip_leading_zeros("000abc"), "abc");
        assert_eq!(strip_leading_zeros("abc"), "abc");
        assert_eq!(strip_leading_zeros("0000"), "");
    }

    #[test]
    fn decode_dynamic_string() {
        // ABI encoding of the string "Wrapped BNB".
        let payload = format!(
            "0x{}{}{}",
            pad_word("20"),
            pad_word("0b"),
            format!("{:0<64}", hex::encode("Wrapped BNB"))
        );
        let decoded = decode_dynamic_bytes(&payload).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Wrapped BNB");
    }

    #[test]
    fn decode_dynamic_bytes_out_of_bounds() {
        let payload = format!("0x{}{}", pad_word("20"), pad_word("ff"));
        assert!(matches!(decode_dynamic_bytes(&payload), Err(EvmError::InvalidValue(_))));
        assert!(decode_dynamic_bytes("0x").is_err());
        let bad_offset = format!("0x{}", pad_word("1000"));
        assert!(decode_dynamic_bytes(&bad_offset).is_err());
    }

    #[test]
    fn decode_uint256_word() {
        let word = format!("0x{}", pad_word("12"));
        assert_eq!(decode_uint256(&word).unwrap(), U256::from(18u64));
        assert_eq!(decode_uint256("0x12").unwrap(), U256::from(18u64));
        assert!(decode_uint256("0x").is_err());
    }
}
