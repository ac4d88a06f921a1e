use alloy_primitives::U256;

use crate::abi::{
    encode_function_call, selector, selector_bytes, strip_leading_zeros, AbiParam, WORD_HEX_LEN,
};
use crate::address::parse_address;
use crate::error::EvmError;
use crate::quantity::{encode_hex_data, strip_hex_prefix};

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";
pub const NAME_SIGNATURE: &str = "name()";
pub const SYMBOL_SIGNATURE: &str = "symbol()";
pub const DECIMALS_SIGNATURE: &str = "decimals()";

/// Recipient and amount recovered from `transfer(address,uint256)` call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    /// Lowercase `0x`-prefixed 20-byte recipient.
    pub recipient: String,
    pub amount: U256,
}

/// Encodes an ERC-20 `transfer(address,uint256)` call as `0x`-prefixed hex.
pub fn encode_transfer(recipient: &str, amount: U256) -> Result<String, EvmError> {
    let addr = parse_address(recipient)?;
    let params = [AbiParam::Address(addr), AbiParam::Uint256(amount)];
    Ok(encode_hex_data(&encode_function_call(
        selector_bytes(TRANSFER_SIGNATURE),
        &params,
    )))
}

/// Encodes an ERC-20 `balanceOf(address)` call as `0x`-prefixed hex.
pub fn encode_balance_of(owner: &str) -> Result<String, EvmError> {
    let addr = parse_address(owner)?;
    Ok(encode_hex_data(&encode_function_call(
        selector_bytes(BALANCE_OF_SIGNATURE),
        &[AbiParam::Address(addr)],
    )))
}

/// Call data of a zero-argument view function, e.g. `name()`.
pub fn encode_view_call(signature: &str) -> String {
    selector(signature)
}

/// Decodes `transfer(address,uint256)` call data.
///
/// Fails with [`EvmError::InvalidValue`] unless the data starts with the
/// transfer selector and carries two full argument words.
pub fn decode_transfer(data: &str) -> Result<TransferCall, EvmError> {
    let digits = strip_hex_prefix(data.trim()).to_ascii_lowercase();
    if !digits.is_ascii() {
        return Err(EvmError::InvalidValue("call data is not hex".into()));
    }
    let method_id = strip_hex_prefix(&selector(TRANSFER_SIGNATURE)).to_string();

    let params = digits
        .strip_prefix(method_id.as_str())
        .ok_or_else(|| EvmError::InvalidValue("unexpected method ID".into()))?;

    if params.len() < 2 * WORD_HEX_LEN {
        return Err(EvmError::InvalidValue(format!(
            "transfer call data needs {} hex characters of arguments, got {}",
            2 * WORD_HEX_LEN,
            params.len()
        )));
    }

    let recipient_word = &params[..WORD_HEX_LEN];
    let amount_word = &params[WORD_HEX_LEN..2 * WORD_HEX_LEN];

    // Keep all 40 address nibbles even when the address itself starts with
    // zeros; only the word padding is dropped.
    let recipient = strip_leading_zeros(recipient_word);
    if recipient.len() > 40 {
        return Err(EvmError::InvalidValue(format!(
            "transfer recipient word 0x{recipient_word} is not an address"
        )));
    }
    let recipient = format!("0x{recipient:0>40}");

    let amount = strip_leading_zeros(amount_word);
    let amount = if amount.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(amount, 16)
            .map_err(|e| EvmError::InvalidValue(format!("invalid transfer amount: {e}")))?
    };

    Ok(TransferCall { recipient, amount })
}

/// `true` if `data` carries no call data at all (`""` or `"0x"`).
pub fn is_blank_data(data: &str) -> bool {
    strip_hex_prefix(data.trim()).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: &str = "0x000000000000000000000000000000000000dEaD";

    #[test]
    fn encode_transfer_layout() {
        let data = encode_transfer(RECIPIENT, U256::from(100u64)).unwrap();

        assert!(data.starts_with("0xa9059cbb"));
        // 0x + 8 selector chars + two words.
        assert_eq!(data.len(), 2 + 8 + 128);
        assert!(data.ends_with(&format!("{:064x}", 100)));
        assert!(data.contains("000000000000000000000000000000000000dead"));
    }

    #[test]
    fn encode_transfer_full_calldata_matches_expected() {
        let data = encode_transfer(
            "0xabababababababababababababababababababab",
            U256::from(1_000_000_000_000_000_000u128),
        )
        .unwrap();
        assert_eq!(
            data,
            "0xa9059cbb000000000000000000000000abababababababababababababababababababab\
             0000000000000000000000000000000000000000000000000de0b6b3a7640000"
        );
    }

    #[test]
    fn encode_transfer_invalid_address() {
        assert!(encode_transfer("not-an-address", U256::ZERO).is_err());
    }

    #[test]
    fn encode_balance_of_layout() {
        let data = encode_balance_of(RECIPIENT).unwrap();
        assert!(data.starts_with("0x70a08231"));
        assert_eq!(data.len(), 2 + 8 + 64);
    }

    #[test]
    fn decode_transfer_recovers_arguments() {
        let amount = U256::from(123_456_789u64);
        let data = encode_transfer(RECIPIENT, amount).unwrap();

        let call = decode_transfer(&data).unwrap();
        assert_eq!(call.recipient, RECIPIENT.to_lowercase());
        assert_eq!(call.amount, amount);
    }

    #[test]
    fn decode_transfer_handles_max_amount_and_zero() {
        let data = encode_transfer(RECIPIENT, U256::MAX).unwrap();
        assert_eq!(decode_transfer(&data).unwrap().amount, U256::MAX);

        let data = encode_transfer(RECIPIENT, U256::ZERO).unwrap();
        assert_eq!(decode_transfer(&data).unwrap().amount, U256::ZERO);
    }

    #[test]
    fn decode_transfer_accepts_missing_prefix() {
        let data = encode_transfer(RECIPIENT, U256::from(1u64)).unwrap();
        let call = decode_transfer(data.trim_start_matches("0x")).unwrap();
        assert_eq!(call.amount, U256::from(1u64));
    }

    #[test]
    fn decode_transfer_rejects_other_selector() {
        let data = encode_balance_of(RECIPIENT).unwrap();
        match decode_transfer(&data) {
            Err(EvmError::InvalidValue(msg)) => assert!(msg.contains("method ID")),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn decode_transfer_rejects_truncated_arguments() {
        let data = encode_transfer(RECIPIENT, U256::from(1u64)).unwrap();
        assert!(decode_transfer(&data[..data.len() - 2]).is_err());
    }

    #[test]
    fn blank_data() {
        assert!(is_blank_data(""));
        assert!(is_blank_data("0x"));
        assert!(!is_blank_data("0xa9059cbb"));
    }

    #[test]
    fn view_calls_are_bare_selectors() {
        assert_eq!(encode_view_call(NAME_SIGNATURE), "0x06fdde03");
        assert_eq!(encode_view_call(DECIMALS_SIGNATURE), "0x313ce567");
    }
}
