//! Fee tier arithmetic.

use chain_evm::U256;

use crate::error::ProtocolError;
use crate::types::FeeEstimate;

/// Upper bound passed to `eth_estimateGas` for native transfers.
pub const MAX_GAS_ESTIMATE: u64 = 300_000;

/// Gas limit of transactions relayed by WalletConnect.
pub const WALLET_CONNECT_GAS_LIMIT: u64 = 300_000;

/// `medium = gas * gas_price`; `low` and `high` step half of it down and up.
pub fn fee_tiers(gas: U256, gas_price: U256) -> FeeEstimate {
    let medium = gas.saturating_mul(gas_price);
    let step = medium / U256::from(2u8);
    FeeEstimate {
        low: medium - step,
        medium,
        high: medium.saturating_add(step),
    }
}

/// Smallest gas price for which `gas_limit * gas_price >= fee`.
///
/// A zero fee yields a zero price; a positive fee needs a positive limit.
pub fn gas_price_for_fee(fee: U256, gas_limit: U256) -> Result<U256, ProtocolError> {
    if fee.is_zero() {
        return Ok(U256::ZERO);
    }
    if gas_limit.is_zero() {
        return Err(ProtocolError::InvalidValue(
            "node estimated a gas limit of zero".into(),
        ));
    }
    Ok(ceil_div(fee, gas_limit))
}

/// `ceil(amount / parts)`, the per-recipient share used for max-amount quotes.
pub fn split_evenly(amount: U256, parts: usize) -> U256 {
    if parts <= 1 {
        return amount;
    }
    ceil_div(amount, U256::from(parts))
}

fn ceil_div(value: U256, divisor: U256) -> U256 {
    let quotient = value / divisor;
    if quotient * divisor == value {
        quotient
    } else {
        quotient + U256::from(1u8)
    }
}
