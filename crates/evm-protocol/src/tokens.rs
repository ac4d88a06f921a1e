use serde::{Deserialize, Serialize};

/// Immutable description of an ERC-20 token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Erc20TokenMetadata {
    pub name: String,
    pub identifier: String,
    pub symbol: String,
    pub market_symbol: String,
    pub contract_address: String,
    pub decimals: u8,
}

impl Erc20TokenMetadata {
    fn known(name: &str, identifier: &str, symbol: &str, contract_address: &str) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            symbol: symbol.into(),
            market_symbol: "bnb".into(),
            contract_address: contract_address.into(),
            decimals: 18,
        }
    }
}

/// Tokens shipped with the BSC mainnet protocol.
pub fn known_tokens() -> Vec<Erc20TokenMetadata> {
    vec![
        Erc20TokenMetadata::known(
            "Binance-Peg BSC-USD",
            "bsc-erc20-usdt",
            "BSC-USD",
            "0x55d398326f99059fF775485246999027B3197955",
        ),
        Erc20TokenMetadata::known(
            "Binance-Peg Ethereum Token",
            "bsc-erc20-eth",
            "ETH",
            "0x2170Ed0880ac9A755fd29B2688956BD959F933F8",
        ),
    ]
}

pub fn token_by_identifier(identifier: &str) -> Option<Erc20TokenMetadata> {
    known_tokens()
        .into_iter()
        .find(|token| token.identifier == identifier)
}
