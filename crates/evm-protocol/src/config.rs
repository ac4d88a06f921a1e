//! Network and protocol configuration passed at construction.

use chain_evm::derivation::DEFAULT_ACCOUNT_PATH;
use chain_evm::U256;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{FeeEstimate, UnitMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Custom,
}

/// Node endpoint and chain of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolNetwork {
    pub name: String,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub rpc_url: String,
    pub block_explorer_url: String,
    pub block_explorer_api: String,
    pub chain_id: u64,
}

impl ProtocolNetwork {
    pub fn bsc_mainnet() -> Self {
        Self {
            name: "Mainnet".into(),
            network_type: NetworkType::Mainnet,
            rpc_url: "https://bsc-dataseed.binance.org".into(),
            block_explorer_url: "https://bscscan.com".into(),
            block_explorer_api: "https://api.bscscan.com/api".into(),
            chain_id: 56,
        }
    }

    pub fn bsc_testnet() -> Self {
        Self {
            name: "Testnet".into(),
            network_type: NetworkType::Testnet,
            rpc_url: "https://bsc-testnet-dataseed.bnbchain.org".into(),
            block_explorer_url: "https://testnet.bscscan.com".into(),
            block_explorer_api: "https://api-testnet.bscscan.com/api".into(),
            chain_id: 97,
        }
    }

    /// Reads a network from a TOML document such as:
    ///
    /// ```toml
    /// name = "Local"
    /// type = "custom"
    /// rpc_url = "http://127.0.0.1:8545"
    /// block_explorer_url = ""
    /// block_explorer_api = ""
    /// chain_id = 1337
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ProtocolError> {
        Ok(toml::from_str(source)?)
    }
}

impl Default for ProtocolNetwork {
    fn default() -> Self {
        Self::bsc_mainnet()
    }
}

/// 21000 gas at 10 / 15 / 40 gwei.
pub fn default_fee_estimate() -> FeeEstimate {
    FeeEstimate {
        low: U256::from(210_000_000_000_000u64),
        medium: U256::from(315_000_000_000_000u64),
        high: U256::from(840_000_000_000_000u64),
    }
}

/// BNB, GWEI and WEI.
pub fn native_units() -> Vec<UnitMetadata> {
    vec![
        UnitMetadata::new("BNB", Some("bnb"), 18),
        UnitMetadata::new("GWEI", None, 9),
        UnitMetadata::new("WEI", None, 0),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolOptions {
    pub network: ProtocolNetwork,
    pub identifier: String,
    pub name: String,
    pub units: Vec<UnitMetadata>,
    pub main_unit: String,
    pub fee_defaults: FeeEstimate,
    /// Hardened account root under which `/{visibility}/{address}` is derived.
    pub standard_derivation_path: String,
}

impl ProtocolOptions {
    /// Native BNB protocol on `network`.
    pub fn bsc(network: ProtocolNetwork) -> Self {
        Self {
            network,
            identifier: "bsc".into(),
            name: "BSC".into(),
            units: native_units(),
            main_unit: "BNB".into(),
            fee_defaults: default_fee_estimate(),
            standard_derivation_path: DEFAULT_ACCOUNT_PATH.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks() {
        assert_eq!(ProtocolNetwork::bsc_mainnet().chain_id, 56);
        assert_eq!(ProtocolNetwork::bsc_testnet().chain_id, 97);
        assert_eq!(ProtocolNetwork::default(), ProtocolNetwork::bsc_mainnet());
    }

    #[test]
    fn network_from_toml() {
        let network = ProtocolNetwork::from_toml_str(
            r#"
            name = "Local"
            type = "custom"
            rpc_url = "http://127.0.0.1:8545"
            block_explorer_url = ""
            block_explorer_api = ""
            chain_id = 1337
            "#,
        )
        .unwrap();
        assert_eq!(network.network_type, NetworkType::Custom);
        assert_eq!(network.chain_id, 1337);
        assert_eq!(network.rpc_url, "http://127.0.0.1:8545");
    }

    #[test]
    fn incomplete_toml_is_rejected() {
        let err = ProtocolNetwork::from_toml_str("name = \"x\"").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidValue(_)));
    }

    #[test]
    fn default_fees_are_ordered() {
        let fees = default_fee_estimate();
        assert!(fees.low <= fees.medium && fees.medium <= fees.high);
    }

    #[test]
    fn bsc_options() {
        let options = ProtocolOptions::bsc(ProtocolNetwork::bsc_testnet());
        assert_eq!(options.main_unit, "BNB");
        let decimals: Vec<u8> = options.units.iter().map(|u| u.decimals).collect();
        assert_eq!(decimals, [18, 9, 0]);
        assert_eq!(options.units[0].market.as_deref(), Some("bnb"));
        assert_eq!(options.standard_derivation_path, "m/44'/60'/0'");
    }
}
