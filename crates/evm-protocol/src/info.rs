//! History provider seam and multi-address aggregation.

use async_trait::async_trait;

use crate::config::ProtocolNetwork;
use crate::error::ProtocolError;
use crate::types::{TransactionCursor, TransactionsResult, TransferDescription};

/// One address worth of history as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoTransactions {
    pub transactions: Vec<TransferDescription>,
    /// Page the provider would serve next.
    pub page: u64,
}

/// Block-explorer backed transaction history.
#[async_trait]
pub trait InfoClient: Send + Sync {
    async fn fetch_transactions(
        &self,
        address: &str,
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<InfoTransactions, ProtocolError>;

    async fn fetch_contract_transactions(
        &self,
        contract: &str,
        address: &str,
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<InfoTransactions, ProtocolError>;
}

/// Merges per-address results.
///
/// The page is the maximum across results and is only handed back when
/// another page is expected, i.e. when at least `limit` entries came back.
pub fn aggregate(
    results: Vec<InfoTransactions>,
    limit: usize,
    network: &ProtocolNetwork,
) -> TransactionsResult {
    let page = results.iter().map(|r| r.page).max().unwrap_or_default();

    let transactions: Vec<TransferDescription> = results
        .into_iter()
        .flat_map(|r| r.transactions)
        .map(|tx| TransferDescription {
            network: network.clone(),
            ..tx
        })
        .collect();

    let has_next = transactions.len() >= limit;

    TransactionsResult {
        transactions,
        cursor: TransactionCursor {
            has_next,
            page: has_next.then_some(page),
        },
    }
}

#[cfg(test)]
mod tests {
    use chain_evm::U256;

    use super::*;

    fn entry(hash: &str) -> TransferDescription {
        TransferDescription {
            from: vec!["0x01".into()],
            to: vec!["0x02".into()],
            is_inbound: false,
            amount: U256::from(1u8),
            fee: U256::from(2u8),
            network: ProtocolNetwork::bsc_testnet(),
            arbitrary_data: "0x".into(),
            hash: Some(hash.into()),
            chain_id: None,
            nonce: None,
            warnings: Vec::new(),
        }
    }

    fn page(hashes: &[&str], page: u64) -> InfoTransactions {
        InfoTransactions {
            transactions: hashes.iter().map(|h| entry(h)).collect(),
            page,
        }
    }

    #[test]
    fn full_page_keeps_max_page() {
        let result = aggregate(
            vec![page(&["a", "b"], 2), page(&["c"], 5)],
            3,
            &ProtocolNetwork::bsc_mainnet(),
        );
        assert_eq!(result.transactions.len(), 3);
        assert!(result.cursor.has_next);
        assert_eq!(result.cursor.page, Some(5));
        assert!(result
            .transactions
            .iter()
            .all(|tx| tx.network == ProtocolNetwork::bsc_mainnet()));
    }

    #[test]
    fn short_page_has_no_next() {
        let result = aggregate(vec![page(&["a"], 2)], 10, &ProtocolNetwork::bsc_mainnet());
        assert!(!result.cursor.has_next);
        assert_eq!(result.cursor.page, None);
    }

    #[test]
    fn order_follows_addresses() {
        let result = aggregate(
            vec![page(&["a", "b"], 1), page(&["c"], 1)],
            10,
            &ProtocolNetwork::bsc_mainnet(),
        );
        let hashes: Vec<_> = result
            .transactions
            .iter()
            .map(|tx| tx.hash.clone().unwrap())
            .collect();
        assert_eq!(hashes, ["a", "b", "c"]);
    }
}
