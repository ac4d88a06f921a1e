/// Display name of an EVM chain id, falling back to `Chain ID {id}`.
pub fn chain_name(chain_id: u64) -> String {
    let name = match chain_id {
        56 => "Binance Smart Chain Mainnet",
        97 => "Binance Smart Chain Testnet",
        128 => "Huobi ECO Chain Mainnet",
        256 => "Huobi ECO Chain Testnet",
        25 => "Cronos Mainnet",
        338 => "Cronos Testnet",
        _ => return format!("Chain ID {chain_id}"),
    };
    name.to_string()
}
