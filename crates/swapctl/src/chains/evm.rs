use crate::config::ChainConfig;
use alloy::{
    network::ReceiptResponse,
    primitives::{Address, Bytes, B256},
    providers::{Provider as _, RootProvider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use eyre::Context as _;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type EvmProvider = RootProvider;

/// The outcome of a mined transaction, as far as the swap protocol cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: u64,
}

impl From<&TransactionReceipt> for TxReceipt {
    fn from(r: &TransactionReceipt) -> Self {
        Self {
            tx_hash: ReceiptResponse::transaction_hash(r),
            block_number: ReceiptResponse::block_number(r),
            success: ReceiptResponse::status(r),
            gas_used: ReceiptResponse::gas_used(r),
        }
    }
}

/// The JSON-RPC surface the swap protocol needs from a node.
///
/// One call per method, no retries: a failed request is returned to the caller as-is.
pub trait ChainClient {
    fn chain_id(&self) -> u64;

    /// Pending transaction count for `addr`.
    async fn nonce(&self, addr: Address) -> eyre::Result<u64>;

    async fn gas_price(&self) -> eyre::Result<u128>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> eyre::Result<u64>;

    /// Read-only `eth_call`.
    async fn call(&self, tx: &TransactionRequest) -> eyre::Result<Bytes>;

    /// Broadcast signed EIP-2718 bytes. Returns as soon as the node accepts the transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> eyre::Result<B256>;

    /// `None` while the transaction is not yet mined.
    async fn transaction_receipt(&self, tx_hash: B256) -> eyre::Result<Option<TxReceipt>>;
}

#[derive(Debug, Clone)]
pub struct EvmChain {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    provider: EvmProvider,
}

impl EvmChain {
    pub fn connect(cfg: &ChainConfig) -> eyre::Result<Self> {
        let provider = provider_for_url(&cfg.rpc_url)?;
        Ok(Self {
            name: cfg.name.clone(),
            chain_id: cfg.chain_id,
            rpc_url: cfg.rpc_url.clone(),
            provider,
        })
    }

    /// Chain id reported by the node (as opposed to the configured one).
    pub async fn remote_chain_id(&self) -> eyre::Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .with_context(|| format!("get chain id from {} ({})", self.name, self.rpc_url))
    }

    pub async fn block_number(&self) -> eyre::Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("get block number")
    }
}

fn provider_for_url(url: &str) -> eyre::Result<EvmProvider> {
    let u: reqwest::Url = url
        .parse()
        .with_context(|| format!("invalid rpc url: {url}"))?;
    let client = Client::builder()
        .timeout(DEFAULT_RPC_TIMEOUT)
        .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
        .build()
        .context("build rpc http client")?;
    let http = alloy::transports::http::Http::with_client(client, u);
    let rpc_client = alloy::rpc::client::RpcClient::new(http, false);
    Ok(RootProvider::new(rpc_client))
}

impl ChainClient for EvmChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn nonce(&self, addr: Address) -> eyre::Result<u64> {
        self.provider
            .get_transaction_count(addr)
            .pending()
            .await
            .context("get nonce")
    }

    async fn gas_price(&self) -> eyre::Result<u128> {
        self.provider.get_gas_price().await.context("get gas price")
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> eyre::Result<u64> {
        self.provider
            .estimate_gas(tx.clone())
            .await
            .context("estimate gas")
    }

    async fn call(&self, tx: &TransactionRequest) -> eyre::Result<Bytes> {
        self.provider.call(tx.clone()).await.context("eth_call")
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> eyre::Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .context("broadcast raw tx")?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> eyre::Result<Option<TxReceipt>> {
        let r = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .context("get transaction receipt")?;
        Ok(r.as_ref().map(TxReceipt::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        let r = provider_for_url("not a url");
        assert!(r.is_err(), "expected error for malformed url");
        if let Err(e) = r {
            assert!(e.to_string().contains("invalid rpc url"), "got: {e}");
        }
    }

    #[test]
    fn connect_keeps_configured_chain_id() -> eyre::Result<()> {
        let cfg = ChainConfig {
            name: "local".to_owned(),
            chain_id: 31_337,
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            explorer_tx_url: "http://127.0.0.1/tx/".to_owned(),
        };
        let chain = EvmChain::connect(&cfg)?;
        assert_eq!(ChainClient::chain_id(&chain), 31_337);
        assert_eq!(chain.name, "local");
        Ok(())
    }
}
