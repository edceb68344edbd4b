use crate::{errors::SwapError, tx::ReceiptWait};
use alloy::primitives::Address;
use eyre::Context as _;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr as _, time::Duration};

pub const BASE_MAINNET_RPC_URL: &str = "https://mainnet.base.org";

/// Uniswap V3 fee tiers are expressed in hundredths of a bip; 1_000_000 is 100%.
const MAX_POOL_FEE: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Display name, used in logs and `doctor`.
    pub name: String,
    /// EIP-155 chain id signed into every transaction.
    pub chain_id: u64,
    pub rpc_url: String,
    /// Explorer prefix; the `0x` tx hash is appended verbatim.
    pub explorer_tx_url: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            name: "base".into(),
            chain_id: 8453,
            rpc_url: BASE_MAINNET_RPC_URL.into(),
            explorer_tx_url: "https://basescan.org/tx/".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// `SwapRouter` (V3 `exactInputSingle` with deadline) contract address.
    pub address: String,
    /// Pool fee tier. 500 = 0.05%.
    pub fee: u32,
    /// Seconds added to the submission time for the swap deadline.
    pub deadline_seconds: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            // PancakeSwap V3 SwapRouter on Base.
            address: "0x1b81D678ffb9C0263b24A97847620C99d213eB14".into(),
            fee: 500,
            deadline_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub timeout_seconds: u64,
    pub poll_interval_ms: u64,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapctlConfig {
    pub chain: ChainConfig,
    pub router: RouterConfig,
    pub receipt: ReceiptConfig,

    /// Optional expected sender. When set, a signing key for any other address is refused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,

    /// Lowercase symbol -> token address. Token arguments not found here must be addresses.
    pub tokens: BTreeMap<String, String>,
}

impl Default for SwapctlConfig {
    fn default() -> Self {
        let tokens = [
            ("weth", "0x4200000000000000000000000000000000000006"),
            ("usdc", "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        Self {
            chain: ChainConfig::default(),
            router: RouterConfig::default(),
            receipt: ReceiptConfig::default(),
            sender: None,
            tokens,
        }
    }
}

fn parse_address(s: &str) -> eyre::Result<Address> {
    Address::from_str(s.trim()).with_context(|| format!("invalid address: {s}"))
}

impl SwapctlConfig {
    /// Resolve a token argument: a configured symbol (case-insensitive) or a hex address.
    pub fn resolve_token(&self, token: &str) -> Result<Address, SwapError> {
        let t = token.trim();
        let raw = self
            .tokens
            .get(&t.to_ascii_lowercase())
            .map_or(t, String::as_str);
        parse_address(raw).map_err(|e| SwapError::InvalidInput(format!("token {t:?}: {e:#}")))
    }

    pub fn router_address(&self) -> eyre::Result<Address> {
        parse_address(&self.router.address).context("router.address")
    }

    pub fn sender_address(&self) -> eyre::Result<Option<Address>> {
        self.sender
            .as_deref()
            .map(|s| parse_address(s).context("sender"))
            .transpose()
    }

    pub const fn receipt_wait(&self) -> ReceiptWait {
        ReceiptWait {
            timeout: Duration::from_secs(self.receipt.timeout_seconds),
            poll_interval: Duration::from_millis(self.receipt.poll_interval_ms),
        }
    }

    /// Reject values that would make every swap fail on-chain or never finish.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.chain.chain_id == 0 {
            eyre::bail!("chain.chain_id must be non-zero");
        }
        if self.chain.rpc_url.trim().is_empty() {
            eyre::bail!("chain.rpc_url is empty");
        }
        if self.router.fee > MAX_POOL_FEE {
            eyre::bail!("router.fee {} exceeds {MAX_POOL_FEE}", self.router.fee);
        }
        if self.router.deadline_seconds == 0 {
            eyre::bail!("router.deadline_seconds must be positive");
        }
        if self.receipt.timeout_seconds == 0 || self.receipt.poll_interval_ms == 0 {
            eyre::bail!("receipt.timeout_seconds and receipt.poll_interval_ms must be positive");
        }
        self.router_address()?;
        self.sender_address()?;
        for (sym, addr) in &self.tokens {
            parse_address(addr).with_context(|| format!("tokens.{sym}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_base() -> eyre::Result<()> {
        let cfg = SwapctlConfig::default();
        cfg.validate()?;
        assert_eq!(cfg.chain.chain_id, 8453);
        assert_eq!(cfg.router.fee, 500);
        assert_eq!(cfg.router.deadline_seconds, 600);
        assert_eq!(cfg.receipt_wait().timeout, Duration::from_secs(120));
        assert_eq!(
            cfg.router_address()?,
            Address::from_str("0x1b81D678ffb9C0263b24A97847620C99d213eB14")?
        );
        Ok(())
    }

    #[test]
    fn resolves_symbols_and_addresses() -> eyre::Result<()> {
        let cfg = SwapctlConfig::default();
        let weth = Address::from_str("0x4200000000000000000000000000000000000006")?;
        assert_eq!(cfg.resolve_token("WETH")?, weth);
        assert_eq!(cfg.resolve_token(" weth ")?, weth);
        assert_eq!(
            cfg.resolve_token("0x4200000000000000000000000000000000000006")?,
            weth
        );
        let r = cfg.resolve_token("doge");
        assert!(matches!(r, Err(SwapError::InvalidInput(_))), "got {r:?}");
        Ok(())
    }

    #[test]
    fn partial_toml_fills_defaults() -> eyre::Result<()> {
        let cfg: SwapctlConfig = toml::from_str(
            r#"
            [chain]
            rpc_url = "http://127.0.0.1:8545"

            [receipt]
            timeout_seconds = 30
            "#,
        )?;
        assert_eq!(cfg.chain.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(cfg.chain.chain_id, 8453);
        assert_eq!(cfg.receipt.timeout_seconds, 30);
        assert_eq!(cfg.receipt.poll_interval_ms, 1000);
        assert!(cfg.tokens.contains_key("usdc"));
        Ok(())
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = SwapctlConfig::default();
        cfg.router.fee = 1_000_001;
        assert!(cfg.validate().is_err(), "fee above 100%");

        let mut cfg = SwapctlConfig::default();
        cfg.receipt.timeout_seconds = 0;
        assert!(cfg.validate().is_err(), "zero timeout");

        let mut cfg = SwapctlConfig::default();
        cfg.sender = Some("0x1234".into());
        assert!(cfg.validate().is_err(), "short sender");

        let mut cfg = SwapctlConfig::default();
        cfg.tokens.insert("bad".into(), "nope".into());
        assert!(cfg.validate().is_err(), "bad token address");
    }
}
