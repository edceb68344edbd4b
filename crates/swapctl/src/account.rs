use alloy::{
    consensus::{SignableTransaction as _, TxEnvelope, TxLegacy},
    eips::eip2718::Encodable2718 as _,
    primitives::{Address, TxKind, B256, U256},
    rpc::types::TransactionRequest,
    signers::{local::PrivateKeySigner, SignerSync as _},
};
use eyre::{Context as _, ContextCompat as _};
use secrecy::{ExposeSecret as _, SecretString};
use std::{path::Path, str::FromStr as _};
use zeroize::Zeroizing;

pub const PRIVATE_KEY_ENV: &str = "SWAPCTL_PRIVATE_KEY";

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub raw: Vec<u8>,
    pub hash: B256,
}

/// The single sending account of a run.
///
/// The signing key stays inside this value; callers only ever see the address and signed
/// bytes.
pub struct Account {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn from_private_key(key: &SecretString) -> eyre::Result<Self> {
        let s = key.expose_secret().trim();
        if s.is_empty() {
            eyre::bail!("private key is empty");
        }
        let signer = PrivateKeySigner::from_str(s).context("parse private key")?;
        Ok(Self { signer })
    }

    /// Load the key from `key_file` if given, else from `SWAPCTL_PRIVATE_KEY`.
    pub fn load(key_file: Option<&Path>) -> eyre::Result<Self> {
        let raw = if let Some(p) = key_file {
            Zeroizing::new(
                std::fs::read_to_string(p)
                    .with_context(|| format!("read private key file {}", p.display()))?,
            )
        } else {
            Zeroizing::new(std::env::var(PRIVATE_KEY_ENV).with_context(|| {
                format!("{PRIVATE_KEY_ENV} is not set (or pass --private-key-file)")
            })?)
        };
        let key = SecretString::new(raw.trim().into());
        Self::from_private_key(&key)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Fail if a configured sender address does not belong to this key.
    pub fn check_sender(&self, expected: Option<Address>) -> eyre::Result<()> {
        if let Some(expected) = expected {
            if expected != self.address() {
                eyre::bail!(
                    "configured sender {expected:#x} does not match signing key address {:#x}",
                    self.address()
                );
            }
        }
        Ok(())
    }

    /// Sign a fully populated request as an EIP-155 legacy transaction.
    ///
    /// `nonce`, `gas`, `gas_price` and `chain_id` must already be set.
    pub fn sign(&self, tx: &TransactionRequest) -> eyre::Result<SignedTx> {
        let consensus_tx = TxLegacy {
            chain_id: Some(tx.chain_id.context("tx missing chain id")?),
            nonce: tx.nonce.context("tx missing nonce")?,
            gas_price: tx.gas_price.context("tx missing gas price")?,
            gas_limit: tx.gas.context("tx missing gas limit")?,
            to: tx.to.unwrap_or(TxKind::Create),
            value: tx.value.unwrap_or(U256::ZERO),
            input: tx.input.clone().into_input().unwrap_or_default(),
        };
        let hash = consensus_tx.signature_hash();
        let sig = self
            .signer
            .sign_hash_sync(&hash)
            .context("sign legacy tx")?;
        let signed = consensus_tx.into_signed(sig);
        let tx_hash = *signed.hash();
        let envelope = TxEnvelope::Legacy(signed);
        Ok(SignedTx {
            raw: envelope.encoded_2718(),
            hash: tx_hash,
        })
    }
}
