//! Build, sign, broadcast and confirm single-use transactions.

use crate::{
    account::Account,
    chains::evm::{ChainClient, TxReceipt},
};
use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, B256, U256},
    rpc::types::TransactionRequest,
};
use std::time::Duration;
use tracing::debug;

/// Bounds for polling a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// Populate from/to/value/input with a fresh pending nonce and the current gas price.
///
/// The nonce is fetched here, immediately before the transaction is built, so a caller that
/// waited for an earlier transaction's receipt always gets the next nonce.
pub async fn assemble(
    client: &impl ChainClient,
    account: &Account,
    to: Address,
    input: Bytes,
) -> eyre::Result<TransactionRequest> {
    let from = account.address();
    let nonce = client.nonce(from).await?;
    let gas_price = client.gas_price().await?;
    let mut tx = TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_value(U256::ZERO)
        .with_input(input)
        .with_nonce(nonce)
        .with_gas_price(gas_price);
    tx.chain_id = Some(client.chain_id());
    debug!(%from, %to, nonce, gas_price, "assembled transaction");
    Ok(tx)
}

/// Estimate gas against the complete request and set it as the gas limit.
pub async fn with_estimated_gas(
    client: &impl ChainClient,
    mut tx: TransactionRequest,
) -> eyre::Result<TransactionRequest> {
    let gas = client.estimate_gas(&tx).await?;
    debug!(gas, "estimated gas");
    tx.gas = Some(gas);
    Ok(tx)
}

/// Sign and broadcast. Returns the hash without waiting for inclusion.
pub async fn sign_and_send(
    client: &impl ChainClient,
    account: &Account,
    tx: &TransactionRequest,
) -> eyre::Result<B256> {
    let signed = account.sign(tx)?;
    let node_hash = client.send_raw_transaction(&signed.raw).await?;
    if node_hash != signed.hash {
        eyre::bail!(
            "node reported hash {node_hash:#x} for locally signed tx {:#x}",
            signed.hash
        );
    }
    Ok(signed.hash)
}

/// Poll until the receipt appears. Errors on the first transport failure or once
/// `wait.timeout` has elapsed.
pub async fn wait_for_receipt(
    client: &impl ChainClient,
    tx_hash: B256,
    wait: ReceiptWait,
) -> eyre::Result<TxReceipt> {
    let poll = async {
        loop {
            if let Some(r) = client.transaction_receipt(tx_hash).await? {
                debug!(tx_hash = %r.tx_hash, block = ?r.block_number, "receipt found");
                return Ok::<TxReceipt, eyre::Report>(r);
            }
            tokio::time::sleep(wait.poll_interval).await;
        }
    };
    match tokio::time::timeout(wait.timeout, poll).await {
        Ok(r) => r,
        Err(_) => eyre::bail!(
            "timed out after {}ms waiting for receipt",
            wait.timeout.as_millis()
        ),
    }
}
