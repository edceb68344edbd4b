//! The swap protocol: balance check, allowance, exact-input swap, receipt.

use crate::{
    account::Account,
    amount,
    approval::{AllowanceOutcome, ApprovalManager},
    chains::{bindings::ExactInputSingle, erc20, evm::ChainClient},
    errors::SwapError,
    tx::{self, ReceiptWait},
};
use alloy::primitives::{Address, B256, U256};
use tracing::{info, warn};

/// Router-side knobs of a swap run.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub router: Address,
    /// Pool fee tier in hundredths of a basis point (500 = 0.05%).
    pub fee: u32,
    pub deadline_seconds: u64,
    pub wait: ReceiptWait,
    /// Prefix the tx hash is appended to for the explorer link.
    pub explorer_tx_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRequest<'q> {
    pub token_in: Address,
    pub token_out: Address,
    /// Human quantity of `token_in`, e.g. `"0.00008"`.
    pub quantity: &'q str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Balance is below the requested amount. No transaction was sent.
    InsufficientBalance {
        balance: U256,
        required: U256,
        decimals: u8,
    },
    Swapped {
        tx_hash: B256,
        block_number: Option<u64>,
        amount_in: U256,
        approval_tx: Option<B256>,
        explorer_url: String,
    },
}

/// Current unix time in seconds.
fn unix_now() -> Result<u64, SwapError> {
    u64::try_from(chrono::Utc::now().timestamp())
        .map_err(|e| SwapError::InvalidInput(format!("system clock before unix epoch: {e}")))
}

pub struct Swapper<'a, C> {
    client: &'a C,
    account: &'a Account,
    settings: &'a SwapSettings,
}

impl<'a, C: ChainClient> Swapper<'a, C> {
    pub const fn new(client: &'a C, account: &'a Account, settings: &'a SwapSettings) -> Self {
        Self {
            client,
            account,
            settings,
        }
    }

    pub async fn swap(&self, req: SwapRequest<'_>) -> Result<SwapOutcome, SwapError> {
        let sender = self.account.address();
        info!(
            token_in = %req.token_in.to_checksum(None),
            token_out = %req.token_out.to_checksum(None),
            quantity = req.quantity,
            router = %self.settings.router,
            "starting swap"
        );

        let (balance, decimals) = erc20::balance_and_decimals(self.client, req.token_in, sender)
            .await
            .map_err(|e| SwapError::ChainRead {
                what: "token_in balance",
                source: e.into(),
            })?;
        let amount_in = amount::quantity_to_base_units(req.quantity, decimals)
            .map_err(|e| SwapError::InvalidInput(format!("{e:#}")))?;
        info!(%balance, amount = %amount_in, decimals, "checked balance");

        if balance < amount_in {
            warn!(%balance, required = %amount_in, "insufficient balance, not swapping");
            return Ok(SwapOutcome::InsufficientBalance {
                balance,
                required: amount_in,
                decimals,
            });
        }

        let approvals = ApprovalManager::new(self.client, self.account, self.settings.wait);
        let approval_tx = match approvals
            .ensure_allowance(req.token_in, self.settings.router, amount_in)
            .await?
        {
            AllowanceOutcome::Exact => None,
            AllowanceOutcome::Approved { previous, tx_hash } => {
                info!(%previous, approval_tx = %tx_hash, "allowance replaced");
                Some(tx_hash)
            }
        };

        let call = ExactInputSingle {
            token_in: req.token_in,
            token_out: req.token_out,
            fee: self.settings.fee,
            recipient: sender,
            deadline: unix_now()?.saturating_add(self.settings.deadline_seconds),
            amount_in,
        };
        info!(fee = call.fee, deadline = call.deadline, "making swap");
        let input = call
            .calldata()
            .map_err(|e| SwapError::InvalidInput(format!("{e:#}")))?;

        let swap_tx = tx::assemble(self.client, self.account, self.settings.router, input)
            .await
            .map_err(SwapError::submit)?;
        let swap_tx = tx::with_estimated_gas(self.client, swap_tx)
            .await
            .map_err(SwapError::gas_estimation)?;
        let tx_hash = tx::sign_and_send(self.client, self.account, &swap_tx)
            .await
            .map_err(SwapError::submit)?;
        info!(tx_hash = %tx_hash, nonce = ?swap_tx.nonce, gas = ?swap_tx.gas, "swap broadcast");

        let receipt = tx::wait_for_receipt(self.client, tx_hash, self.settings.wait)
            .await
            .map_err(|e| SwapError::TransactionNotFound {
                tx_hash,
                source: e.into(),
            })?;
        if !receipt.success {
            return Err(SwapError::SwapReverted {
                tx_hash,
                block_number: receipt.block_number,
            });
        }

        let explorer_url = format!("{}{tx_hash:#x}", self.settings.explorer_tx_url);
        info!(
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction was successful: {explorer_url}"
        );
        Ok(SwapOutcome::Swapped {
            tx_hash,
            block_number: receipt.block_number,
            amount_in,
            approval_tx,
            explorer_url,
        })
    }
}
