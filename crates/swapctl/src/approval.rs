//! Router spending allowance on the input token.

use crate::{
    account::Account,
    chains::{bindings, erc20, evm::ChainClient},
    errors::SwapError,
    tx::{self, ReceiptWait},
};
use alloy::primitives::{Address, B256, U256};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The allowance already equals the required amount; nothing was sent.
    Exact,
    /// An approval for exactly the required amount was mined.
    Approved { previous: U256, tx_hash: B256 },
}

pub struct ApprovalManager<'a, C> {
    client: &'a C,
    account: &'a Account,
    wait: ReceiptWait,
}

impl<'a, C: ChainClient> ApprovalManager<'a, C> {
    pub const fn new(client: &'a C, account: &'a Account, wait: ReceiptWait) -> Self {
        Self {
            client,
            account,
            wait,
        }
    }

    /// Make the `spender` allowance of the account on `token` equal `required`.
    ///
    /// Only an allowance exactly equal to `required` skips the approval; a larger one is
    /// replaced. The approval receipt's status is logged but not enforced.
    pub async fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        required: U256,
    ) -> Result<AllowanceOutcome, SwapError> {
        let owner = self.account.address();
        let current = erc20::allowance(self.client, token, owner, spender)
            .await
            .map_err(SwapError::approval)?;
        info!(%token, %spender, %current, %required, "current allowance");

        if current == required {
            return Ok(AllowanceOutcome::Exact);
        }

        info!(%token, %spender, amount = %required, "submitting approval");
        let tx_hash = self
            .approve(token, spender, required)
            .await
            .map_err(SwapError::approval)?;

        Ok(AllowanceOutcome::Approved {
            previous: current,
            tx_hash,
        })
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> eyre::Result<B256> {
        let input = bindings::approve_calldata(spender, amount);
        let req = tx::assemble(self.client, self.account, token, input).await?;
        let req = tx::with_estimated_gas(self.client, req).await?;
        let tx_hash = tx::sign_and_send(self.client, self.account, &req).await?;
        info!(tx_hash = %tx_hash, nonce = ?req.nonce, "approval broadcast");

        let receipt = tx::wait_for_receipt(self.client, tx_hash, self.wait).await?;
        if receipt.success {
            info!(tx_hash = %tx_hash, block = ?receipt.block_number, "approval mined");
        } else {
            warn!(
                tx_hash = %tx_hash,
                block = ?receipt.block_number,
                "approval mined with failure status"
            );
        }
        Ok(tx_hash)
    }
}
