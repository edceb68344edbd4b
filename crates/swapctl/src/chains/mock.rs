//! In-memory `ChainClient` for protocol tests: one ERC-20 token, one account, and a node that
//! mines every accepted transaction according to a per-kind receipt mode.

use super::{
    bindings::{IERC20, ISwapRouter},
    evm::{ChainClient, TxReceipt},
};
use alloy::{
    consensus::{Transaction as _, TxEnvelope},
    eips::eip2718::Decodable2718 as _,
    primitives::{keccak256, Address, Bytes, B256, U256},
    rpc::types::TransactionRequest,
    sol_types::{sol_data, SolCall as _, SolInterface as _, SolType, SolValue as _},
};
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    Success,
    Reverted,
    NeverMined,
    TransportError(&'static str),
}

#[derive(Debug)]
struct State {
    balance: U256,
    decimals: u8,
    allowance: U256,
    nonce: u64,
    block: u64,
    calls: usize,
    estimates: Vec<TransactionRequest>,
    sent: Vec<TxEnvelope>,
    receipts: HashMap<B256, ReceiptMode>,
    approve_receipt: ReceiptMode,
    swap_receipt: ReceiptMode,
    fail_swap_estimate: bool,
    fail_approve_send: bool,
}

#[derive(Debug)]
pub struct MockChain {
    pub token: Address,
    state: Mutex<State>,
}

fn is_swap(input: &[u8]) -> bool {
    input.starts_with(&ISwapRouter::exactInputSingleCall::SELECTOR)
}

fn is_approve(input: &[u8]) -> bool {
    input.starts_with(&IERC20::approveCall::SELECTOR)
}

impl MockChain {
    pub const CHAIN_ID: u64 = 8453;
    pub const GAS_PRICE: u128 = 2_000_000_000;
    pub const GAS_ESTIMATE: u64 = 150_000;

    pub fn new(balance: U256, decimals: u8, allowance: U256) -> Self {
        Self {
            token: Address::repeat_byte(0xca),
            state: Mutex::new(State {
                balance,
                decimals,
                allowance,
                nonce: 0,
                block: 100,
                calls: 0,
                estimates: vec![],
                sent: vec![],
                receipts: HashMap::new(),
                approve_receipt: ReceiptMode::Success,
                swap_receipt: ReceiptMode::Success,
                fail_swap_estimate: false,
                fail_approve_send: false,
            }),
        }
    }

    pub async fn set_nonce(&self, nonce: u64) {
        self.state.lock().await.nonce = nonce;
    }

    pub async fn set_swap_receipt(&self, mode: ReceiptMode) {
        self.state.lock().await.swap_receipt = mode;
    }

    pub async fn set_approve_receipt(&self, mode: ReceiptMode) {
        self.state.lock().await.approve_receipt = mode;
    }

    pub async fn fail_swap_estimate(&self) {
        self.state.lock().await.fail_swap_estimate = true;
    }

    pub async fn fail_approve_send(&self) {
        self.state.lock().await.fail_approve_send = true;
    }

    /// Number of `eth_call`s served.
    pub async fn calls(&self) -> usize {
        self.state.lock().await.calls
    }

    pub async fn allowance(&self) -> U256 {
        self.state.lock().await.allowance
    }

    /// Every transaction accepted for broadcast, in order.
    pub async fn sent(&self) -> Vec<TxEnvelope> {
        self.state.lock().await.sent.clone()
    }

    pub async fn estimates(&self) -> Vec<TransactionRequest> {
        self.state.lock().await.estimates.clone()
    }
}

impl ChainClient for MockChain {
    fn chain_id(&self) -> u64 {
        Self::CHAIN_ID
    }

    async fn nonce(&self, _addr: Address) -> eyre::Result<u64> {
        Ok(self.state.lock().await.nonce)
    }

    async fn gas_price(&self) -> eyre::Result<u128> {
        Ok(Self::GAS_PRICE)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> eyre::Result<u64> {
        let mut st = self.state.lock().await;
        st.estimates.push(tx.clone());
        let input = tx.input.input().cloned().unwrap_or_default();
        if st.fail_swap_estimate && is_swap(&input) {
            eyre::bail!("execution reverted: STF");
        }
        Ok(Self::GAS_ESTIMATE)
    }

    async fn call(&self, tx: &TransactionRequest) -> eyre::Result<Bytes> {
        let mut st = self.state.lock().await;
        st.calls += 1;
        if tx.to != Some(self.token.into()) {
            eyre::bail!("execution reverted: call to non-contract");
        }
        let input = tx.input.input().cloned().unwrap_or_default();
        let out = match IERC20::IERC20Calls::abi_decode(&input)? {
            IERC20::IERC20Calls::balanceOf(_) => st.balance.abi_encode(),
            IERC20::IERC20Calls::decimals(_) => <sol_data::Uint<8> as SolType>::abi_encode(&st.decimals),
            IERC20::IERC20Calls::allowance(_) => st.allowance.abi_encode(),
            IERC20::IERC20Calls::approve(_) => eyre::bail!("approve is not a view"),
        };
        Ok(Bytes::from(out))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> eyre::Result<B256> {
        let mut st = self.state.lock().await;
        let env = TxEnvelope::decode_2718(&mut &raw[..])?;
        if env.nonce() != st.nonce {
            eyre::bail!("nonce too low: got {}, want {}", env.nonce(), st.nonce);
        }
        let input = env.input().clone();
        let mode = if is_approve(&input) {
            if st.fail_approve_send {
                eyre::bail!("insufficient funds for gas * price + value");
            }
            let call = IERC20::approveCall::abi_decode(&input)?;
            st.allowance = call.value;
            st.approve_receipt
        } else {
            st.swap_receipt
        };
        let hash = keccak256(raw);
        st.nonce += 1;
        st.sent.push(env);
        st.receipts.insert(hash, mode);
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> eyre::Result<Option<TxReceipt>> {
        let mut st = self.state.lock().await;
        let Some(mode) = st.receipts.get(&tx_hash).copied() else {
            return Ok(None);
        };
        let success = match mode {
            ReceiptMode::Success => true,
            ReceiptMode::Reverted => false,
            ReceiptMode::NeverMined => return Ok(None),
            ReceiptMode::TransportError(msg) => eyre::bail!("{msg}"),
        };
        st.block += 1;
        Ok(Some(TxReceipt {
            tx_hash,
            block_number: Some(st.block),
            success,
            gas_used: Self::GAS_ESTIMATE,
        }))
    }
}
