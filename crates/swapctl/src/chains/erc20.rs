use super::{bindings, evm::ChainClient};
use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, U256},
    rpc::types::TransactionRequest,
};
use eyre::Context as _;

async fn read(
    client: &impl ChainClient,
    token: Address,
    calldata: Bytes,
) -> eyre::Result<Bytes> {
    let tx = TransactionRequest::default()
        .with_to(token)
        .with_input(calldata);
    client.call(&tx).await
}

/// Balance of `owner` plus the token's decimals. Decimals are read fresh on every call.
pub async fn balance_and_decimals(
    client: &impl ChainClient,
    token: Address,
    owner: Address,
) -> eyre::Result<(U256, u8)> {
    let out = read(client, token, bindings::balance_of_calldata(owner))
        .await
        .context("erc20 balanceOf")?;
    let balance = bindings::decode_uint256("balanceOf", &out)?;
    let out = read(client, token, bindings::decimals_calldata())
        .await
        .context("erc20 decimals")?;
    let decimals = bindings::decode_decimals(&out)?;
    Ok((balance, decimals))
}

pub async fn allowance(
    client: &impl ChainClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> eyre::Result<U256> {
    let out = read(client, token, bindings::allowance_calldata(owner, spender))
        .await
        .context("erc20 allowance")?;
    bindings::decode_uint256("allowance", &out)
}
