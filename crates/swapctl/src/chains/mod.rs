pub mod bindings;
pub mod erc20;
pub mod evm;
#[cfg(test)]
pub mod mock;
