//! ABI bindings for the two contract interfaces a swap touches.

use alloy::{
    primitives::{
        aliases::{U160, U24},
        Address, Bytes, U256,
    },
    sol,
    sol_types::SolCall as _,
};

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }
}

// Uniswap V3 `SwapRouter` (the variant whose params carry a deadline), as deployed by
// PancakeSwap V3.
sol! {
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }
        function exactInputSingle(ExactInputSingleParams params)
            external payable returns (uint256 amountOut);
    }
}

/// Parameters of a single-hop exact-input swap.
///
/// There is no minimum-output or price-limit field: both are always encoded as zero, so the
/// swap accepts any output amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactInputSingle {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
}

impl ExactInputSingle {
    /// ABI-encode the router call. Fails if `fee` does not fit the `uint24` fee field.
    pub fn calldata(&self) -> eyre::Result<Bytes> {
        let fee = U24::try_from(self.fee)
            .map_err(|e| eyre::eyre!("pool fee {} does not fit uint24: {e}", self.fee))?;
        let params = ISwapRouter::ExactInputSingleParams {
            tokenIn: self.token_in,
            tokenOut: self.token_out,
            fee,
            recipient: self.recipient,
            deadline: U256::from(self.deadline),
            amountIn: self.amount_in,
            amountOutMinimum: U256::ZERO,
            sqrtPriceLimitX96: U160::ZERO,
        };
        Ok(Bytes::from(
            ISwapRouter::exactInputSingleCall { params }.abi_encode(),
        ))
    }
}

pub fn balance_of_calldata(owner: Address) -> Bytes {
    Bytes::from(IERC20::balanceOfCall { account: owner }.abi_encode())
}

pub fn decimals_calldata() -> Bytes {
    Bytes::from(IERC20::decimalsCall {}.abi_encode())
}

pub fn allowance_calldata(owner: Address, spender: Address) -> Bytes {
    Bytes::from(IERC20::allowanceCall { owner, spender }.abi_encode())
}

pub fn approve_calldata(spender: Address, value: U256) -> Bytes {
    Bytes::from(IERC20::approveCall { spender, value }.abi_encode())
}

pub fn decode_uint256(call: &'static str, out: &[u8]) -> eyre::Result<U256> {
    // balanceOf and allowance share the single-uint256 return shape.
    IERC20::balanceOfCall::abi_decode_returns(out)
        .map_err(|e| eyre::eyre!("decode {call} return data: {e}"))
}

pub fn decode_decimals(out: &[u8]) -> eyre::Result<u8> {
    IERC20::decimalsCall::abi_decode_returns(out)
        .map_err(|e| eyre::eyre!("decode decimals return data: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolValue as _;

    #[test]
    fn swap_calldata_has_zero_floor_and_price_limit() -> eyre::Result<()> {
        let call = ExactInputSingle {
            token_in: Address::repeat_byte(0x11),
            token_out: Address::repeat_byte(0x22),
            fee: 500,
            recipient: Address::repeat_byte(0x33),
            deadline: 1_700_000_600,
            amount_in: U256::from(600_000_u64),
        };
        let data = call.calldata()?;
        assert!(
            data.starts_with(&ISwapRouter::exactInputSingleCall::SELECTOR),
            "selector mismatch"
        );

        let decoded = ISwapRouter::exactInputSingleCall::abi_decode(&data)?;
        let p = decoded.params;
        assert_eq!(p.tokenIn, call.token_in);
        assert_eq!(p.tokenOut, call.token_out);
        assert_eq!(p.fee, U24::from(500_u32));
        assert_eq!(p.recipient, call.recipient);
        assert_eq!(p.deadline, U256::from(1_700_000_600_u64));
        assert_eq!(p.amountIn, U256::from(600_000_u64));
        assert_eq!(p.amountOutMinimum, U256::ZERO);
        assert_eq!(p.sqrtPriceLimitX96, U160::ZERO);
        Ok(())
    }

    #[test]
    fn fee_wider_than_uint24_is_an_error() {
        let call = ExactInputSingle {
            token_in: Address::repeat_byte(0x11),
            token_out: Address::repeat_byte(0x22),
            fee: 1 << 24,
            recipient: Address::repeat_byte(0x33),
            deadline: 0,
            amount_in: U256::from(1_u64),
        };
        let r = call.calldata();
        assert!(r.is_err(), "expected error for 2^24 fee, got {r:?}");

        let max = ExactInputSingle {
            fee: (1 << 24) - 1,
            ..call
        };
        assert!(max.calldata().is_ok(), "largest uint24 fee must encode");
    }

    #[test]
    fn decodes_token_reads() -> eyre::Result<()> {
        let bal = U256::from(1_000_000_u64).abi_encode();
        assert_eq!(decode_uint256("balanceOf", &bal)?, U256::from(1_000_000_u64));

        let dec = <alloy::sol_types::sol_data::Uint<8> as alloy::sol_types::SolType>::abi_encode(&18_u8);
        assert_eq!(decode_decimals(&dec)?, 18);

        assert!(decode_uint256("allowance", &[0x01, 0x02]).is_err());
        Ok(())
    }
}
