//! User-facing CLI output: JSON results on stdout, short human notices on stderr.

use crate::{amount::format_base_units, errors::SwapError, swap::SwapOutcome};
use alloy::primitives::U256;
use eyre::Context as _;
use serde_json::{json, Value};
use std::io::Write as _;

fn stderr_writeln(s: &str) {
    let mut stderr = std::io::stderr().lock();
    if stderr.write_all(s.as_bytes()).is_err() {
        return;
    }
    if stderr.write_all(b"\n").is_err() {
        return;
    }
    let _flush = stderr.flush();
}

/// Human display of a base-unit amount; falls back to raw units if formatting fails.
fn human(amount: U256, decimals: u8) -> String {
    format_base_units(amount, decimals).unwrap_or_else(|_| format!("{amount} base units"))
}

/// Write one JSON document as a single line to stdout.
pub fn print_json(v: &Value) -> eyre::Result<()> {
    let s = serde_json::to_string(v).context("serialize result json")?;
    writeln!(std::io::stdout().lock(), "{s}").context("write result json")?;
    Ok(())
}

pub fn swap_outcome_json(outcome: &SwapOutcome) -> Value {
    match outcome {
        SwapOutcome::InsufficientBalance {
            balance,
            required,
            decimals,
        } => json!({
            "status": "insufficient_balance",
            "balance": balance.to_string(),
            "required": required.to_string(),
            "decimals": decimals,
        }),
        SwapOutcome::Swapped {
            tx_hash,
            block_number,
            amount_in,
            approval_tx,
            explorer_url,
        } => json!({
            "status": "swapped",
            "tx_hash": format!("{tx_hash:#x}"),
            "block_number": block_number,
            "amount_in": amount_in.to_string(),
            "approval_tx": approval_tx.map(|h| format!("{h:#x}")),
            "explorer_url": explorer_url,
        }),
    }
}

pub fn swap_error_json(e: &SwapError) -> Value {
    json!({
        "status": "error",
        "code": e.code(),
        "message": e.to_string(),
    })
}

/// Print the human summary of a finished swap run to stderr.
pub fn print_swap_summary(outcome: &SwapOutcome) {
    match outcome {
        SwapOutcome::InsufficientBalance {
            balance,
            required,
            decimals,
        } => stderr_writeln(&format!(
            "Insufficient balance: have {}, need {}. No transaction was sent.",
            human(*balance, *decimals),
            human(*required, *decimals)
        )),
        SwapOutcome::Swapped { explorer_url, .. } => {
            stderr_writeln(&format!("Transaction was successful: {explorer_url}"));
        }
    }
}

/// One-line warning printed before any swap is submitted.
pub fn print_no_slippage_warning() {
    stderr_writeln(
        "warning: swaps are submitted with amountOutMinimum = 0 (no slippage protection).",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;

    #[test]
    fn outcome_json_uses_decimal_amounts_and_hex_hashes() {
        let v = swap_outcome_json(&SwapOutcome::InsufficientBalance {
            balance: U256::from(500_000_u64),
            required: U256::from(600_000_u64),
            decimals: 6,
        });
        assert_eq!(v["status"], "insufficient_balance");
        assert_eq!(v["balance"], "500000");
        assert_eq!(v["required"], "600000");

        let v = swap_outcome_json(&SwapOutcome::Swapped {
            tx_hash: B256::repeat_byte(0xab),
            block_number: Some(7),
            amount_in: U256::from(80_u64),
            approval_tx: None,
            explorer_url: "https://basescan.org/tx/0xab".to_owned(),
        });
        assert_eq!(v["status"], "swapped");
        assert_eq!(v["block_number"], 7);
        assert!(v["approval_tx"].is_null(), "no approval was sent");
        assert!(
            v["tx_hash"].as_str().is_some_and(|s| s.starts_with("0xabab")),
            "got {v}"
        );
    }

    #[test]
    fn error_json_carries_code() {
        let v = swap_error_json(&SwapError::InvalidInput("bad amount".to_owned()));
        assert_eq!(v["code"], "invalid_input");
        assert!(
            v["message"].as_str().is_some_and(|s| s.contains("bad amount")),
            "got {v}"
        );
    }
}
