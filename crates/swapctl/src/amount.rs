use alloy::primitives::U256;
use eyre::Context as _;

fn scale_for(decimals: u8) -> eyre::Result<U256> {
    U256::from(10_u64)
        .checked_pow(U256::from(decimals))
        .ok_or_else(|| eyre::eyre!("decimals too large: {decimals}"))
}

fn parse_digits(s: &str, label: &'static str) -> eyre::Result<U256> {
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        eyre::bail!("invalid {label} digits in amount: {s:?}");
    }
    s.parse::<U256>()
        .with_context(|| format!("parse {label} part of amount"))
}

/// Convert a human quantity like `"0.00008"` into token base units:
/// `floor(quantity * 10^decimals)`.
///
/// Parsing is exact (no floats). Fractional digits past `decimals` are dropped, which is the
/// floor for a non-negative quantity. Negative, malformed, or overflowing input is an error.
pub fn quantity_to_base_units(s: &str, decimals: u8) -> eyre::Result<U256> {
    let s = s.trim();
    if s.is_empty() {
        eyre::bail!("empty amount");
    }
    if s.starts_with('-') {
        eyre::bail!("amount must be non-negative");
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        eyre::bail!("invalid amount: {s:?}");
    }

    let whole_v = parse_digits(whole, "whole")?;
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        eyre::bail!("invalid fractional digits in amount: {frac:?}");
    }

    // All-ASCII from here, so byte offsets are char boundaries.
    let keep = usize::from(decimals).min(frac.len());
    let (kept, _dropped) = frac.split_at(keep);
    let mut frac_s = kept.to_owned();
    while frac_s.len() < usize::from(decimals) {
        frac_s.push('0');
    }
    let frac_v = parse_digits(&frac_s, "fractional")?;

    let scale = scale_for(decimals)?;
    whole_v
        .checked_mul(scale)
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| eyre::eyre!("amount overflow: {s} with {decimals} decimals"))
}

/// Format base units as a trimmed decimal string, e.g. `1500000` @ 6 => `"1.5"`.
pub fn format_base_units(base: U256, decimals: u8) -> eyre::Result<String> {
    if decimals == 0 {
        return Ok(base.to_string());
    }
    let scale = scale_for(decimals)?;
    let whole = base / scale;
    let frac = base % scale;
    if frac.is_zero() {
        return Ok(whole.to_string());
    }
    let digits = frac.to_string();
    let mut frac_s = "0".repeat(usize::from(decimals).saturating_sub(digits.len()));
    frac_s.push_str(&digits);
    let trimmed = frac_s.trim_end_matches('0');
    Ok(format!("{whole}.{trimmed}"))
}
