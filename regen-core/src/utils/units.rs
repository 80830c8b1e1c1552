//! Conversion of on-chain fixed-point token amounts.

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::chain::ChainError;

/// Decimals of the stablecoin the funds are denominated in.
pub const TOKEN_DECIMALS: u64 = 18;

/// Format a raw token amount as a decimal string.
///
/// Trailing zeros of the fraction are trimmed but at least one fractional
/// digit is kept, so `10^18` becomes `"1.0"` and `15 * 10^17` becomes `"1.5"`.
pub fn format_token_amount(raw: U256) -> String {
    let scale = U256::from(10u64).pow(U256::from(TOKEN_DECIMALS));
    let whole = raw / scale;
    let fraction = raw % scale;

    let fraction = format!(
        "{:0>width$}",
        fraction.to_string(),
        width = TOKEN_DECIMALS as usize
    );
    let fraction = fraction.trim_end_matches('0');
    let fraction = if fraction.is_empty() { "0" } else { fraction };
    format!("{whole}.{fraction}")
}

/// Convert a raw token amount into a [`Decimal`] of whole tokens.
pub fn token_amount_to_decimal(raw: U256) -> Result<Decimal, ChainError> {
    let formatted = format_token_amount(raw);
    Decimal::from_str(&formatted).map_err(|e| ChainError::Amount(format!("{formatted}: {e}")))
}
