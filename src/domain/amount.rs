//! Amount parsing, unit formatting and the stablecoin cost calculator.
//!
//! Raw on-chain values are `U256` integers; everything the user types or
//! sees is a decimal string. Comparisons between the two go through
//! [`Decimal`] so that `0.1 + 0.2` style float drift never decides whether
//! an approval is needed.

use std::str::FromStr;

use alloy::primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use super::token_info::{PRICE_DECIMALS, TokenInfo};

/// Precision of costs shown to the user.
pub const DISPLAY_PRECISION: u32 = 2;

/// Precision used when comparing costs against balance and allowance.
pub const SETTLEMENT_PRECISION: u32 = 6;

/// Decimals of the stablecoin (USDC).
pub const STABLECOIN_DECIMALS: u8 = 6;

/// Largest raw integer a `Decimal` mantissa can hold (2^96 - 1).
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Parse a user-entered token amount. Returns `None` unless it is a
/// positive decimal number.
pub fn parse_token_amount(token_amount: &str) -> Option<Decimal> {
    let amount = Decimal::from_str(token_amount.trim()).ok()?;
    (amount > Decimal::ZERO).then_some(amount)
}

/// Parse the whole-token amount sent to `buyTokenWithUSDT`.
///
/// Only plain base-10 integers are accepted; `"1.5"` or `"abc"` yield `None`.
pub fn parse_purchase_amount(token_amount: &str) -> Option<U256> {
    let s = token_amount.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(s, 10).ok()
}

/// Convert a raw on-chain integer into a decimal with `decimals` places.
///
/// Values beyond the `Decimal` range saturate at `Decimal::MAX`, which keeps
/// "unlimited" allowances comparing as larger than any cost.
pub fn to_decimal(value: U256, decimals: u8) -> Decimal {
    let Ok(raw) = u128::try_from(value) else {
        return Decimal::MAX;
    };
    if raw > MAX_MANTISSA {
        return Decimal::MAX;
    }
    Decimal::try_from_i128_with_scale(raw as i128, u32::from(decimals)).unwrap_or(Decimal::MAX)
}

/// Render a raw on-chain integer as a trimmed decimal string.
///
/// `format_units(U256::from(10_000), 6) == "0.01"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let base = U256::from(10u64).pow(U256::from(decimals));
    let int = value / base;
    let frac = (value % base).to_string();
    let frac = format!("{:0>width$}", frac, width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int.to_string()
    } else {
        format!("{int}.{frac}")
    }
}

/// Exact cost of `token_amount` tokens at `price_per_token`, unrounded.
fn exact_cost(token_amount: &str, price_per_token: U256) -> Option<Decimal> {
    let amount = parse_token_amount(token_amount)?;
    let price = to_decimal(price_per_token, PRICE_DECIMALS);
    amount.checked_mul(price)
}

/// Cost rounded to `precision` decimals, or zero when the amount is invalid.
pub fn required_cost(token_amount: &str, price_per_token: U256, precision: u32) -> Decimal {
    exact_cost(token_amount, price_per_token)
        .map(|cost| cost.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO)
}

/// Stablecoin needed to buy `token_amount` tokens, as a display string with
/// exactly `precision` fractional digits.
///
/// Invalid, empty or non-positive amounts return `"0"` instead of an error.
pub fn required_stablecoin(token_amount: &str, price_per_token: U256, precision: u32) -> String {
    match exact_cost(token_amount, price_per_token) {
        Some(cost) => {
            let rounded =
                cost.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", precision as usize, rounded)
        }
        None => "0".to_string(),
    }
}

/// Settlement cost in raw stablecoin units. `None` when the amount is
/// invalid or the cost does not fit.
pub fn required_raw_cost(token_amount: &str, price_per_token: U256) -> Option<U256> {
    let cost = exact_cost(token_amount, price_per_token)?
        .round_dp_with_strategy(SETTLEMENT_PRECISION, RoundingStrategy::MidpointAwayFromZero);
    let scale = Decimal::from(10u64.pow(u32::from(STABLECOIN_DECIMALS)));
    let raw = cost.checked_mul(scale)?.trunc().to_u128()?;
    Some(U256::from(raw))
}

/// Allowance to request before buying `token_amount`: the configured
/// standing allowance, raised to the cost when the cost is larger.
pub fn approval_amount(token_amount: &str, price_per_token: U256, standing: U256) -> U256 {
    required_raw_cost(token_amount, price_per_token)
        .map_or(standing, |required| required.max(standing))
}

/// Whether the current allowance is below the settlement cost.
///
/// Unknown allowance or token info, or an empty amount, count as needing
/// approval.
pub fn needs_approval(
    allowance: Option<U256>,
    token_amount: &str,
    token_info: Option<&TokenInfo>,
) -> bool {
    let (Some(allowance), Some(info)) = (allowance, token_info) else {
        return true;
    };
    if token_amount.trim().is_empty() {
        return true;
    }
    let required = required_cost(token_amount, info.price_per_token, SETTLEMENT_PRECISION);
    to_decimal(allowance, STABLECOIN_DECIMALS) < required
}

/// Whether the stablecoin balance covers the settlement cost.
pub fn has_sufficient_balance(
    balance: Option<U256>,
    token_amount: &str,
    token_info: Option<&TokenInfo>,
) -> bool {
    let (Some(balance), Some(info)) = (balance, token_info) else {
        return false;
    };
    if token_amount.trim().is_empty() {
        return false;
    }
    let required = required_cost(token_amount, info.price_per_token, SETTLEMENT_PRECISION);
    to_decimal(balance, STABLECOIN_DECIMALS) >= required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token_info::sample_token_info;

    const CENT: u64 = 10_000; // 0.01 USDC

    fn usdc(whole: u64) -> U256 {
        U256::from(whole * 1_000_000)
    }

    #[test]
    fn test_required_stablecoin_display() {
        assert_eq!(
            required_stablecoin("150", U256::from(CENT), DISPLAY_PRECISION),
            "1.50"
        );
        assert_eq!(
            required_stablecoin("150", U256::from(CENT), SETTLEMENT_PRECISION),
            "1.500000"
        );
        assert_eq!(
            required_stablecoin("1", U256::from(1_234_567u64), DISPLAY_PRECISION),
            "1.23"
        );
    }

    #[test]
    fn test_required_stablecoin_rounds_half_away_from_zero() {
        // 1 token at 0.005 USDC -> 0.01 at display precision
        assert_eq!(
            required_stablecoin("1", U256::from(5_000u64), DISPLAY_PRECISION),
            "0.01"
        );
    }

    #[test]
    fn test_required_stablecoin_invalid_inputs() {
        let price = U256::from(CENT);
        for input in ["", "   ", "0", "0.0", "-5", "abc", "1.2.3", "12abc"] {
            assert_eq!(
                required_stablecoin(input, price, DISPLAY_PRECISION),
                "0",
                "input {input:?}"
            );
        }
    }

    #[test]
    fn test_required_stablecoin_monotonic() {
        let price = U256::from(3_333u64);
        let mut last = Decimal::ZERO;
        for n in 1..500u32 {
            let cost = Decimal::from_str(&required_stablecoin(
                &n.to_string(),
                price,
                DISPLAY_PRECISION,
            ))
            .unwrap();
            assert!(cost >= last, "cost decreased at {n}");
            last = cost;
        }
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(CENT), 6), "0.01");
        assert_eq!(format_units(usdc(25), 6), "25");
        assert_eq!(format_units(U256::from(1_500_001u64), 6), "1.500001");
        assert_eq!(format_units(U256::from(12_345u64), 2), "123.45");
        assert_eq!(format_units(U256::ZERO, 6), "0");
        assert_eq!(format_units(U256::from(7u64), 0), "7");
    }

    #[test]
    fn test_to_decimal_saturates() {
        assert_eq!(to_decimal(U256::MAX, 6), Decimal::MAX);
        assert_eq!(to_decimal(U256::from(1_500_000u64), 6), Decimal::new(15, 1));
    }

    #[test]
    fn test_parse_purchase_amount() {
        assert_eq!(parse_purchase_amount("150"), Some(U256::from(150u64)));
        assert_eq!(parse_purchase_amount(" 42 "), Some(U256::from(42u64)));
        assert_eq!(parse_purchase_amount("1.5"), None);
        assert_eq!(parse_purchase_amount(""), None);
        assert_eq!(parse_purchase_amount("-1"), None);
    }

    #[test]
    fn test_required_raw_cost() {
        let price = U256::from(CENT);
        assert_eq!(required_raw_cost("150", price), Some(U256::from(1_500_000u64)));
        assert_eq!(
            required_raw_cost("200000000", price),
            Some(U256::from(2_000_000_000_000u64))
        );
        assert_eq!(required_raw_cost("0", price), None);
        assert_eq!(required_raw_cost("abc", price), None);
    }

    #[test]
    fn test_approval_amount_covers_large_purchases() {
        let price = U256::from(CENT);
        let standing = usdc(1_000_000);

        assert_eq!(approval_amount("150", price, standing), standing);
        // 200M tokens at 0.01 cost 2M USDC, above the standing allowance
        assert_eq!(approval_amount("200000000", price, standing), usdc(2_000_000));
        assert_eq!(approval_amount("", price, standing), standing);
    }

    #[test]
    fn test_needs_approval() {
        let info = sample_token_info();

        // 150 tokens at 0.01 = 1.50 USDC
        assert!(needs_approval(Some(U256::ZERO), "150", Some(&info)));
        assert!(needs_approval(Some(U256::from(1_499_999u64)), "150", Some(&info)));
        assert!(!needs_approval(Some(U256::from(1_500_000u64)), "150", Some(&info)));
        assert!(!needs_approval(Some(U256::MAX), "150", Some(&info)));

        // Unknown state counts as needing approval
        assert!(needs_approval(None, "150", Some(&info)));
        assert!(needs_approval(Some(usdc(10)), "150", None));
        assert!(needs_approval(Some(usdc(10)), "", Some(&info)));
    }

    #[test]
    fn test_has_sufficient_balance() {
        let info = sample_token_info();

        assert!(has_sufficient_balance(Some(usdc(2)), "150", Some(&info)));
        assert!(has_sufficient_balance(Some(U256::from(1_500_000u64)), "150", Some(&info)));
        assert!(!has_sufficient_balance(Some(U256::from(1_499_999u64)), "150", Some(&info)));

        assert!(!has_sufficient_balance(None, "150", Some(&info)));
        assert!(!has_sufficient_balance(Some(usdc(2)), "150", None));
        assert!(!has_sufficient_balance(Some(usdc(2)), "", Some(&info)));
    }
}
