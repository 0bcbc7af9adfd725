//! Token Amounts
//!
//! Conversion between the user's decimal input and the token's smallest-unit
//! integer representation. USDT on Polygon uses 6 decimals, so `"10"` becomes
//! `10_000_000`.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use thiserror::Error;

/// Largest scale a `Decimal` can hold
pub const MAX_DECIMALS: u32 = 28;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("Amount must be greater than zero, got {0}")]
    NotPositive(String),
    #[error("'{input}' has more than {decimals} decimal places")]
    TooPrecise { input: String, decimals: u32 },
    #[error("Amount {0} is too large")]
    Overflow(String),
    #[error("Unsupported token scale: {0} decimals")]
    UnsupportedScale(u32),
}

/// Parse a user-entered amount, requiring a strictly positive decimal.
///
/// Accepts plain decimals (`"10"`, `"0.5"`, `" 12.25 "`) and scientific
/// notation (`"1e3"`). Input that a `Decimal` can only hold by rounding is
/// rejected as too precise.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }

    // Digit separators are not part of a typed amount
    if s.contains('_') {
        return Err(AmountError::NotANumber(s.to_string()));
    }

    let amount = match Decimal::from_str_exact(s) {
        Ok(amount) => amount,
        Err(rust_decimal::Error::Underflow) => {
            return Err(AmountError::TooPrecise {
                input: s.to_string(),
                decimals: MAX_DECIMALS,
            })
        }
        Err(_) if s.contains(['e', 'E']) => {
            Decimal::from_scientific(s).map_err(|_| AmountError::NotANumber(s.to_string()))?
        }
        Err(_) => return Err(AmountError::NotANumber(s.to_string())),
    };

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(s.to_string()));
    }

    Ok(amount)
}

/// Convert a decimal amount to smallest units at the given scale.
///
/// Amounts with more fractional digits than the token supports are rejected
/// rather than silently truncated.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::UnsupportedScale(decimals));
    }
    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive(amount.to_string()));
    }

    let mut scaled = amount.normalize();
    if scaled.scale() > decimals {
        return Err(AmountError::TooPrecise {
            input: amount.to_string(),
            decimals,
        });
    }

    scaled.rescale(decimals);
    if scaled.scale() != decimals {
        return Err(AmountError::Overflow(amount.to_string()));
    }

    let mantissa = u128::try_from(scaled.mantissa())
        .map_err(|_| AmountError::Overflow(amount.to_string()))?;
    Ok(U256::from(mantissa))
}

/// Parse and convert in one step.
pub fn parse_base_units(input: &str, decimals: u32) -> Result<U256, AmountError> {
    let amount = parse_amount(input)?;
    to_base_units(amount, decimals)
}

/// Render smallest units as a decimal string (`10_500_000`, 6 -> `"10.5"`).
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    if decimals == 0 {
        return digits;
    }

    let width = decimals as usize + 1;
    let padded = if digits.len() < width {
        format!("{}{}", "0".repeat(width - digits.len()), digits)
    } else {
        digits
    };

    let (int_part, frac_part) = padded.split_at(padded.len() - decimals as usize);
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(parse_amount("10").unwrap(), dec!(10));
        assert_eq!(parse_amount(" 0.5 ").unwrap(), dec!(0.5));
        assert_eq!(parse_amount("1e3").unwrap(), dec!(1000));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert!(matches!(parse_amount("abc"), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_amount("10 USDT"), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_amount("NaN"), Err(AmountError::NotANumber(_))));
    }

    #[test]
    fn test_parse_rejects_zero_and_negative() {
        assert!(matches!(parse_amount("0"), Err(AmountError::NotPositive(_))));
        assert!(matches!(parse_amount("0.000"), Err(AmountError::NotPositive(_))));
        assert!(matches!(parse_amount("-5"), Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_to_base_units_six_decimals() {
        assert_eq!(to_base_units(dec!(10), 6).unwrap(), U256::from(10_000_000u64));
        assert_eq!(to_base_units(dec!(0.000001), 6).unwrap(), U256::from(1u64));
        assert_eq!(to_base_units(dec!(12.340000), 6).unwrap(), U256::from(12_340_000u64));
    }

    #[test]
    fn test_to_base_units_rejects_excess_precision() {
        let result = to_base_units(dec!(1.0000001), 6);
        assert!(matches!(result, Err(AmountError::TooPrecise { decimals: 6, .. })));
    }

    #[test]
    fn test_parse_rejects_input_that_would_round() {
        assert!(matches!(
            parse_amount("1.00000000000000000000000000001"),
            Err(AmountError::TooPrecise { .. })
        ));
        // Past the 96-bit mantissa the fractional tail is refused, never dropped
        assert!(matches!(
            parse_amount("10000000000000000000000.0000001"),
            Err(AmountError::TooPrecise { .. }) | Err(AmountError::NotANumber(_))
        ));
        assert!(parse_base_units("1.00000000000000000000000000001", 6).is_err());
    }

    #[test]
    fn test_parse_rejects_digit_separators() {
        assert!(matches!(parse_amount("1_000"), Err(AmountError::NotANumber(_))));
        assert!(matches!(parse_amount("1_0.5"), Err(AmountError::NotANumber(_))));
    }

    #[test]
    fn test_to_base_units_eighteen_decimals() {
        let wei = to_base_units(dec!(1.5), 18).unwrap();
        assert_eq!(wei, U256::from(1_500_000_000_000_000_000u128));
    }

    #[test]
    fn test_unsupported_scale() {
        assert_eq!(
            to_base_units(dec!(1), 30),
            Err(AmountError::UnsupportedScale(30))
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(10_500_000u64), 6), "10.5");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 6), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
        assert_eq!(format_units(U256::from(10u64).pow(U256::from(18u64)), 18), "1");
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!(parse_base_units("2.5", 6).unwrap(), U256::from(2_500_000u64));
        assert!(parse_base_units("-1", 6).is_err());
    }
}
