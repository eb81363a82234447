// Decimal text <-> raw integer token units.

use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};
use rust_decimal::Decimal;

use crate::error::CalcError;

/// Edit-boundary gate for numeric inputs: digits with at most one decimal point.
/// The empty string is accepted so a field can be cleared.
pub fn is_numeric_input(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_digit() || c == '.') && text.matches('.').count() <= 1
}

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u8).pow(exp)
}

/// Parses a human amount into smallest units. Fraction digits beyond `decimals`
/// are truncated. Empty input parses as zero.
pub fn to_raw(amount: &str, decimals: u8) -> Result<BigInt, CalcError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed == "." {
        return Ok(BigInt::zero());
    }
    let normalized = match (trimmed.starts_with('.'), trimmed.ends_with('.')) {
        (true, _) => format!("0{}", trimmed),
        (_, true) => trimmed.trim_end_matches('.').to_string(),
        _ => trimmed.to_string(),
    };
    let value = Decimal::from_str(&normalized).map_err(|_| CalcError::MalformedAmount(amount.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CalcError::MalformedAmount(amount.to_string()));
    }

    let mantissa = BigInt::from(value.mantissa());
    let scale = value.scale();
    let decimals = decimals as u32;
    let raw = if scale <= decimals {
        mantissa * pow10(decimals - scale)
    } else {
        mantissa / pow10(scale - decimals)
    };
    Ok(raw.abs())
}

/// Formats smallest units as a decimal string without trailing zeros ("1.5", "0", "42").
pub fn from_raw(raw: &BigInt, decimals: u8) -> String {
    let (int_part, frac_part) = raw.abs().div_rem(&pow10(decimals as u32));
    if frac_part.is_zero() {
        return int_part.to_string();
    }
    let frac = format!("{:0>width$}", frac_part.to_string(), width = decimals as usize);
    format!("{}.{}", int_part, frac.trim_end_matches('0'))
}

/// Snaps values within 1e-18 of an integer to that integer. Values too large for
/// `Decimal` are returned unchanged.
pub fn snap_to_integer(amount: &str) -> String {
    let Ok(value) = Decimal::from_str(amount) else {
        return amount.to_string();
    };
    let rounded = value.round();
    if (value - rounded).abs() <= Decimal::new(1, 18) {
        rounded.normalize().to_string()
    } else {
        amount.to_string()
    }
}

/// Lossy f64 view of an amount string; unparseable text reads as zero.
pub fn amount_to_f64(amount: &str) -> f64 {
    amount.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_input_gate() {
        assert!(is_numeric_input(""));
        assert!(is_numeric_input("12"));
        assert!(is_numeric_input("12."));
        assert!(is_numeric_input(".5"));
        assert!(!is_numeric_input("1.2.3"));
        assert!(!is_numeric_input("-1"));
        assert!(!is_numeric_input("1e5"));
        assert!(!is_numeric_input("abc"));
    }

    #[test]
    fn test_to_raw_scales_and_truncates() {
        assert_eq!(to_raw("10", 18).unwrap(), BigInt::from(10u64) * pow10(18));
        assert_eq!(to_raw("1.5", 6).unwrap(), BigInt::from(1_500_000u64));
        assert_eq!(to_raw("0.1234567", 6).unwrap(), BigInt::from(123_456u64));
        assert_eq!(to_raw(".5", 1).unwrap(), BigInt::from(5u8));
        assert_eq!(to_raw("2.", 2).unwrap(), BigInt::from(200u16));
        assert!(to_raw("", 18).unwrap().is_zero());
    }

    #[test]
    fn test_to_raw_rejects_garbage() {
        assert!(matches!(to_raw("abc", 18), Err(CalcError::MalformedAmount(_))));
        assert!(matches!(to_raw("-3", 18), Err(CalcError::MalformedAmount(_))));
    }

    #[test]
    fn test_from_raw_trims() {
        assert_eq!(from_raw(&BigInt::from(1_500_000u64), 6), "1.5");
        assert_eq!(from_raw(&BigInt::from(1u8), 6), "0.000001");
        assert_eq!(from_raw(&BigInt::zero(), 18), "0");
        assert_eq!(from_raw(&(BigInt::from(42u8) * pow10(18)), 18), "42");
    }

    #[test]
    fn test_snap_to_integer() {
        assert_eq!(snap_to_integer("1.0000000000000000001"), "1");
        assert_eq!(snap_to_integer("10.000000000000000001"), "10");
        assert_eq!(snap_to_integer("1.5"), "1.5");
        assert_eq!(snap_to_integer("0.000000000000000002"), "0.000000000000000002");
        assert_eq!(snap_to_integer("2.999999999999999999999"), "3");
    }
}
