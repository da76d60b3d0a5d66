//! Exact decimal helpers. Money, prices and volumes never go through `f64`;
//! `format_10f` is the only presentation form used in external payloads.

use std::str::FromStr;

use anyhow::anyhow;
use bigdecimal::{num_bigint::Sign, BigDecimal, RoundingMode, Zero};
use serde_json::{Number, Value};

use crate::error::Error;

pub const DECIMAL_PLACES: i64 = 10;

pub fn format_10f(value: &BigDecimal) -> String {
    let rounded = value.with_scale_round(DECIMAL_PLACES, RoundingMode::HalfEven);
    let (digits, _) = rounded.as_bigint_and_exponent();
    let negative = digits.sign() == Sign::Minus;
    let places = DECIMAL_PLACES as usize;

    let mut magnitude = digits.magnitude().to_string();
    if magnitude.len() <= places {
        let padding = "0".repeat(places + 1 - magnitude.len());
        magnitude = format!("{}{}", padding, magnitude);
    }

    let (int_part, frac_part) = magnitude.split_at(magnitude.len() - places);
    let sign = if negative { "-" } else { "" };

    format!("{}{}.{}", sign, int_part, frac_part)
}

pub fn zero_10f() -> String {
    format_10f(&BigDecimal::zero())
}

/// Empty strings are treated as zero.
pub fn parse_decimal(value: &str) -> Result<BigDecimal, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(BigDecimal::zero());
    }

    Ok(BigDecimal::from_str(value)?)
}

pub fn decimal_from_number(value: &Number) -> Result<BigDecimal, Error> {
    Ok(BigDecimal::from_str(&value.to_string())?)
}

pub fn decimal_from_value(value: &Value) -> Result<BigDecimal, Error> {
    match value {
        Value::Null => Ok(BigDecimal::zero()),
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => decimal_from_number(n),
        other => Err(anyhow!("{} is not a decimal", other).into()),
    }
}

/// Sums `key` over a set of JSON objects. Missing keys count as zero.
pub fn sum_decimal<'a, I>(rows: I, key: &str) -> Result<BigDecimal, Error>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut total = BigDecimal::zero();

    for row in rows {
        if let Some(value) = row.get(key) {
            total += decimal_from_value(value)?;
        }
    }

    Ok(total)
}

pub fn safe_div(numerator: &BigDecimal, denominator: &BigDecimal) -> BigDecimal {
    if denominator.is_zero() {
        return BigDecimal::zero();
    }

    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_format_10f() {
        assert_eq!(format_10f(&dec("140")), "140.0000000000");
        assert_eq!(format_10f(&BigDecimal::zero()), "0.0000000000");
        assert_eq!(format_10f(&dec("0.00000000001")), "0.0000000000");
        assert_eq!(format_10f(&dec("0.0000000012")), "0.0000000012");
        assert_eq!(format_10f(&dec("-2.5")), "-2.5000000000");
        assert_eq!(format_10f(&dec("1.23456789015")), "1.2345678902");
        assert_eq!(format_10f(&dec("-0.00000000001")), "0.0000000000");
        assert_eq!(format_10f(&dec("1e-5")), "0.0000100000");
        assert_eq!(
            format_10f(&dec("123456789012345678901234567890")),
            "123456789012345678901234567890.0000000000"
        );
    }

    #[test]
    fn test_format_10f_round_trip() {
        for value in ["1", "0.3333333333333", "98765.4321", "-7.00000000005"] {
            let value = dec(value);
            let formatted = format_10f(&value);
            let parsed = dec(&formatted);

            assert_eq!(
                parsed,
                value.with_scale_round(DECIMAL_PLACES, RoundingMode::HalfEven)
            );
            assert_eq!(format_10f(&parsed), formatted);
        }
    }

    #[test]
    fn test_sum_decimal_mixed_inputs() {
        let rows = vec![
            json!({"volume": "1.5"}),
            json!({"volume": 2}),
            json!({"volume": 0.25}),
            json!({"other": "9"}),
            json!({"volume": null}),
        ];

        assert_eq!(sum_decimal(&rows, "volume").unwrap(), dec("3.75"));
        assert!(sum_decimal(&[json!({"volume": true})], "volume").is_err());
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(&dec("10"), &dec("4")), dec("2.5"));
        assert_eq!(safe_div(&dec("10"), &BigDecimal::zero()), BigDecimal::zero());
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("").unwrap(), BigDecimal::zero());
        assert_eq!(parse_decimal(" 1.0e-05 ").unwrap(), dec("0.00001"));
        assert!(parse_decimal("abc").is_err());
    }
}
