use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::helpers::{decimal::parse_decimal, templates::NIL_UUID};

/// One completed atomic swap as read from a `stats_swaps` replica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    pub uuid: String,
    pub maker_coin: String,
    pub taker_coin: String,
    pub maker_amount: BigDecimal,
    pub taker_amount: BigDecimal,
    pub started_at: i64,
    pub finished_at: i64,
    pub is_success: bool,
}

impl Swap {
    /// Only successful swaps with positive amounts feed aggregates.
    pub fn contributes(&self) -> bool {
        self.is_success
            && self.maker_amount > BigDecimal::zero()
            && self.taker_amount > BigDecimal::zero()
    }
}

/// Raw row; every column may be NULL in older replicas.
#[derive(Debug, Clone, FromRow)]
pub struct SwapRow {
    pub uuid: Option<String>,
    pub maker_coin: Option<String>,
    pub taker_coin: Option<String>,
    pub maker_amount: Option<String>,
    pub taker_amount: Option<String>,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub is_success: Option<i64>,
}

fn amount(value: Option<String>) -> BigDecimal {
    value
        .and_then(|v| parse_decimal(&v).ok())
        .unwrap_or_else(BigDecimal::zero)
}

impl From<SwapRow> for Swap {
    fn from(row: SwapRow) -> Self {
        Swap {
            uuid: row.uuid.unwrap_or_else(|| NIL_UUID.to_owned()),
            maker_coin: row.maker_coin.unwrap_or_default(),
            taker_coin: row.taker_coin.unwrap_or_default(),
            maker_amount: amount(row.maker_amount),
            taker_amount: amount(row.taker_amount),
            started_at: row.started_at.unwrap_or(0),
            finished_at: row.finished_at.unwrap_or(0),
            is_success: row.is_success.unwrap_or(0) == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_null_columns_default_to_zero() {
        let row = SwapRow {
            uuid: None,
            maker_coin: Some(String::from("KMD")),
            taker_coin: Some(String::from("LTC")),
            maker_amount: None,
            taker_amount: Some(String::from("not-a-number")),
            started_at: None,
            finished_at: Some(1700000000),
            is_success: Some(1),
        };

        let swap = Swap::from(row);
        assert_eq!(swap.uuid, NIL_UUID);
        assert_eq!(swap.maker_amount, BigDecimal::zero());
        assert_eq!(swap.taker_amount, BigDecimal::zero());
        assert_eq!(swap.started_at, 0);
        assert!(!swap.contributes());
    }

    #[test]
    fn test_contributes() {
        let swap = Swap {
            uuid: String::from("a"),
            maker_coin: String::from("KMD"),
            taker_coin: String::from("LTC"),
            maker_amount: BigDecimal::from_str("1").unwrap(),
            taker_amount: BigDecimal::from_str("2").unwrap(),
            started_at: 1,
            finished_at: 2,
            is_success: true,
        };
        assert!(swap.contributes());

        let failed = Swap {
            is_success: false,
            ..swap
        };
        assert!(!failed.contributes());
    }
}
