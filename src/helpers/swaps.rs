//! Swap projections onto a `BASE_QUOTE` market.
//!
//! A swap counts for a pair when its coins match the pair exactly, in either
//! direction. Swaps traded the other way round are flipped so that volumes are
//! always expressed as (base, quote).

use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::{helpers::decimal::safe_div, model::Swap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

/// A swap expressed in the orientation of one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTrade {
    pub uuid: String,
    pub base_amount: BigDecimal,
    pub quote_amount: BigDecimal,
    pub price: BigDecimal,
    pub finished_at: i64,
    pub side: TradeSide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub base_volume: BigDecimal,
    pub quote_volume: BigDecimal,
    pub trades: u64,
    pub oldest: Option<PairTrade>,
    pub newest: Option<PairTrade>,
    pub highest_price: BigDecimal,
    pub lowest_price: BigDecimal,
}

impl Aggregate {
    pub fn price_change(&self) -> BigDecimal {
        match (&self.oldest, &self.newest) {
            (Some(oldest), Some(newest)) => &newest.price - &oldest.price,
            _ => BigDecimal::zero(),
        }
    }

    /// Percent change from the oldest to the newest trade.
    pub fn price_change_pct(&self) -> BigDecimal {
        match &self.oldest {
            Some(oldest) => {
                safe_div(&self.price_change(), &oldest.price)
                    * BigDecimal::from(100)
            },
            None => BigDecimal::zero(),
        }
    }
}

/// Taker amount over maker amount; zero when the maker amount is zero.
pub fn price_at_finish(swap: &Swap) -> BigDecimal {
    safe_div(&swap.taker_amount, &swap.maker_amount)
}

pub fn invert_swap(swap: &Swap) -> Swap {
    Swap {
        maker_coin: swap.taker_coin.to_owned(),
        taker_coin: swap.maker_coin.to_owned(),
        maker_amount: swap.taker_amount.to_owned(),
        taker_amount: swap.maker_amount.to_owned(),
        ..swap.clone()
    }
}

pub fn invert_swaps(swaps: &[Swap]) -> Vec<Swap> {
    swaps.iter().map(invert_swap).collect()
}

/// Projects one swap onto `base`/`quote`, or `None` if it trades another market.
pub fn orient(swap: &Swap, base: &str, quote: &str) -> Option<PairTrade> {
    if !swap.contributes() {
        return None;
    }

    // maker coin on the base side, so the price is quote per base
    let (oriented, side) = if swap.maker_coin == base && swap.taker_coin == quote {
        (swap.clone(), TradeSide::Buy)
    } else if swap.maker_coin == quote && swap.taker_coin == base {
        (invert_swap(swap), TradeSide::Sell)
    } else {
        return None;
    };

    Some(PairTrade {
        price: price_at_finish(&oriented),
        uuid: oriented.uuid,
        base_amount: oriented.maker_amount,
        quote_amount: oriented.taker_amount,
        finished_at: oriented.finished_at,
        side,
    })
}

/// Trades of a pair ordered by completion time.
pub fn trades_for_pair(swaps: &[Swap], base: &str, quote: &str) -> Vec<PairTrade> {
    let mut trades: Vec<PairTrade> = swaps
        .iter()
        .filter_map(|swap| orient(swap, base, quote))
        .collect();
    trades.sort_by(|a, b| {
        a.finished_at
            .cmp(&b.finished_at)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });
    trades
}

pub fn aggregate(swaps: &[Swap], base: &str, quote: &str) -> Aggregate {
    let trades = trades_for_pair(swaps, base, quote);

    let mut base_volume = BigDecimal::zero();
    let mut quote_volume = BigDecimal::zero();
    let mut highest_price: Option<BigDecimal> = None;
    let mut lowest_price: Option<BigDecimal> = None;

    for trade in &trades {
        base_volume += &trade.base_amount;
        quote_volume += &trade.quote_amount;

        if highest_price.as_ref().map_or(true, |high| trade.price > *high) {
            highest_price = Some(trade.price.clone());
        }
        if lowest_price.as_ref().map_or(true, |low| trade.price < *low) {
            lowest_price = Some(trade.price.clone());
        }
    }

    Aggregate {
        base_volume,
        quote_volume,
        trades: trades.len() as u64,
        oldest: trades.first().cloned(),
        newest: trades.last().cloned(),
        highest_price: highest_price.unwrap_or_else(BigDecimal::zero),
        lowest_price: lowest_price.unwrap_or_else(BigDecimal::zero),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::str::FromStr;

    pub(crate) fn swap(
        uuid: &str,
        maker: &str,
        taker: &str,
        maker_amount: &str,
        taker_amount: &str,
        finished_at: i64,
    ) -> Swap {
        Swap {
            uuid: uuid.to_owned(),
            maker_coin: maker.to_owned(),
            taker_coin: taker.to_owned(),
            maker_amount: BigDecimal::from_str(maker_amount).unwrap(),
            taker_amount: BigDecimal::from_str(taker_amount).unwrap(),
            started_at: finished_at - 60,
            finished_at,
            is_success: true,
        }
    }

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_inverted_swap_contributes_flipped_volumes() {
        let swaps = vec![
            swap("a", "KMD", "LTC", "100", "120", 10),
            swap("b", "LTC", "KMD", "50", "40", 20),
        ];

        let agg = aggregate(&swaps, "KMD", "LTC");
        assert_eq!(agg.base_volume, dec("140"));
        assert_eq!(agg.quote_volume, dec("170"));
        assert_eq!(agg.trades, 2);

        let newest = agg.newest.unwrap();
        assert_eq!(newest.uuid, "b");
        assert_eq!(newest.side, TradeSide::Sell);
        assert_eq!(newest.price, dec("1.25"));
        assert_eq!(agg.oldest.unwrap().side, TradeSide::Buy);
        assert_eq!(agg.highest_price, dec("1.25"));
        assert_eq!(agg.lowest_price, dec("1.2"));
    }

    #[test]
    fn test_aggregate_inversion_property() {
        let sets = vec![
            vec![
                swap("a", "KMD", "LTC", "100", "120", 10),
                swap("b", "LTC", "KMD", "50", "40", 20),
            ],
            vec![swap("c", "DOGE", "KMD", "1000", "3.3", 5)],
            vec![
                swap("d", "BTC", "KMD", "0.01", "9000", 7),
                swap("e", "KMD", "BTC", "12000", "0.013", 8),
                swap("f", "KMD", "LTC", "1", "1", 9),
            ],
            vec![],
        ];

        for swaps in sets {
            for (base, quote) in [("KMD", "LTC"), ("BTC", "KMD"), ("KMD", "DOGE")]
            {
                let direct = aggregate(&swaps, base, quote);
                let flipped = aggregate(&invert_swaps(&swaps), quote, base);
                assert_eq!(direct.base_volume, flipped.quote_volume);
                assert_eq!(direct.quote_volume, flipped.base_volume);
                assert_eq!(direct.trades, flipped.trades);
            }
        }
    }

    #[test]
    fn test_variants_are_distinct_markets() {
        let swaps = vec![
            swap("a", "KMD", "LTC-segwit", "1", "2", 1),
            swap("b", "KMD", "LTC", "3", "4", 2),
        ];

        assert_eq!(aggregate(&swaps, "KMD", "LTC").base_volume, dec("3"));
        assert_eq!(aggregate(&swaps, "KMD", "LTC-segwit").base_volume, dec("1"));
    }

    #[test]
    fn test_price_at_finish() {
        let zero = swap("z", "KMD", "LTC", "0", "5", 1);
        assert_eq!(price_at_finish(&zero), BigDecimal::zero());
        assert!(orient(&zero, "KMD", "LTC").is_none());

        let s = swap("s", "KMD", "LTC", "4", "2", 1);
        assert_eq!(price_at_finish(&s), dec("0.5"));
    }

    #[test]
    fn test_orient_prices_quote_per_base() {
        let buy = swap("a", "KMD", "LTC", "100", "120", 10);
        let trade = orient(&buy, "KMD", "LTC").unwrap();
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.price, price_at_finish(&buy));

        let sell = swap("b", "LTC", "KMD", "50", "40", 20);
        let trade = orient(&sell, "KMD", "LTC").unwrap();
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.base_amount, dec("40"));
        assert_eq!(trade.quote_amount, dec("50"));
        assert_eq!(trade.price, price_at_finish(&invert_swap(&sell)));
        assert_eq!(trade.finished_at, 20);

        assert!(orient(&sell, "KMD", "BTC").is_none());
    }

    #[test]
    fn test_price_change_pct() {
        let swaps = vec![
            swap("a", "KMD", "LTC", "1", "2", 1),
            swap("b", "KMD", "LTC", "1", "3", 2),
        ];
        let agg = aggregate(&swaps, "KMD", "LTC");
        assert_eq!(agg.price_change(), dec("1"));
        assert_eq!(agg.price_change_pct(), dec("50"));
    }
}
