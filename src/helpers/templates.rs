//! Zero-valued records for every derived view. Anything a client can ask for
//! has a template, so an absent pair or a never-built item still answers with
//! the full schema.

use std::collections::BTreeMap;

use crate::{
    helpers::{decimal::zero_10f, pair},
    types::{
        FixerRates, PairLastTraded, PairOrderbookExtended, PairPrices,
        PairVolume, TickersSummary,
    },
};

pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

pub trait PairTemplate: Sized {
    fn template(base: &str, quote: &str) -> Self;
}

impl PairTemplate for PairLastTraded {
    fn template(base: &str, quote: &str) -> Self {
        PairLastTraded {
            ticker_id: pair::join(base, quote),
            base: base.to_owned(),
            quote: quote.to_owned(),
            last_swap_time: 0,
            last_swap_uuid: NIL_UUID.to_owned(),
            last_price: zero_10f(),
            last_base_amount: zero_10f(),
            last_quote_amount: zero_10f(),
            last_trade_type: String::new(),
            priced: false,
        }
    }
}

impl PairTemplate for PairPrices {
    fn template(base: &str, quote: &str) -> Self {
        PairPrices {
            ticker_id: pair::join(base, quote),
            base: base.to_owned(),
            quote: quote.to_owned(),
            oldest_price: zero_10f(),
            oldest_price_time: 0,
            newest_price: zero_10f(),
            newest_price_time: 0,
            highest_price_24hr: zero_10f(),
            lowest_price_24hr: zero_10f(),
            price_change_24hr: zero_10f(),
            price_change_pct_24hr: zero_10f(),
            base_price_usd: zero_10f(),
            quote_price_usd: zero_10f(),
            trades_24hr: 0,
        }
    }
}

impl PairTemplate for PairVolume {
    fn template(base: &str, quote: &str) -> Self {
        PairVolume {
            ticker_id: pair::join(base, quote),
            base: base.to_owned(),
            quote: quote.to_owned(),
            base_volume: zero_10f(),
            target_volume: zero_10f(),
            base_volume_usd: zero_10f(),
            quote_volume_usd: zero_10f(),
            volume_usd: zero_10f(),
            trades: 0,
        }
    }
}

impl PairTemplate for PairOrderbookExtended {
    fn template(base: &str, quote: &str) -> Self {
        PairOrderbookExtended {
            ticker_id: pair::join(base, quote),
            base: base.to_owned(),
            quote: quote.to_owned(),
            timestamp: 0,
            bids: vec![],
            asks: vec![],
            highest_bid: zero_10f(),
            lowest_ask: zero_10f(),
            total_asks_base_vol: zero_10f(),
            total_bids_base_vol: zero_10f(),
            total_asks_quote_vol: zero_10f(),
            total_bids_quote_vol: zero_10f(),
            total_asks_base_usd: zero_10f(),
            total_bids_quote_usd: zero_10f(),
            liquidity_in_usd: zero_10f(),
            base_price_usd: zero_10f(),
            quote_price_usd: zero_10f(),
            newest_price: zero_10f(),
            newest_price_time: 0,
            high_24hr: zero_10f(),
            low_24hr: zero_10f(),
            price_change_24hr: zero_10f(),
            price_change_pct_24hr: zero_10f(),
            base_volume_24hr: zero_10f(),
            quote_volume_24hr: zero_10f(),
            volume_usd_24hr: zero_10f(),
            trades_24hr: 0,
            last_swap_uuid: NIL_UUID.to_owned(),
            last_swap_time: 0,
        }
    }
}

pub fn tickers_summary() -> TickersSummary {
    TickersSummary {
        last_update: 0,
        pairs_count: 0,
        swaps_count: 0,
        combined_volume_usd: zero_10f(),
        combined_liquidity_usd: zero_10f(),
        data: vec![],
    }
}

pub fn fixer_rates() -> FixerRates {
    FixerRates {
        timestamp: 0,
        date: String::new(),
        base: String::from("USD"),
        rates: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_joins_pair() {
        let volume = PairVolume::template("KMD", "LTC");
        assert_eq!(volume.ticker_id, "KMD_LTC");
        assert_eq!(volume.base, "KMD");
        assert_eq!(volume.quote, "LTC");
        assert_eq!(volume.volume_usd, "0.0000000000");
    }

    #[test]
    fn test_templates_carry_nil_uuid() {
        assert_eq!(PairLastTraded::template("A", "B").last_swap_uuid, NIL_UUID);
        assert_eq!(
            PairOrderbookExtended::template("A", "B").last_swap_uuid,
            NIL_UUID
        );
        assert_eq!(tickers_summary().combined_volume_usd, "0.0000000000");
        assert_eq!(fixer_rates().base, "USD");
    }
}
