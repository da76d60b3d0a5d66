//! Pair records seen from the other side of the market.
//!
//! Views are stored under one orientation only. Asking for `QUOTE_BASE`
//! re-projects the stored `BASE_QUOTE` record: prices become reciprocals and
//! base/quote quantities trade places.

use bigdecimal::{BigDecimal, One};

use crate::{
    error::Error,
    helpers::{
        decimal::{format_10f, parse_decimal, safe_div},
        pair,
        swaps::TradeSide,
    },
    types::{
        OrderbookEntry, PairLastTraded, PairOrderbookExtended, PairPrices,
        PairVolume,
    },
};

pub trait InvertPair: Sized {
    /// The same record keyed by `invert(ticker_id)`.
    fn inverted(&self) -> Result<Self, Error>;
}

fn reciprocal(price: &BigDecimal) -> BigDecimal {
    safe_div(&BigDecimal::one(), price)
}

fn reciprocal_10f(price: &str) -> Result<String, Error> {
    Ok(format_10f(&reciprocal(&parse_decimal(price)?)))
}

/// Change and percent change from `oldest` to `newest`.
fn change_10f(oldest: &BigDecimal, newest: &BigDecimal) -> (String, String) {
    let change = newest - oldest;
    let pct = safe_div(&change, oldest) * BigDecimal::from(100);
    (format_10f(&change), format_10f(&pct))
}

fn flip_side(side: &str) -> String {
    let buy = TradeSide::Buy.to_string();
    let sell = TradeSide::Sell.to_string();

    if side == buy {
        sell
    } else if side == sell {
        buy
    } else {
        side.to_owned()
    }
}

/// An order selling base for quote is, inverted, an order buying the new base.
fn invert_entries(entries: &[OrderbookEntry]) -> Result<Vec<OrderbookEntry>, Error> {
    entries
        .iter()
        .map(|entry| {
            let price = parse_decimal(&entry.price)?;
            let volume = parse_decimal(&entry.volume)?;
            Ok(OrderbookEntry {
                price: format_10f(&reciprocal(&price)),
                volume: format_10f(&(volume * &price)),
            })
        })
        .collect()
}

impl InvertPair for PairLastTraded {
    fn inverted(&self) -> Result<Self, Error> {
        Ok(PairLastTraded {
            ticker_id: pair::invert(&self.ticker_id),
            base: self.quote.to_owned(),
            quote: self.base.to_owned(),
            last_swap_time: self.last_swap_time,
            last_swap_uuid: self.last_swap_uuid.to_owned(),
            last_price: reciprocal_10f(&self.last_price)?,
            last_base_amount: self.last_quote_amount.to_owned(),
            last_quote_amount: self.last_base_amount.to_owned(),
            last_trade_type: flip_side(&self.last_trade_type),
            priced: self.priced,
        })
    }
}

impl InvertPair for PairPrices {
    fn inverted(&self) -> Result<Self, Error> {
        let oldest = reciprocal(&parse_decimal(&self.oldest_price)?);
        let newest = reciprocal(&parse_decimal(&self.newest_price)?);
        let (price_change, price_change_pct) = change_10f(&oldest, &newest);

        Ok(PairPrices {
            ticker_id: pair::invert(&self.ticker_id),
            base: self.quote.to_owned(),
            quote: self.base.to_owned(),
            oldest_price: format_10f(&oldest),
            oldest_price_time: self.oldest_price_time,
            newest_price: format_10f(&newest),
            newest_price_time: self.newest_price_time,
            highest_price_24hr: reciprocal_10f(&self.lowest_price_24hr)?,
            lowest_price_24hr: reciprocal_10f(&self.highest_price_24hr)?,
            price_change_24hr: price_change,
            price_change_pct_24hr: price_change_pct,
            base_price_usd: self.quote_price_usd.to_owned(),
            quote_price_usd: self.base_price_usd.to_owned(),
            trades_24hr: self.trades_24hr,
        })
    }
}

impl InvertPair for PairVolume {
    fn inverted(&self) -> Result<Self, Error> {
        Ok(PairVolume {
            ticker_id: pair::invert(&self.ticker_id),
            base: self.quote.to_owned(),
            quote: self.base.to_owned(),
            base_volume: self.target_volume.to_owned(),
            target_volume: self.base_volume.to_owned(),
            base_volume_usd: self.quote_volume_usd.to_owned(),
            quote_volume_usd: self.base_volume_usd.to_owned(),
            volume_usd: self.volume_usd.to_owned(),
            trades: self.trades,
        })
    }
}

impl InvertPair for PairOrderbookExtended {
    fn inverted(&self) -> Result<Self, Error> {
        // only the newest price and its change are kept, the oldest is implied
        let newest = parse_decimal(&self.newest_price)?;
        let oldest = &newest - parse_decimal(&self.price_change_24hr)?;
        let newest = reciprocal(&newest);
        let (price_change, price_change_pct) =
            change_10f(&reciprocal(&oldest), &newest);

        Ok(PairOrderbookExtended {
            ticker_id: pair::invert(&self.ticker_id),
            base: self.quote.to_owned(),
            quote: self.base.to_owned(),
            timestamp: self.timestamp,
            bids: invert_entries(&self.asks)?,
            asks: invert_entries(&self.bids)?,
            highest_bid: reciprocal_10f(&self.lowest_ask)?,
            lowest_ask: reciprocal_10f(&self.highest_bid)?,
            total_asks_base_vol: self.total_bids_quote_vol.to_owned(),
            total_bids_base_vol: self.total_asks_quote_vol.to_owned(),
            total_asks_quote_vol: self.total_bids_base_vol.to_owned(),
            total_bids_quote_vol: self.total_asks_base_vol.to_owned(),
            total_asks_base_usd: self.total_bids_quote_usd.to_owned(),
            total_bids_quote_usd: self.total_asks_base_usd.to_owned(),
            liquidity_in_usd: self.liquidity_in_usd.to_owned(),
            base_price_usd: self.quote_price_usd.to_owned(),
            quote_price_usd: self.base_price_usd.to_owned(),
            newest_price: format_10f(&newest),
            newest_price_time: self.newest_price_time,
            high_24hr: reciprocal_10f(&self.low_24hr)?,
            low_24hr: reciprocal_10f(&self.high_24hr)?,
            price_change_24hr: price_change,
            price_change_pct_24hr: price_change_pct,
            base_volume_24hr: self.quote_volume_24hr.to_owned(),
            quote_volume_24hr: self.base_volume_24hr.to_owned(),
            volume_usd_24hr: self.volume_usd_24hr.to_owned(),
            trades_24hr: self.trades_24hr,
            last_swap_uuid: self.last_swap_uuid.to_owned(),
            last_swap_time: self.last_swap_time,
        })
    }
}
