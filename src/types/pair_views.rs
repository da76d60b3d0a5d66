use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every per-pair view is keyed by `BASE_QUOTE`.
pub type PairMap<T> = BTreeMap<String, T>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLastTraded {
    pub ticker_id: String,
    pub base: String,
    pub quote: String,
    pub last_swap_time: i64,
    pub last_swap_uuid: String,
    pub last_price: String,
    pub last_base_amount: String,
    pub last_quote_amount: String,
    pub last_trade_type: String,
    pub priced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairPrices {
    pub ticker_id: String,
    pub base: String,
    pub quote: String,
    pub oldest_price: String,
    pub oldest_price_time: i64,
    pub newest_price: String,
    pub newest_price_time: i64,
    pub highest_price_24hr: String,
    pub lowest_price_24hr: String,
    pub price_change_24hr: String,
    pub price_change_pct_24hr: String,
    pub base_price_usd: String,
    pub quote_price_usd: String,
    pub trades_24hr: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairVolume {
    pub ticker_id: String,
    pub base: String,
    pub quote: String,
    pub base_volume: String,
    pub target_volume: String,
    pub base_volume_usd: String,
    pub quote_volume_usd: String,
    pub volume_usd: String,
    pub trades: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderbookEntry {
    pub price: String,
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairOrderbookExtended {
    pub ticker_id: String,
    pub base: String,
    pub quote: String,
    pub timestamp: i64,
    pub bids: Vec<OrderbookEntry>,
    pub asks: Vec<OrderbookEntry>,
    pub highest_bid: String,
    pub lowest_ask: String,
    pub total_asks_base_vol: String,
    pub total_bids_base_vol: String,
    pub total_asks_quote_vol: String,
    pub total_bids_quote_vol: String,
    pub total_asks_base_usd: String,
    pub total_bids_quote_usd: String,
    pub liquidity_in_usd: String,
    pub base_price_usd: String,
    pub quote_price_usd: String,
    pub newest_price: String,
    pub newest_price_time: i64,
    pub high_24hr: String,
    pub low_24hr: String,
    pub price_change_24hr: String,
    pub price_change_pct_24hr: String,
    pub base_volume_24hr: String,
    pub quote_volume_24hr: String,
    pub volume_usd_24hr: String,
    pub trades_24hr: u64,
    pub last_swap_uuid: String,
    pub last_swap_time: i64,
}
