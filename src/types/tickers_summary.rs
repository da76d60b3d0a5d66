use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerItem {
    pub ticker_id: String,
    pub base_currency: String,
    pub target_currency: String,
    pub last_price: String,
    pub last_trade: i64,
    pub last_swap_uuid: String,
    pub base_volume: String,
    pub target_volume: String,
    pub base_price_usd: String,
    pub target_price_usd: String,
    pub bid: String,
    pub ask: String,
    pub high: String,
    pub low: String,
    pub price_change_24hr: String,
    pub price_change_pct_24hr: String,
    pub volume_usd_24hr: String,
    pub liquidity_in_usd: String,
    pub trades_24hr: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickersSummary {
    pub last_update: i64,
    pub pairs_count: u64,
    pub swaps_count: u64,
    pub combined_volume_usd: String,
    pub combined_liquidity_usd: String,
    pub data: Vec<TickerItem>,
}
