use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoCoin {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoMarket {
    pub id: String,
    #[serde(default)]
    pub current_price: Option<Number>,
    #[serde(default)]
    pub market_cap: Option<Number>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeckoPrice {
    pub usd_price: String,
    pub usd_market_cap: String,
}

/// CoinGecko id -> USD price and market cap.
pub type GeckoSource = BTreeMap<String, GeckoPrice>;
