use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceTickerPrice {
    pub symbol: String,
    pub price: String,
}

/// Symbol -> last price, as Binance reports it.
pub type BinancePrices = BTreeMap<String, String>;
