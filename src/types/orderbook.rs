use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct KdfOrderbookRequest<'a> {
    pub userpass: &'a str,
    pub method: &'a str,
    pub base: &'a str,
    pub rel: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KdfOrderbook {
    #[serde(default)]
    pub asks: Vec<KdfOrder>,
    #[serde(default)]
    pub bids: Vec<KdfOrder>,
    pub error: Option<String>,
}

/// Prices are quote per base; volumes may arrive as strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KdfOrder {
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub base_max_volume: Value,
    #[serde(default)]
    pub rel_max_volume: Value,
}
