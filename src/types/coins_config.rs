use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry of `coins_config.json`, reduced to the fields the stats use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinConfig {
    #[serde(default)]
    pub coin: String,
    #[serde(default, rename = "type")]
    pub coin_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coingecko_id: String,
    #[serde(default)]
    pub is_testnet: bool,
    #[serde(default)]
    pub wallet_only: bool,
}

pub type CoinsConfig = BTreeMap<String, CoinConfig>;

/// One entry of the legacy `coins` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoinsFileEntry {
    pub coin: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub mm2: Option<u8>,
    #[serde(default)]
    pub wallet_only: bool,
}

pub type CoinsList = BTreeMap<String, CoinsFileEntry>;
