//! Cache item names
//!
//! The closed set of cache items. Controllers, producers and the refresher
//! all refer to items through `CacheName`, so an unknown name cannot reach
//! the registry.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheName {
    CoinsConfig,
    Coins,
    GeckoSource,
    FixerRates,
    BinancePrices,
    PairLastTraded,
    PairPrices24hr,
    PairVolumes24hr,
    PairVolumes14d,
    PairOrderbookExtended,
    TickersSummary,
}

/// All cache names, dependencies listed before their dependents.
pub const ALL_CACHE_NAMES: &[CacheName] = &[
    CacheName::CoinsConfig,
    CacheName::Coins,
    CacheName::GeckoSource,
    CacheName::FixerRates,
    CacheName::BinancePrices,
    CacheName::PairLastTraded,
    CacheName::PairPrices24hr,
    CacheName::PairVolumes24hr,
    CacheName::PairVolumes14d,
    CacheName::PairOrderbookExtended,
    CacheName::TickersSummary,
];

impl CacheName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheName::CoinsConfig => "coins_config",
            CacheName::Coins => "coins",
            CacheName::GeckoSource => "gecko_source",
            CacheName::FixerRates => "fixer_rates",
            CacheName::BinancePrices => "binance_prices",
            CacheName::PairLastTraded => "pair_last_traded",
            CacheName::PairPrices24hr => "pair_prices_24hr",
            CacheName::PairVolumes24hr => "pair_volumes_24hr",
            CacheName::PairVolumes14d => "pair_volumes_14d",
            CacheName::PairOrderbookExtended => "pair_orderbook_extended",
            CacheName::TickersSummary => "tickers_summary",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Items whose snapshot must exist before this one can be built.
    pub fn dependencies(&self) -> &'static [CacheName] {
        match self {
            CacheName::CoinsConfig
            | CacheName::Coins
            | CacheName::FixerRates
            | CacheName::BinancePrices => &[],
            CacheName::GeckoSource | CacheName::PairLastTraded => {
                &[CacheName::CoinsConfig]
            },
            CacheName::PairPrices24hr
            | CacheName::PairVolumes24hr
            | CacheName::PairVolumes14d => {
                &[CacheName::CoinsConfig, CacheName::PairLastTraded]
            },
            CacheName::PairOrderbookExtended => &[
                CacheName::CoinsConfig,
                CacheName::PairLastTraded,
                CacheName::PairPrices24hr,
                CacheName::PairVolumes24hr,
            ],
            CacheName::TickersSummary => &[
                CacheName::PairOrderbookExtended,
                CacheName::PairLastTraded,
            ],
        }
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CacheName {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ALL_CACHE_NAMES
            .iter()
            .find(|name| name.as_str() == value)
            .copied()
            .ok_or_else(|| Error::CacheItemNotFound(value.to_owned()))
    }
}

impl Serialize for CacheName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
