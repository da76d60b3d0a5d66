use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    cache_keys::CacheName,
    error::Error,
    types::{
        BinancePrices, CoinsConfig, CoinsList, FixerRates, GeckoSource,
        PairLastTraded, PairMap, PairOrderbookExtended, PairPrices, PairVolume,
        TickersSummary,
    },
};

/// Holds the published snapshot of one cache item.
///
/// Readers clone the `Arc` and drop the lock immediately; a publish swaps the
/// reference, so a reader keeps whichever generation it picked up.
pub struct Slot<T> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<Arc<T>> {
        self.value.read().await.clone()
    }

    /// Like `get`, for producers that cannot run without this snapshot.
    pub async fn require(&self, name: CacheName) -> Result<Arc<T>, Error> {
        self.get()
            .await
            .ok_or_else(|| Error::CacheItemNotFound(name.to_string()))
    }

    pub async fn put(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        *self.value.write().await = Some(Arc::clone(&value));
        value
    }

    pub async fn is_empty(&self) -> bool {
        self.value.read().await.is_none()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").finish()
    }
}

/// In-memory snapshots, one typed slot per cache item.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    pub coins_config: Slot<CoinsConfig>,
    pub coins: Slot<CoinsList>,
    pub gecko_source: Slot<GeckoSource>,
    pub fixer_rates: Slot<FixerRates>,
    pub binance_prices: Slot<BinancePrices>,
    pub pair_last_traded: Slot<PairMap<PairLastTraded>>,
    pub pair_prices_24hr: Slot<PairMap<PairPrices>>,
    pub pair_volumes_24hr: Slot<PairMap<PairVolume>>,
    pub pair_volumes_14d: Slot<PairMap<PairVolume>>,
    pub pair_orderbook_extended: Slot<PairMap<PairOrderbookExtended>>,
    pub tickers_summary: Slot<TickersSummary>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_snapshot(&self, name: CacheName) -> bool {
        let empty = match name {
            CacheName::CoinsConfig => self.coins_config.is_empty().await,
            CacheName::Coins => self.coins.is_empty().await,
            CacheName::GeckoSource => self.gecko_source.is_empty().await,
            CacheName::FixerRates => self.fixer_rates.is_empty().await,
            CacheName::BinancePrices => self.binance_prices.is_empty().await,
            CacheName::PairLastTraded => self.pair_last_traded.is_empty().await,
            CacheName::PairPrices24hr => self.pair_prices_24hr.is_empty().await,
            CacheName::PairVolumes24hr => {
                self.pair_volumes_24hr.is_empty().await
            },
            CacheName::PairVolumes14d => self.pair_volumes_14d.is_empty().await,
            CacheName::PairOrderbookExtended => {
                self.pair_orderbook_extended.is_empty().await
            },
            CacheName::TickersSummary => self.tickers_summary.is_empty().await,
        };

        !empty
    }
}
