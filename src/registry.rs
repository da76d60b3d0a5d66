//! Cache item registry
//!
//! Static table of cache items with their TTLs, files and dependencies, plus
//! the per-item build token. `run_build` is the only way a snapshot gets
//! published: produce, persist (temp file + rename), publish, stamp.

use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};
use tracing::{debug, error};

use crate::{
    cache::Slot,
    cache_keys::{CacheName, ALL_CACHE_NAMES},
    configuration::{AppState, Config, State},
    error::Error,
    handler::{binance, coins, fixer, gecko, pairs, tickers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Built,
    /// Another build of the same item held the token; this one was dropped.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct CacheItem {
    pub name: CacheName,
    pub ttl: Duration,
    pub file_path: PathBuf,
    pub dependencies: &'static [CacheName],
}

#[derive(Debug, Default, Clone, Copy)]
struct Stamps {
    last_built_at: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct ItemState {
    token: Mutex<()>,
    stamps: RwLock<Stamps>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheItemStatus {
    pub name: CacheName,
    pub ttl_seconds: u64,
    pub file_path: String,
    pub dependencies: Vec<CacheName>,
    pub last_built_at: Option<DateTime<Utc>>,
    pub building: bool,
    pub has_snapshot: bool,
}

#[derive(Debug)]
pub struct Registry {
    items: BTreeMap<CacheName, CacheItem>,
    states: BTreeMap<CacheName, ItemState>,
    levels: Vec<Vec<CacheName>>,
    retry_interval: Duration,
}

impl Registry {
    pub fn new(config: &Config) -> Result<Registry, Error> {
        let mut items = BTreeMap::new();
        let mut states = BTreeMap::new();

        for name in ALL_CACHE_NAMES {
            let item = CacheItem {
                name: *name,
                ttl: config.ttl(*name),
                file_path: config.cache_file_path(*name),
                dependencies: name.dependencies(),
            };
            items.insert(*name, item);
            states.insert(*name, ItemState::default());
        }

        let levels = dependency_levels(&items)?;

        Ok(Registry {
            items,
            states,
            levels,
            retry_interval: Duration::from_secs(config.retry_interval),
        })
    }

    pub fn item(&self, name: CacheName) -> Result<&CacheItem, Error> {
        self.items
            .get(&name)
            .ok_or_else(|| Error::CacheItemNotFound(name.to_string()))
    }

    fn state(&self, name: CacheName) -> Result<&ItemState, Error> {
        self.states
            .get(&name)
            .ok_or_else(|| Error::CacheItemNotFound(name.to_string()))
    }

    /// Items grouped so that every item comes after all of its dependencies.
    pub fn levels(&self) -> &[Vec<CacheName>] {
        &self.levels
    }

    pub async fn last_built_at(
        &self,
        name: CacheName,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        Ok(self.state(name)?.stamps.read().await.last_built_at)
    }

    pub fn is_building(&self, name: CacheName) -> Result<bool, Error> {
        Ok(self.state(name)?.token.try_lock().is_err())
    }

    /// Items whose TTL has run out, or that failed and are past the retry
    /// interval.
    pub async fn due_items(&self, now: DateTime<Utc>) -> Vec<CacheName> {
        let mut due = vec![];

        for (name, item) in &self.items {
            let Some(state) = self.states.get(name) else {
                continue;
            };
            let stamps = *state.stamps.read().await;
            if is_due(item.ttl, self.retry_interval, stamps, now) {
                due.push(*name);
            }
        }

        due
    }

    /// Runs `producer` under the item's build token and publishes the result.
    /// A failed producer leaves the published snapshot untouched.
    pub async fn run_build<T, F>(
        &self,
        name: CacheName,
        slot: &Slot<T>,
        producer: F,
    ) -> Result<BuildOutcome, Error>
    where
        T: Serialize,
        F: Future<Output = Result<T, Error>>,
    {
        let item = self.item(name)?;
        let state = self.state(name)?;

        let Ok(_token) = state.token.try_lock() else {
            debug!("Build of {} already in flight, tick dropped", name);
            return Ok(BuildOutcome::Skipped);
        };

        state.stamps.write().await.last_attempt = Some(Utc::now());

        let result = async {
            let value = producer.await?;
            persist(&item.file_path, &value).await?;
            Ok::<T, Error>(value)
        }
        .await;

        match result {
            Ok(value) => {
                slot.put(value).await;
                state.stamps.write().await.last_built_at = Some(Utc::now());
                debug!("Cache {} built", name);
                Ok(BuildOutcome::Built)
            },
            Err(e) => {
                let last_built_at = state.stamps.read().await.last_built_at;
                error!(
                    name = %name,
                    cause = %e,
                    last_built_at = ?last_built_at,
                    "Cache build failed, keeping previous snapshot"
                );
                Err(e)
            },
        }
    }

    /// Publishes the persisted file as a provisional snapshot. The item still
    /// counts as never built, so the scheduler builds it right away.
    pub async fn load_persisted<T>(
        &self,
        name: CacheName,
        slot: &Slot<T>,
    ) -> Result<(), Error>
    where
        T: DeserializeOwned,
    {
        let item = self.item(name)?;

        let bytes = match fs::read(&item.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::CacheFileMissing(
                    item.file_path.display().to_string(),
                ));
            },
            Err(e) => return Err(e.into()),
        };

        let value: T = serde_json::from_slice(&bytes)?;
        slot.put(value).await;

        Ok(())
    }
}

fn is_due(
    ttl: Duration,
    retry: Duration,
    stamps: Stamps,
    now: DateTime<Utc>,
) -> bool {
    let ttl = to_chrono(ttl);
    let retry = to_chrono(retry);

    if let Some(built) = stamps.last_built_at {
        if built + ttl > now {
            return false;
        }
    }

    match (stamps.last_attempt, stamps.last_built_at) {
        (Some(attempt), Some(built)) if attempt > built => attempt + retry <= now,
        (Some(attempt), None) => attempt + retry <= now,
        _ => true,
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration)
        .unwrap_or_else(|_| chrono::Duration::days(36500))
}

fn dependency_levels(
    items: &BTreeMap<CacheName, CacheItem>,
) -> Result<Vec<Vec<CacheName>>, Error> {
    let mut depth: BTreeMap<CacheName, usize> = BTreeMap::new();

    while depth.len() < items.len() {
        let mut progressed = false;

        for (name, item) in items {
            if depth.contains_key(name) {
                continue;
            }

            let mut level = 0;
            let mut ready = true;
            for dependency in item.dependencies {
                if !items.contains_key(dependency) {
                    return Err(Error::CacheItemNotFound(format!(
                        "{} depends on unregistered {}",
                        name, dependency
                    )));
                }
                match depth.get(dependency) {
                    Some(d) => level = level.max(d + 1),
                    None => ready = false,
                }
            }

            if ready {
                depth.insert(*name, level);
                progressed = true;
            }
        }

        if !progressed {
            return Err(Error::ConfigurationError(String::from(
                "cache item dependencies contain a cycle",
            )));
        }
    }

    let count = depth.values().max().map(|d| d + 1).unwrap_or(0);
    let mut levels = vec![vec![]; count];
    for (name, d) in depth {
        levels[d].push(name);
    }

    Ok(levels)
}

/// Writes `value` as pretty JSON with sorted keys: temp file, then rename.
async fn persist<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let value = serde_json::to_value(value)?;
    let bytes = serde_json::to_vec_pretty(&value)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp_path, &bytes).await?;
    fs::rename(&tmp_path, path).await?;

    Ok(())
}

/// Builds one item with its producer.
pub async fn build(
    app_state: &AppState<State>,
    name: CacheName,
) -> Result<BuildOutcome, Error> {
    let registry = &app_state.registry;
    let store = &app_state.store;

    match name {
        CacheName::CoinsConfig => {
            registry
                .run_build(
                    name,
                    &store.coins_config,
                    coins::build_coins_config(app_state),
                )
                .await
        },
        CacheName::Coins => {
            registry
                .run_build(name, &store.coins, coins::build_coins(app_state))
                .await
        },
        CacheName::GeckoSource => {
            registry
                .run_build(
                    name,
                    &store.gecko_source,
                    gecko::build_gecko_source(app_state),
                )
                .await
        },
        CacheName::FixerRates => {
            registry
                .run_build(
                    name,
                    &store.fixer_rates,
                    fixer::build_fixer_rates(app_state),
                )
                .await
        },
        CacheName::BinancePrices => {
            registry
                .run_build(
                    name,
                    &store.binance_prices,
                    binance::build_binance_prices(app_state),
                )
                .await
        },
        CacheName::PairLastTraded => {
            registry
                .run_build(
                    name,
                    &store.pair_last_traded,
                    pairs::build_last_traded(app_state),
                )
                .await
        },
        CacheName::PairPrices24hr => {
            registry
                .run_build(
                    name,
                    &store.pair_prices_24hr,
                    pairs::build_prices_24hr(app_state),
                )
                .await
        },
        CacheName::PairVolumes24hr => {
            registry
                .run_build(
                    name,
                    &store.pair_volumes_24hr,
                    pairs::build_volumes(app_state, 1),
                )
                .await
        },
        CacheName::PairVolumes14d => {
            registry
                .run_build(
                    name,
                    &store.pair_volumes_14d,
                    pairs::build_volumes(app_state, 14),
                )
                .await
        },
        CacheName::PairOrderbookExtended => {
            registry
                .run_build(
                    name,
                    &store.pair_orderbook_extended,
                    pairs::build_orderbook_extended(app_state),
                )
                .await
        },
        CacheName::TickersSummary => {
            registry
                .run_build(
                    name,
                    &store.tickers_summary,
                    tickers::build_tickers_summary(app_state),
                )
                .await
        },
    }
}

/// Loads the persisted file of one item as a provisional snapshot.
pub async fn load(
    app_state: &AppState<State>,
    name: CacheName,
) -> Result<(), Error> {
    let registry = &app_state.registry;
    let store = &app_state.store;

    match name {
        CacheName::CoinsConfig => {
            registry.load_persisted(name, &store.coins_config).await
        },
        CacheName::Coins => registry.load_persisted(name, &store.coins).await,
        CacheName::GeckoSource => {
            registry.load_persisted(name, &store.gecko_source).await
        },
        CacheName::FixerRates => {
            registry.load_persisted(name, &store.fixer_rates).await
        },
        CacheName::BinancePrices => {
            registry.load_persisted(name, &store.binance_prices).await
        },
        CacheName::PairLastTraded => {
            registry.load_persisted(name, &store.pair_last_traded).await
        },
        CacheName::PairPrices24hr => {
            registry.load_persisted(name, &store.pair_prices_24hr).await
        },
        CacheName::PairVolumes24hr => {
            registry.load_persisted(name, &store.pair_volumes_24hr).await
        },
        CacheName::PairVolumes14d => {
            registry.load_persisted(name, &store.pair_volumes_14d).await
        },
        CacheName::PairOrderbookExtended => {
            registry
                .load_persisted(name, &store.pair_orderbook_extended)
                .await
        },
        CacheName::TickersSummary => {
            registry.load_persisted(name, &store.tickers_summary).await
        },
    }
}

/// Current snapshot of an item as JSON, `None` if nothing was published yet.
pub async fn get(
    app_state: &AppState<State>,
    name: CacheName,
) -> Result<Option<serde_json::Value>, Error> {
    let store = &app_state.store;

    let value = match name {
        CacheName::CoinsConfig => to_json(store.coins_config.get().await)?,
        CacheName::Coins => to_json(store.coins.get().await)?,
        CacheName::GeckoSource => to_json(store.gecko_source.get().await)?,
        CacheName::FixerRates => to_json(store.fixer_rates.get().await)?,
        CacheName::BinancePrices => to_json(store.binance_prices.get().await)?,
        CacheName::PairLastTraded => {
            to_json(store.pair_last_traded.get().await)?
        },
        CacheName::PairPrices24hr => {
            to_json(store.pair_prices_24hr.get().await)?
        },
        CacheName::PairVolumes24hr => {
            to_json(store.pair_volumes_24hr.get().await)?
        },
        CacheName::PairVolumes14d => {
            to_json(store.pair_volumes_14d.get().await)?
        },
        CacheName::PairOrderbookExtended => {
            to_json(store.pair_orderbook_extended.get().await)?
        },
        CacheName::TickersSummary => {
            to_json(store.tickers_summary.get().await)?
        },
    };

    Ok(value)
}

fn to_json<T: Serialize>(
    value: Option<std::sync::Arc<T>>,
) -> Result<Option<serde_json::Value>, Error> {
    match value {
        Some(value) => Ok(Some(serde_json::to_value(value.as_ref())?)),
        None => Ok(None),
    }
}

pub async fn list(
    app_state: &AppState<State>,
) -> Result<Vec<CacheItemStatus>, Error> {
    let registry = &app_state.registry;
    let mut items = vec![];

    for name in ALL_CACHE_NAMES {
        let item = registry.item(*name)?;
        items.push(CacheItemStatus {
            name: *name,
            ttl_seconds: item.ttl.as_secs(),
            file_path: item.file_path.display().to_string(),
            dependencies: item.dependencies.to_vec(),
            last_built_at: registry.last_built_at(*name).await?,
            building: registry.is_building(*name)?,
            has_snapshot: app_state.store.has_snapshot(*name).await,
        });
    }

    Ok(items)
}

/// Schedules a build without waiting for it. Used by routes that find an
/// item never built.
pub fn spawn_build(app_state: AppState<State>, name: CacheName) {
    tokio::spawn(async move {
        if let Err(e) = build(&app_state, name).await {
            debug!("Background build of {} failed: {}", name, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        helpers::templates,
        provider::HTTP,
        types::{FixerRates, TickersSummary},
    };
    use std::sync::Arc;

    fn registry(dir: &Path) -> Registry {
        Registry::new(&Config::for_tests(dir)).unwrap()
    }

    fn summary(pairs_count: u64) -> TickersSummary {
        let mut summary = templates::tickers_summary();
        summary.pairs_count = pairs_count;
        summary
    }

    #[test]
    fn test_dependency_levels() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let levels = registry.levels();

        assert_eq!(
            levels[0],
            vec![
                CacheName::CoinsConfig,
                CacheName::Coins,
                CacheName::FixerRates,
                CacheName::BinancePrices
            ]
        );
        assert_eq!(
            levels[1],
            vec![CacheName::GeckoSource, CacheName::PairLastTraded]
        );
        assert_eq!(levels.last().unwrap(), &vec![CacheName::TickersSummary]);
        assert_eq!(
            levels.iter().map(Vec::len).sum::<usize>(),
            ALL_CACHE_NAMES.len()
        );
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        let ttl = Duration::from_secs(60);
        let retry = Duration::from_secs(30);
        let ago = |secs| Some(now - chrono::Duration::seconds(secs));

        let never = Stamps::default();
        assert!(is_due(ttl, retry, never, now));

        let fresh = Stamps {
            last_built_at: ago(10),
            last_attempt: ago(12),
        };
        assert!(!is_due(ttl, retry, fresh, now));

        let expired = Stamps {
            last_built_at: ago(61),
            last_attempt: ago(62),
        };
        assert!(is_due(ttl, retry, expired, now));

        let failed_recently = Stamps {
            last_built_at: ago(120),
            last_attempt: ago(10),
        };
        assert!(!is_due(ttl, retry, failed_recently, now));

        let failed_long_ago = Stamps {
            last_built_at: None,
            last_attempt: ago(31),
        };
        assert!(is_due(ttl, retry, failed_long_ago, now));
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let slot = Slot::new();

        let outcome = registry
            .run_build(CacheName::TickersSummary, &slot, async { Ok(summary(3)) })
            .await
            .unwrap();
        assert_eq!(outcome, BuildOutcome::Built);
        let built_at = registry
            .last_built_at(CacheName::TickersSummary)
            .await
            .unwrap();
        assert!(built_at.is_some());

        let failed = registry
            .run_build(CacheName::TickersSummary, &slot, async {
                Err::<TickersSummary, Error>(Error::UpstreamTransport(
                    String::from("seed node unreachable"),
                ))
            })
            .await;
        assert!(matches!(failed, Err(Error::UpstreamTransport(_))));

        assert_eq!(slot.get().await.unwrap().pairs_count, 3);
        assert_eq!(
            registry.last_built_at(CacheName::TickersSummary).await.unwrap(),
            built_at
        );
    }

    #[tokio::test]
    async fn test_concurrent_tick_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(registry(dir.path()));
        let slot = Arc::new(Slot::new());
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let first = {
            let registry = Arc::clone(&registry);
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                registry
                    .run_build(CacheName::FixerRates, slot.as_ref(), async {
                        let _ = wait.await;
                        Ok(templates::fixer_rates())
                    })
                    .await
            })
        };

        while !registry.is_building(CacheName::FixerRates).unwrap() {
            tokio::task::yield_now().await;
        }

        let second = registry
            .run_build(CacheName::FixerRates, slot.as_ref(), async {
                Ok::<FixerRates, Error>(templates::fixer_rates())
            })
            .await
            .unwrap();
        assert_eq!(second, BuildOutcome::Skipped);

        release.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), BuildOutcome::Built);
        assert!(!registry.is_building(CacheName::FixerRates).unwrap());
    }

    #[tokio::test]
    async fn test_rebuild_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        let slot = Slot::new();
        let path = registry.item(CacheName::FixerRates).unwrap().file_path.clone();

        let rates = || {
            let mut rates = templates::fixer_rates();
            rates.timestamp = 1700000000;
            rates.rates.insert(String::from("ZAR"), String::from("18.1"));
            rates.rates.insert(String::from("AUD"), String::from("1.5"));
            rates
        };

        registry
            .run_build(CacheName::FixerRates, &slot, async { Ok(rates()) })
            .await
            .unwrap();
        let first = std::fs::read(&path).unwrap();

        registry
            .run_build(CacheName::FixerRates, &slot, async { Ok(rates()) })
            .await
            .unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.find("\"AUD\"").unwrap() < text.find("\"ZAR\"").unwrap());
        assert!(text.find("\"base\"").unwrap() < text.find("\"timestamp\"").unwrap());
        assert!(!path.with_file_name(".fixer_rates.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_persisted_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path());
        let state = State::new(config.clone(), HTTP::new(config).unwrap()).unwrap();
        let app_state = AppState::new(state);

        assert!(matches!(
            load(&app_state, CacheName::TickersSummary).await,
            Err(Error::CacheFileMissing(_))
        ));

        persist(
            &app_state
                .registry
                .item(CacheName::TickersSummary)
                .unwrap()
                .file_path,
            &summary(7),
        )
        .await
        .unwrap();

        load(&app_state, CacheName::TickersSummary).await.unwrap();
        let value = get(&app_state, CacheName::TickersSummary)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["pairs_count"], 7);
        assert!(app_state
            .registry
            .last_built_at(CacheName::TickersSummary)
            .await
            .unwrap()
            .is_none());

        let items = list(&app_state).await.unwrap();
        assert_eq!(items.len(), ALL_CACHE_NAMES.len());
        let tickers = items
            .iter()
            .find(|item| item.name == CacheName::TickersSummary)
            .unwrap();
        assert!(tickers.has_snapshot);
        assert!(!tickers.building);
    }
}
