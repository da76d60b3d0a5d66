//! Background cache refresh task
//!
//! Loads the persisted snapshots, populates every item once in dependency
//! order, then polls the registry for items whose TTL ran out.

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::{
    cache_keys::{CacheName, ALL_CACHE_NAMES},
    configuration::{AppState, State},
    error::Error,
    registry::{self, BuildOutcome},
};

/// Maximum number of concurrent builds within one dependency level
const MAX_CONCURRENT_REFRESHES: usize = 4;

/// Higher than normal since we want startup to be fast
const MAX_CONCURRENT_INITIAL_REFRESHES: usize = 6;

pub async fn cache_refresh_task(app_state: AppState<State>) -> Result<(), Error> {
    info!("Starting cache refresh background task");

    load_persisted_snapshots(&app_state).await;

    info!("Performing initial cache population...");
    let (succeeded, failed) = refresh_levels(
        &app_state,
        app_state.registry.levels().to_vec(),
        MAX_CONCURRENT_INITIAL_REFRESHES,
    )
    .await;
    info!(
        "Initial cache population complete: {} succeeded, {} failed",
        succeeded, failed
    );

    let period = Duration::from_secs(app_state.config.refresh_check_interval);
    let mut check_interval = interval(period);

    loop {
        check_interval.tick().await;

        let due = app_state.registry.due_items(Utc::now()).await;
        if due.is_empty() {
            continue;
        }

        debug!("Refreshing {} caches: {:?}", due.len(), due);
        let levels = due_levels(app_state.registry.levels(), &due);
        let app = app_state.clone();

        // overlapping ticks are dropped by the per-item build token
        tokio::spawn(async move {
            refresh_levels(&app, levels, MAX_CONCURRENT_REFRESHES).await;
        });
    }
}

/// Publishes whatever was persisted by the previous run so reads have data
/// before the first build completes.
async fn load_persisted_snapshots(app_state: &AppState<State>) {
    let mut loaded = 0;

    for name in ALL_CACHE_NAMES {
        match registry::load(app_state, *name).await {
            Ok(()) => loaded += 1,
            Err(Error::CacheFileMissing(path)) => {
                debug!("No persisted snapshot for {}: {}", name, path);
            },
            Err(e) => warn!("Persisted snapshot for {} not loaded: {}", name, e),
        }
    }

    info!("Loaded {} persisted snapshots", loaded);
}

/// Keeps only `due` items, preserving the dependency order of `levels`.
pub fn due_levels(levels: &[Vec<CacheName>], due: &[CacheName]) -> Vec<Vec<CacheName>> {
    levels
        .iter()
        .map(|level| {
            level
                .iter()
                .filter(|name| due.contains(name))
                .copied()
                .collect::<Vec<CacheName>>()
        })
        .filter(|level| !level.is_empty())
        .collect()
}

/// Builds level after level, items of one level in parallel.
async fn refresh_levels(
    app_state: &AppState<State>,
    levels: Vec<Vec<CacheName>>,
    concurrency: usize,
) -> (usize, usize) {
    let mut succeeded = 0;
    let mut failed = 0;

    for level in levels {
        let results: Vec<_> = stream::iter(level)
            .map(|name| async move { (name, registry::build(app_state, name).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for (name, result) in results {
            match result {
                Ok(BuildOutcome::Built) => succeeded += 1,
                Ok(BuildOutcome::Skipped) => {
                    debug!("Cache {} already being refreshed, skipped", name);
                },
                Err(e) => {
                    failed += 1;
                    warn!("Failed to refresh cache {}: {}", name, e);
                },
            }
        }
    }

    (succeeded, failed)
}
