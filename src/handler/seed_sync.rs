use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::{
    configuration::{AppState, State},
    error::Error,
};

/// Keeps the local `MM2.db` replicas in step with the seed node. Builds keep
/// reading whatever replica is on disk while a sync is in flight.
pub async fn seed_sync_task(app_state: AppState<State>) -> Result<(), Error> {
    if !app_state.seed_sync.is_enabled() {
        info!("SEED_NODE_HOST not set, seed sync disabled");
        return Ok(());
    }

    let period = Duration::from_secs(app_state.config.sync_interval);
    let mut sync_interval = interval(period);

    loop {
        sync_interval.tick().await;

        let app = app_state.clone();
        tokio::spawn(async move {
            if let Err(e) = app.seed_sync.run().await {
                error!("Seed sync failed, keeping previous replicas: {}", e);
            }
        });
    }
}
