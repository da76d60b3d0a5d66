//! API Controller modules
//!
//! Consolidated controllers organized by domain. Every read is served from the
//! in-memory snapshot store; a never-built item schedules a background build
//! and answers with its template.

use std::sync::Arc;

use crate::{
    cache::Slot,
    cache_keys::CacheName,
    configuration::{AppState, State},
    registry,
};

pub mod gecko;
pub mod markets;
pub mod rates;
pub mod utils;

pub(crate) async fn snapshot<T>(
    state: &AppState<State>,
    name: CacheName,
    slot: &Slot<T>,
) -> Option<Arc<T>> {
    let value = slot.get().await;
    if value.is_none() && !state.registry.is_building(name).unwrap_or(true) {
        registry::spawn_build(state.clone(), name);
    }
    value
}
