//! Cache producers and background tasks.

pub mod binance;
pub mod cache_refresher;
pub mod coins;
pub mod fixer;
pub mod gecko;
pub mod pairs;
pub mod seed_sync;
pub mod tickers;
