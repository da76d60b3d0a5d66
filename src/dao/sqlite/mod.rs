pub use self::types::{ConnectOptions, PoolOption, PoolType};

mod stats_swaps;
mod types;
