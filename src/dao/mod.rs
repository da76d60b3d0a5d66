mod sqlite;

pub use sqlite::{ConnectOptions, PoolOption, PoolType};
