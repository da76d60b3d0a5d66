use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub type PoolType = SqlitePool;
pub type PoolOption = SqlitePoolOptions;
pub type ConnectOptions = SqliteConnectOptions;
