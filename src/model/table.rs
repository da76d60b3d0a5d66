use std::{marker::PhantomData, path::Path};

use crate::dao::{ConnectOptions, PoolOption, PoolType};

/// Rows of type `T` in one replica file. A table lives for a single read and
/// holds one connection, so the file can be swapped out between reads.
#[derive(Debug)]
pub struct Table<T> {
    pub pool: PoolType,
    _row: PhantomData<T>,
}

impl<T> Table<T> {
    pub async fn open_read_only(path: &Path) -> Result<Self, sqlx::Error> {
        let options = ConnectOptions::new().filename(path).read_only(true);
        let pool = PoolOption::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Table {
            pool,
            _row: PhantomData,
        })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
