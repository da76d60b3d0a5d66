use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use tracing::{debug, warn};

use crate::{
    configuration::Config,
    error::Error,
    helpers::templates::NIL_UUID,
    model::{Swap, SwapRow, Table},
};

const REPLICA_EXTENSION: &str = "db";

/// SQLite primary result codes that mean the file changed under us.
const SQLITE_IOERR: i64 = 10;
const SQLITE_CORRUPT: i64 = 11;
const SQLITE_NOTADB: i64 = 26;
const SQLITE_READONLY_DBMOVED: i64 = 1032;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetId {
    Id(u16),
    /// Every configured netid.
    All,
}

impl FromStr for NetId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(NetId::All);
        }
        Ok(NetId::Id(value.parse()?))
    }
}

#[derive(Debug, Clone, Copy)]
enum SwapQuery {
    FinishedAfter(i64),
    LastTraded,
}

/// Reader over the local `MM2.db` replicas, `{MM2_DB_DIRECTORY}/{netid}/*.db`.
///
/// Every query opens its files read-only and closes them afterwards, so the
/// sync task can replace a replica between two builds.
#[derive(Debug)]
pub struct SwapStore {
    directory: PathBuf,
    netids: Vec<u16>,
}

impl SwapStore {
    pub fn new(config: &Config) -> SwapStore {
        SwapStore {
            directory: config.mm2_db_dir.to_owned(),
            netids: config.netids.to_owned(),
        }
    }

    pub fn netids(&self, netid: NetId) -> Vec<u16> {
        match netid {
            NetId::Id(id) => vec![id],
            NetId::All => self.netids.to_owned(),
        }
    }

    pub fn replica_files(&self, netid: NetId) -> Result<Vec<PathBuf>, Error> {
        let mut files = vec![];

        for id in self.netids(netid) {
            let dir = self.directory.join(id.to_string());
            if !dir.is_dir() {
                debug!("No replicas for netid {} in {}", id, dir.display());
                continue;
            }

            let mut found = vec![];
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                let is_replica = path
                    .extension()
                    .map(|ext| ext == REPLICA_EXTENSION)
                    .unwrap_or(false);
                if path.is_file() && is_replica {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        }

        Ok(files)
    }

    /// Successful swaps finished in `(from, to]`, merged across replicas.
    pub async fn get_swaps(
        &self,
        netid: NetId,
        from: i64,
        to: i64,
    ) -> Result<Vec<Swap>, Error> {
        let mut swaps = self.query(netid, SwapQuery::FinishedAfter(from)).await?;
        // a uuid counts at its latest copy, which may lie past `to`
        swaps.retain(|swap| swap.finished_at <= to);

        Ok(swaps)
    }

    /// The latest swap of every traded direction.
    pub async fn get_last_traded(&self, netid: NetId) -> Result<Vec<Swap>, Error> {
        self.query(netid, SwapQuery::LastTraded).await
    }

    async fn query(
        &self,
        netid: NetId,
        query: SwapQuery,
    ) -> Result<Vec<Swap>, Error> {
        let mut swaps = vec![];

        for path in self.replica_files(netid)? {
            let rows = query_with_reopen(&path, query).await?;
            swaps.extend(rows.into_iter().map(Swap::from));
        }

        Ok(merge_swaps(swaps))
    }
}

async fn query_file(
    path: &Path,
    query: SwapQuery,
) -> Result<Vec<SwapRow>, sqlx::Error> {
    let table = Table::<SwapRow>::open_read_only(path).await?;
    let rows = match query {
        SwapQuery::FinishedAfter(from) => table.get_finished_after(from).await,
        SwapQuery::LastTraded => table.get_last_traded().await,
    };
    table.close().await;

    rows
}

async fn query_with_reopen(
    path: &Path,
    query: SwapQuery,
) -> Result<Vec<SwapRow>, Error> {
    match query_file(path, query).await {
        Err(e) if is_stale_file(&e) => {
            warn!("Replica {} changed while reading, reopening: {}", path.display(), e);
            Ok(query_file(path, query).await?)
        },
        result => Ok(result?),
    }
}

pub fn is_stale_file(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) => true,
        sqlx::Error::Database(e) => e
            .code()
            .and_then(|code| code.parse::<i64>().ok())
            .map(|code| {
                code == SQLITE_READONLY_DBMOVED
                    || matches!(
                        code & 0xff,
                        SQLITE_IOERR | SQLITE_CORRUPT | SQLITE_NOTADB
                    )
            })
            .unwrap_or(false),
        _ => false,
    }
}

/// Drops duplicate uuids, keeping the record with the latest `finished_at`.
/// Rows without a uuid are never merged.
pub fn merge_swaps(swaps: Vec<Swap>) -> Vec<Swap> {
    let mut by_uuid: HashMap<String, Swap> = HashMap::new();
    let mut anonymous = vec![];

    for swap in swaps {
        if swap.uuid == NIL_UUID {
            anonymous.push(swap);
            continue;
        }

        match by_uuid.get(&swap.uuid) {
            Some(existing) if existing.finished_at >= swap.finished_at => {},
            _ => {
                by_uuid.insert(swap.uuid.to_owned(), swap);
            },
        }
    }

    let mut merged: Vec<Swap> = by_uuid.into_values().chain(anonymous).collect();
    merged.sort_by(|a, b| {
        a.finished_at
            .cmp(&b.finished_at)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });

    merged
}
