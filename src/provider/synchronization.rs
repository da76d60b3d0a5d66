use std::{
    path::PathBuf,
    process::Stdio,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use tokio::{fs, process::Command, time::timeout};
use tracing::{debug, info, warn};

use crate::{configuration::Config, error::Error};

const REPLICA_FILE: &str = "MM2.db";

/// Pulls `MM2.db` replicas from the seed node with `rsync`.
///
/// rsync writes into a temp file and renames it, so a failed or interrupted
/// transfer leaves the previous replica in place.
#[derive(Debug)]
pub struct SeedSync {
    running: AtomicBool,
    host: String,
    user: String,
    remote_path: String,
    local_dir: PathBuf,
    netids: Vec<u16>,
    timeout: Duration,
}

impl SeedSync {
    pub fn new(config: &Config) -> SeedSync {
        SeedSync {
            running: AtomicBool::new(false),
            host: config.seed_node_host.to_owned(),
            user: config.seed_node_user.to_owned(),
            remote_path: config.seed_node_db_path.to_owned(),
            local_dir: config.mm2_db_dir.to_owned(),
            netids: config.netids.to_owned(),
            timeout: Duration::from_secs(config.sync_interval),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.host.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst)
    }

    pub fn rsync_args(&self, netid: u16) -> Vec<String> {
        let remote = if self.user.is_empty() {
            format!("{}:{}/{}/{}", self.host, self.remote_path, netid, REPLICA_FILE)
        } else {
            format!(
                "{}@{}:{}/{}/{}",
                self.user, self.host, self.remote_path, netid, REPLICA_FILE
            )
        };
        let local = self
            .local_dir
            .join(netid.to_string())
            .join(REPLICA_FILE)
            .display()
            .to_string();

        vec![
            String::from("-az"),
            String::from("-e"),
            String::from("ssh -o BatchMode=yes"),
            format!("--timeout={}", self.timeout.as_secs()),
            remote,
            local,
        ]
    }

    /// Syncs every netid once. Overlapping runs are skipped.
    pub async fn run(&self) -> Result<(), Error> {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Seed sync already running, skipped");
            return Ok(());
        }

        let result = self.sync_all().await;
        self.set_running(false);
        result
    }

    async fn sync_all(&self) -> Result<(), Error> {
        let mut failed = vec![];

        for netid in &self.netids {
            if let Err(e) = self.sync_netid(*netid).await {
                warn!("Seed sync of netid {} failed: {}", netid, e);
                failed.push(netid.to_string());
            }
        }

        if !failed.is_empty() {
            return Err(Error::UpstreamTransport(format!(
                "seed sync failed for netids {}",
                failed.join(",")
            )));
        }

        info!("Seed sync complete for {} netids", self.netids.len());
        Ok(())
    }

    async fn sync_netid(&self, netid: u16) -> Result<(), Error> {
        fs::create_dir_all(self.local_dir.join(netid.to_string())).await?;

        let child = Command::new("rsync")
            .args(self.rsync_args(netid))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, child)
            .await
            .map_err(|_| Error::Timeout(format!("rsync netid {}", netid)))??;

        if !output.status.success() {
            return Err(Error::UpstreamTransport(format!(
                "rsync exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}
