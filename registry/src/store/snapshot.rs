//! JSON snapshot of the whole registry
//!
//! The library never touches disk on its own. The shell loads a snapshot at
//! startup and saves one after each mutating command, since every
//! invocation is a fresh process. Concurrent shells serialize their
//! load-modify-save cycle through a [`SnapshotLock`] file next to the
//! snapshot.

use sdk::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::accounts::AccountDirectory;
use super::meetings::MeetingStore;
use super::papers::PaperStore;
use super::reviews::ReviewStore;
use super::sessions::SessionStore;

/// Current on-disk format version
pub const SNAPSHOT_VERSION: u32 = 1;

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub version: u32,
    pub accounts: AccountDirectory,
    pub papers: PaperStore,
    pub reviews: ReviewStore,
    pub sessions: SessionStore,
    pub meetings: MeetingStore,
}

impl RegistrySnapshot {
    pub fn new(
        accounts: AccountDirectory,
        papers: PaperStore,
        reviews: ReviewStore,
        sessions: SessionStore,
        meetings: MeetingStore,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            accounts,
            papers,
            reviews,
            sessions,
            meetings,
        }
    }

    /// Load a snapshot, or `None` when the file does not exist yet
    pub async fn load(path: &Path) -> Result<Option<Self>, RegistryError> {
        if !path.exists() {
            debug!("No snapshot at {:?}", path);
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(path).await?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&content)
            .map_err(|e| RegistryError::Snapshot(format!("{}: {}", path.display(), e)))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(RegistryError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        debug!("Loaded snapshot from {:?}", path);
        Ok(Some(snapshot))
    }

    /// Write the snapshot through a temporary file, then rename it in place
    pub async fn save(&self, path: &Path) -> Result<(), RegistryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RegistryError::Snapshot(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!("Saved registry snapshot to {:?}", path);
        Ok(())
    }
}

/// Exclusive hold on a snapshot for one load-modify-save cycle
///
/// The lock file holds the owner's process id and is removed on drop. A
/// shell that crashed leaves it behind; it must then be deleted by hand.
#[derive(Debug)]
pub struct SnapshotLock {
    path: PathBuf,
}

impl SnapshotLock {
    /// Lock the snapshot at `snapshot_path`, waiting up to five seconds
    pub async fn acquire(snapshot_path: &Path) -> Result<Self, RegistryError> {
        Self::acquire_with(snapshot_path, LOCK_ATTEMPTS, LOCK_RETRY_DELAY).await
    }

    pub async fn acquire_with(
        snapshot_path: &Path,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, RegistryError> {
        let path = snapshot_path.with_extension("lock");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        for attempt in 1..=attempts {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    use tokio::io::AsyncWriteExt;
                    file.write_all(std::process::id().to_string().as_bytes())
                        .await?;
                    debug!("Acquired snapshot lock {:?}", path);
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!("Snapshot lock busy (attempt {}/{})", attempt, attempts);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RegistryError::Snapshot(format!(
            "registry is locked by another confreg process; delete {} if none is running",
            path.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove snapshot lock {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Policy, Registry};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_snapshot_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded = RegistrySnapshot::load(&dir.path().join("registry.json"))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let result = RegistrySnapshot::load(&path).await;
        assert!(matches!(result, Err(RegistryError::Snapshot(_))));
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("registry.json");

        let registry = Registry::with_test_accounts(Policy::default());
        registry.snapshot().save(&path).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = RegistrySnapshot::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded.accounts.len(), 7);
    }

    #[tokio::test]
    async fn test_lock_is_exclusive_until_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");

        let held = SnapshotLock::acquire(&path).await.unwrap();
        assert!(held.path().exists());

        let busy = SnapshotLock::acquire_with(&path, 2, Duration::from_millis(1)).await;
        assert!(matches!(busy, Err(RegistryError::Snapshot(_))));

        let lock_path = held.path().to_path_buf();
        drop(held);
        assert!(!lock_path.exists());

        let again = SnapshotLock::acquire_with(&path, 1, Duration::from_millis(1)).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_waiting_shell_gets_lock_after_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");

        let held = SnapshotLock::acquire(&path).await.unwrap();
        let waiter = {
            let path = path.clone();
            tokio::spawn(async move {
                SnapshotLock::acquire_with(&path, 100, Duration::from_millis(10)).await
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);

        assert!(waiter.await.unwrap().is_ok());
    }
}
