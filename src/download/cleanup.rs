//! Delayed artifact removal.
//!
//! Each finished artifact gets one timer. When it fires the file is deleted;
//! a file that is already gone counts as success.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Delete `path`, returning `Ok(false)` if it did not exist.
pub async fn remove_artifact(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

struct PendingRemoval {
    id: u64,
    handle: AbortHandle,
}

/// Owns the scheduled removals of produced artifacts.
#[derive(Default)]
pub struct ArtifactReaper {
    pending: Arc<DashMap<PathBuf, PendingRemoval>>,
    next_id: AtomicU64,
}

impl ArtifactReaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove `path` after `delay`. Rescheduling the same path replaces the old timer.
    pub fn schedule(&self, path: PathBuf, delay: Duration) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);
        let task_path = path.clone();

        // The entry guard is held until the handle is stored, so the task's own
        // bookkeeping below cannot run first.
        let entry = self.pending.entry(path);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match remove_artifact(&task_path).await {
                Ok(true) => log::info!("Removed expired artifact {}", task_path.display()),
                Ok(false) => log::debug!("Expired artifact {} was already gone", task_path.display()),
                Err(e) => log::warn!("Failed to remove expired artifact {}: {}", task_path.display(), e),
            }
            pending.remove_if(&task_path, |_, removal| removal.id == id);
        });

        let removal = PendingRemoval {
            id,
            handle: handle.abort_handle(),
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(removal);
                previous.handle.abort();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(removal);
            }
        }
    }

    /// Cancel a scheduled removal. Returns `false` if none was pending.
    pub fn cancel(&self, path: &Path) -> bool {
        match self.pending.remove(path) {
            Some((_, removal)) => {
                removal.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, path: &Path) -> bool {
        self.pending.contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
