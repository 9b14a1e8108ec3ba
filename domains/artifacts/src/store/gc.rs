//! Temp-area garbage collection
//!
//! Staged files are normally renamed or removed by `save_artifact` itself.
//! Anything left behind (crash mid-save, failed cleanup) is swept here once it
//! is older than the configured max age.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::ArtifactStore;
use crate::error::StoreError;

/// Result of one sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ArtifactStore {
    /// Delete temp entries older than the max age
    ///
    /// Per-entry failures are logged and counted. Failing to open the temp
    /// directory is an error; failing partway through listing it ends the
    /// sweep early with the partial report.
    pub async fn garbage_collect(&self) -> Result<GcReport, StoreError> {
        let temp = self.resolve_temp().await?;
        let entries = tokio::fs::read_dir(&temp).await?;

        let paths = futures::stream::try_unfold(entries, |mut entries| async move {
            let next = entries.next_entry().await?;
            Ok::<_, std::io::Error>(next.map(|entry| (entry.path(), entries)))
        });

        Ok(sweep(paths, self.temp_max_age).await)
    }
}

async fn sweep<S>(paths: S, max_age: Duration) -> GcReport
where
    S: Stream<Item = std::io::Result<PathBuf>>,
{
    let mut report = GcReport::default();
    futures::pin_mut!(paths);

    while let Some(next) = paths.next().await {
        let path = match next {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "GC could not list temp directory, ending sweep early");
                report.failed += 1;
                break;
            }
        };
        report.scanned += 1;

        let metadata = match tokio::fs::symlink_metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "GC could not stat temp entry");
                report.failed += 1;
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };

        match removed {
            Ok(()) => {
                tracing::debug!(path = %path.display(), age_secs = age.as_secs(), "GC removed stale temp entry");
                report.deleted += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "GC failed to remove temp entry");
                report.failed += 1;
            }
        }
    }

    report
}

/// Run [`ArtifactStore::garbage_collect`] every `interval` on its own task.
/// The first sweep happens one interval after start.
#[mutants::skip] // Infinite loop; the sweep itself is tested directly
pub fn spawn_garbage_collector(store: Arc<ArtifactStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = interval.as_secs(), "Temp garbage collector started");

        loop {
            ticker.tick().await;
            match store.garbage_collect().await {
                Ok(report) => tracing::info!(
                    scanned = report.scanned,
                    deleted = report.deleted,
                    failed = report.failed,
                    "Temp garbage collection finished"
                ),
                Err(e) => tracing::error!(error = %e, "Temp garbage collection failed"),
            }
        }
    })
}
