//! Background removal of media files that no longer belong to any article.
//!
//! Handlers enqueue the paths and return immediately; a single worker task
//! owns the deletions and reports each outcome on a broadcast channel.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::media_store::MediaStore;

/// Files to remove, as public `/uploads/...` paths.
#[derive(Debug, Clone)]
pub struct CleanupJob {
    pub paths: Vec<String>,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Deleted,
    /// Already gone; not an error.
    Missing,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CleanupReport {
    pub path: String,
    pub outcome: CleanupOutcome,
}

/// Sending half of the cleanup worker. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CleanupQueue {
    job_tx: mpsc::Sender<CleanupJob>,
    report_tx: broadcast::Sender<CleanupReport>,
}

impl CleanupQueue {
    /// Spawn the worker on the current runtime. It stops once every queue
    /// handle has been dropped.
    pub fn spawn(media: Arc<MediaStore>) -> Self {
        let (job_tx, mut job_rx) = mpsc::channel::<CleanupJob>(256);
        let (report_tx, _) = broadcast::channel::<CleanupReport>(256);

        let reports = report_tx.clone();
        tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                for path in job.paths {
                    let outcome = match media.delete(&path).await {
                        Ok(true) => CleanupOutcome::Deleted,
                        Ok(false) => {
                            debug!(path = %path, "Upload already removed");
                            CleanupOutcome::Missing
                        }
                        Err(e) => {
                            warn!(path = %path, error = %e, "Failed to remove upload");
                            CleanupOutcome::Failed(e.to_string())
                        }
                    };
                    // No subscribers is the normal case.
                    let _ = reports.send(CleanupReport { path, outcome });
                }
            }
            info!("Cleanup queue closed");
        });

        Self { job_tx, report_tx }
    }

    /// Queue files for removal. Never blocks the caller; if the queue is
    /// full or closed the paths are logged and dropped.
    pub fn enqueue(&self, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.job_tx.try_send(CleanupJob { paths }) {
            let job = match e {
                mpsc::error::TrySendError::Full(job) | mpsc::error::TrySendError::Closed(job) => {
                    job
                }
            };
            warn!(paths = ?job.paths, "Cleanup queue unavailable, leaving files in place");
        }
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> broadcast::Receiver<CleanupReport> {
        self.report_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reports_each_file() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(
            MediaStore::new(dir.path().join("uploads"), 1024)
                .await
                .unwrap(),
        );
        let kept = media.save_upload("a.jpg", b"img").await.unwrap();

        let queue = CleanupQueue::spawn(media.clone());
        let mut reports = queue.subscribe();

        queue.enqueue(vec![
            kept.clone(),
            "/uploads/never-existed.png".to_string(),
            "/uploads/../escape".to_string(),
        ]);

        let first = reports.recv().await.unwrap();
        assert_eq!(first.path, kept);
        assert_eq!(first.outcome, CleanupOutcome::Deleted);
        assert!(!media.resolve(&kept).unwrap().exists());

        let second = reports.recv().await.unwrap();
        assert_eq!(second.outcome, CleanupOutcome::Missing);

        let third = reports.recv().await.unwrap();
        assert!(matches!(third.outcome, CleanupOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_empty_job_is_ignored() {
        let dir = TempDir::new().unwrap();
        let media = Arc::new(MediaStore::new(dir.path().to_path_buf(), 16).await.unwrap());
        let queue = CleanupQueue::spawn(media);
        let mut reports = queue.subscribe();

        queue.enqueue(Vec::new());
        assert!(reports.try_recv().is_err());
    }
}
