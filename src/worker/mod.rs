//! Sync worker and its job queue.
//!
//! HTTP handlers produce jobs into a bounded channel; one worker task owns the sync engine and
//! drains the channel one job at a time, so no two syncs ever run against the same cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use crate::errors::AppError;
use crate::models::ThreadRecord;
use crate::sheets::{SheetSync, SheetsBackend, SyncReport};

/// Unit of work for the worker.
#[derive(Debug, Clone)]
pub enum SyncJob {
    /// A single thread changed.
    One(ThreadRecord),
    /// Initial bulk sync, written in one batch.
    Many(Vec<ThreadRecord>),
}

impl SyncJob {
    pub fn thread_count(&self) -> usize {
        match self {
            SyncJob::One(_) => 1,
            SyncJob::Many(threads) => threads.len(),
        }
    }
}

/// Counters exposed through the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub threads_synced: u64,
    pub rows_appended: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Seconds since the cached snapshot was taken, as of the last job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_age_secs: Option<u64>,
}

pub type SharedStatus = Arc<RwLock<WorkerStatus>>;

/// Producer side of the job queue.
#[derive(Clone)]
pub struct SyncQueue {
    sender: mpsc::Sender<SyncJob>,
    capacity: usize,
}

impl SyncQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SyncJob>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, capacity }, receiver)
    }

    /// Enqueue a job, waiting while the queue is full.
    pub async fn enqueue(&self, job: SyncJob) -> Result<(), AppError> {
        self.sender
            .send(job)
            .await
            .map_err(|_| AppError::Internal("Sync worker is not running".to_string()))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs waiting to be picked up.
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }
}

/// Spawn the worker task. It stops once every queue handle has been dropped and the queue drained.
pub fn spawn<B>(
    sync: SheetSync<B>,
    receiver: mpsc::Receiver<SyncJob>,
    status: SharedStatus,
) -> JoinHandle<()>
where
    B: SheetsBackend + 'static,
{
    tokio::spawn(run(sync, receiver, status))
}

pub async fn run<B: SheetsBackend>(
    mut sync: SheetSync<B>,
    mut receiver: mpsc::Receiver<SyncJob>,
    status: SharedStatus,
) {
    while let Some(job) = receiver.recv().await {
        let count = job.thread_count();
        let result = match &job {
            SyncJob::One(thread) => {
                tracing::info!("Syncing {}", thread);
                sync.sync_one(thread).await
            }
            SyncJob::Many(threads) => {
                tracing::info!("Syncing batch of {} threads", threads.len());
                sync.sync_many(threads).await
            }
        };

        let snapshot_age_secs = sync
            .cache()
            .entry()
            .map(|e| e.fetched_at().elapsed().as_secs());
        record(&status, count, result, snapshot_age_secs).await;
    }

    tracing::info!("Sync queue closed, worker stopping");
}

async fn record(
    status: &SharedStatus,
    count: usize,
    result: Result<SyncReport, AppError>,
    snapshot_age_secs: Option<u64>,
) {
    let mut status = status.write().await;
    status.snapshot_age_secs = snapshot_age_secs;

    match result {
        Ok(report) => {
            tracing::info!(
                "Synced {} threads ({} appended)",
                report.rows.len(),
                report.appended()
            );
            status.jobs_completed += 1;
            status.threads_synced += report.rows.len() as u64;
            status.rows_appended += report.appended() as u64;
            status.last_synced_at = Some(Utc::now());
        }
        Err(e) => {
            if e.is_fatal() {
                tracing::error!("Workbook cannot be synced ({} threads dropped): {}", count, e);
            } else {
                tracing::error!("Sync of {} threads failed: {}", count, e);
            }
            status.jobs_failed += 1;
            status.last_error = Some(e.to_string());
        }
    }
}
