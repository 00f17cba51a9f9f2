//! Time-boxed cache of the target sheet.
//!
//! A fetched snapshot stays authoritative for [`WORKBOOK_CACHED_FOR`]. Writes replace it with the
//! backend's post-write snapshot; between fetches, rows reserved for new threads are counted so
//! later reservations in the same window never reuse an index.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::client::SheetsBackend;
use crate::errors::AppError;
use crate::models::{Spreadsheet, WorkbookSnapshot};

/// Freshness window of a fetched snapshot.
pub const WORKBOOK_CACHED_FOR: Duration = Duration::from_secs(60);

/// A snapshot plus the bookkeeping that belongs to it.
#[derive(Debug)]
pub struct CachedWorkbook {
    snapshot: Arc<WorkbookSnapshot>,
    fetched_at: Instant,
    provisional_rows: usize,
}

impl CachedWorkbook {
    pub fn snapshot(&self) -> &Arc<WorkbookSnapshot> {
        &self.snapshot
    }

    pub fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Rows reserved for new threads since this snapshot was taken.
    pub fn provisional_rows(&self) -> usize {
        self.provisional_rows
    }
}

/// Owns the current snapshot of one sheet in one workbook.
#[derive(Debug)]
pub struct WorkbookCache {
    workbook_key: String,
    sheet_title: String,
    entry: Option<CachedWorkbook>,
}

impl WorkbookCache {
    pub fn new(workbook_key: impl Into<String>, sheet_title: impl Into<String>) -> Self {
        Self {
            workbook_key: workbook_key.into(),
            sheet_title: sheet_title.into(),
            entry: None,
        }
    }

    pub fn workbook_key(&self) -> &str {
        &self.workbook_key
    }

    pub fn entry(&self) -> Option<&CachedWorkbook> {
        self.entry.as_ref()
    }

    pub fn is_fresh(&self) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| e.fetched_at.elapsed() <= WORKBOOK_CACHED_FOR)
    }

    /// Return the cached entry, fetching a new snapshot first when missing or expired.
    pub async fn current<B: SheetsBackend>(
        &mut self,
        backend: &B,
    ) -> Result<&mut CachedWorkbook, AppError> {
        if !self.is_fresh() {
            tracing::debug!("Workbook cache stale, fetching {}", self.workbook_key);
            let spreadsheet = backend.fetch_spreadsheet(&self.workbook_key).await?;
            self.replace(spreadsheet)?;
        }

        self.entry
            .as_mut()
            .ok_or_else(|| AppError::Internal("Workbook cache empty after fetch".to_string()))
    }

    pub async fn current_snapshot<B: SheetsBackend>(
        &mut self,
        backend: &B,
    ) -> Result<Arc<WorkbookSnapshot>, AppError> {
        let entry = self.current(backend).await?;
        Ok(Arc::clone(&entry.snapshot))
    }

    /// Swap in a newly fetched or post-write spreadsheet. On error the previous entry is kept.
    pub fn replace(&mut self, spreadsheet: Spreadsheet) -> Result<(), AppError> {
        let snapshot = WorkbookSnapshot::from_spreadsheet(spreadsheet, &self.sheet_title)?;
        tracing::debug!(
            "Workbook cache replaced: sheet {} with {} rows",
            snapshot.sheet_id,
            snapshot.row_count()
        );
        self.entry = Some(CachedWorkbook {
            snapshot: Arc::new(snapshot),
            fetched_at: Instant::now(),
            provisional_rows: 0,
        });
        Ok(())
    }

    /// Record rows reserved against the current snapshot by a write whose result was not returned.
    pub fn commit_provisional(&mut self, provisional_rows: usize) {
        if let Some(entry) = self.entry.as_mut() {
            entry.provisional_rows = provisional_rows;
        }
    }
}
