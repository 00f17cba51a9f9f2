//! Sync orchestration: resolve rows, build one atomic batch, refresh the cache from the result.

use std::sync::Arc;

use serde::Serialize;

use super::cache::WorkbookCache;
use super::client::SheetsBackend;
use super::locator::{identifier_column, locate_or_allocate};
use super::projector::project_header;
use crate::errors::AppError;
use crate::models::{
    GridCoordinate, Request, RowData, ThreadRecord, UpdateCellsRequest, WorkbookSnapshot,
};

/// Field mask replacing every field of every addressed cell.
const OVERWRITE_ALL_FIELDS: &str = "*";

/// Row a thread was written to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RowAssignment {
    pub thread_id: u64,
    pub row_index: usize,
    pub appended: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub rows: Vec<RowAssignment>,
}

impl SyncReport {
    pub fn appended(&self) -> usize {
        self.rows.iter().filter(|r| r.appended).count()
    }
}

/// Single-writer sync engine for one sheet.
pub struct SheetSync<B> {
    backend: B,
    cache: WorkbookCache,
}

impl<B: SheetsBackend> SheetSync<B> {
    pub fn new(backend: B, workbook_key: impl Into<String>, sheet_title: impl Into<String>) -> Self {
        Self {
            backend,
            cache: WorkbookCache::new(workbook_key, sheet_title),
        }
    }

    pub fn cache(&self) -> &WorkbookCache {
        &self.cache
    }

    /// Fetch the sheet once and check it can be synced into.
    pub async fn warm_up(&mut self) -> Result<Arc<WorkbookSnapshot>, AppError> {
        let snapshot = self.cache.current_snapshot(&self.backend).await?;
        identifier_column(&snapshot.headers)?;
        tracing::info!(
            "Target sheet {:?} has {} columns and {} rows",
            snapshot.sheet_title,
            snapshot.headers.len(),
            snapshot.row_count()
        );
        Ok(snapshot)
    }

    pub async fn sync_one(&mut self, thread: &ThreadRecord) -> Result<SyncReport, AppError> {
        self.sync_many(std::slice::from_ref(thread)).await
    }

    /// Write every thread's row in one batch. All new threads share one allocation pass.
    pub async fn sync_many(&mut self, threads: &[ThreadRecord]) -> Result<SyncReport, AppError> {
        if threads.is_empty() {
            return Ok(SyncReport::default());
        }

        let entry = self.cache.current(&self.backend).await?;
        let snapshot = Arc::clone(entry.snapshot());
        let mut provisional_rows = entry.provisional_rows();
        let id_column = identifier_column(&snapshot.headers)?;

        let mut requests = Vec::with_capacity(threads.len());
        let mut report = SyncReport::default();
        for thread in threads {
            let slot = locate_or_allocate(&snapshot, &mut provisional_rows, id_column, thread.id)?;
            tracing::debug!("{} -> row {} (appended: {})", thread, slot.index(), slot.is_appended());
            requests.push(row_update(&snapshot, slot.index(), thread));
            report.rows.push(RowAssignment {
                thread_id: thread.id,
                row_index: slot.index(),
                appended: slot.is_appended(),
            });
        }

        let workbook_key = self.cache.workbook_key().to_string();
        let response = self.backend.batch_update(&workbook_key, requests).await?;

        match response.updated_spreadsheet {
            Some(updated) => {
                if let Err(e) = self.cache.replace(updated) {
                    self.cache.commit_provisional(provisional_rows);
                    return Err(e);
                }
            }
            None => {
                tracing::debug!("Batch response carried no spreadsheet; keeping snapshot");
                self.cache.commit_provisional(provisional_rows);
            }
        }

        Ok(report)
    }
}

/// Full-row replacement at `row_index`, one cell per header in sheet order.
pub fn row_update(snapshot: &WorkbookSnapshot, row_index: usize, thread: &ThreadRecord) -> Request {
    let values = snapshot
        .headers
        .iter()
        .map(|header| project_header(thread, header).to_cell_data())
        .collect();

    Request::UpdateCells(UpdateCellsRequest {
        start: GridCoordinate {
            sheet_id: snapshot.sheet_id,
            row_index,
            column_index: 0,
        },
        rows: vec![RowData::new(values)],
        fields: OVERWRITE_ALL_FIELDS.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellContent, CellData};
    use crate::testing::{sample_thread, sheet_with_rows, text_cell, MemoryBackend};

    const SHEET: &str = "Discord Sync";

    fn headers() -> RowData {
        RowData::new(vec![
            text_cell("Discord ID"),
            text_cell("Title"),
            CellData::default(),
            text_cell("Save Files"),
            text_cell("Priority"),
        ])
    }

    fn backend_with_ids(ids: &[&str]) -> MemoryBackend {
        let mut rows = vec![headers()];
        rows.extend(
            ids.iter()
                .map(|id| RowData::new(vec![text_cell(*id), text_cell("old title")])),
        );
        MemoryBackend::new(sheet_with_rows(SHEET, 11, rows))
    }

    fn cell_text(backend: &MemoryBackend, row: usize, column: usize) -> Option<String> {
        backend.rows(SHEET)[row]
            .values
            .get(column)
            .and_then(|c| c.read_value().unwrap())
            .map(CellContent::into_text)
    }

    #[tokio::test]
    async fn test_new_threads_in_one_batch_get_consecutive_rows() {
        let backend = backend_with_ids(&["1", "2", "3", "4"]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let threads = vec![
            sample_thread(100, "a"),
            sample_thread(101, "b"),
            sample_thread(102, "c"),
        ];
        let report = sync.sync_many(&threads).await.unwrap();

        let rows: Vec<usize> = report.rows.iter().map(|r| r.row_index).collect();
        assert_eq!(rows, vec![5, 6, 7]);
        assert_eq!(report.appended(), 3);

        let batches = backend.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(cell_text(&backend, 7, 0).as_deref(), Some("102"));
    }

    #[tokio::test]
    async fn test_existing_thread_updates_its_row() {
        let backend = backend_with_ids(&["1", "12345", "3"]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let report = sync.sync_one(&sample_thread(12345, "renamed")).await.unwrap();

        assert_eq!(report.rows[0].row_index, 2);
        assert!(!report.rows[0].appended);
        assert_eq!(cell_text(&backend, 2, 1).as_deref(), Some("renamed"));
        assert_eq!(backend.rows(SHEET).len(), 4);
    }

    #[tokio::test]
    async fn test_row_update_follows_header_order() {
        let backend = backend_with_ids(&[]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);
        let thread = sample_thread(9, "Title nine");

        sync.sync_one(&thread).await.unwrap();

        let batches = backend.batches();
        let Request::UpdateCells(update) = &batches[0][0];
        assert_eq!(update.start.sheet_id, 11);
        assert_eq!(update.start.row_index, 1);
        assert_eq!(update.start.column_index, 0);
        assert_eq!(update.fields, "*");

        let values = &update.rows[0].values;
        assert_eq!(values.len(), 5);
        assert_eq!(values[0].read_value().unwrap(), Some(CellContent::Text("9".into())));
        assert_eq!(
            values[1].read_value().unwrap(),
            Some(CellContent::Text("Title nine".into()))
        );
        assert_eq!(values[2], CellData::default());
        assert_eq!(values[3].text_format_runs.len(), 1);
        assert_eq!(values[4], CellData::default());
    }

    #[tokio::test]
    async fn test_successful_write_replaces_cache_and_resets_counter() {
        let backend = backend_with_ids(&["1"]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let before = sync.warm_up().await.unwrap();
        sync.sync_many(&[sample_thread(50, "x"), sample_thread(51, "y")])
            .await
            .unwrap();

        let entry = sync.cache().entry().unwrap();
        assert!(!Arc::ptr_eq(&before, entry.snapshot()));
        assert_eq!(entry.provisional_rows(), 0);
        assert_eq!(entry.snapshot().row_count(), 4);
        assert_eq!(backend.fetch_count(), 1);

        // Second sync inside the window reuses the post-write snapshot.
        let report = sync.sync_one(&sample_thread(51, "y2")).await.unwrap();
        assert_eq!(report.rows[0].row_index, 3);
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_write_without_returned_snapshot_keeps_counting() {
        let backend = backend_with_ids(&["1"]);
        backend.omit_updated_spreadsheet();
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let first = sync.sync_one(&sample_thread(60, "a")).await.unwrap();
        let second = sync.sync_one(&sample_thread(61, "b")).await.unwrap();

        assert_eq!(first.rows[0].row_index, 2);
        assert_eq!(second.rows[0].row_index, 3);
        assert_eq!(sync.cache().entry().unwrap().provisional_rows(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_untouched() {
        let backend = backend_with_ids(&["1"]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);
        let before = sync.warm_up().await.unwrap();

        backend.fail_next_batch();
        let err = sync.sync_one(&sample_thread(70, "lost")).await.unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));

        let entry = sync.cache().entry().unwrap();
        assert!(Arc::ptr_eq(&before, entry.snapshot()));
        assert_eq!(entry.provisional_rows(), 0);

        let report = sync.sync_one(&sample_thread(70, "retry")).await.unwrap();
        assert_eq!(report.rows[0].row_index, 2);
    }

    #[tokio::test]
    async fn test_missing_identifier_column_is_fatal() {
        let backend = MemoryBackend::new(sheet_with_rows(
            SHEET,
            1,
            vec![RowData::new(vec![text_cell("Title")])],
        ));
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let err = sync.sync_one(&sample_thread(1, "a")).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(backend.batches().is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let backend = backend_with_ids(&[]);
        let mut sync = SheetSync::new(backend.clone(), "key", SHEET);

        let report = sync.sync_many(&[]).await.unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(backend.fetch_count(), 0);
        assert!(backend.batches().is_empty());
    }
}
