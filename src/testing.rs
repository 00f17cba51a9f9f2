//! Test doubles and fixtures shared by unit and integration tests.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use crate::errors::AppError;
use crate::models::{
    Attachment, BatchUpdateResponse, CellData, ExtendedValue, GridData, Message, Request, RowData,
    Sheet, SheetProperties, Spreadsheet, ThreadRecord,
};
use crate::sheets::SheetsBackend;

pub fn text_cell(s: &str) -> CellData {
    CellData {
        user_entered_value: Some(ExtendedValue::string(s)),
        ..CellData::default()
    }
}

pub fn number_cell(n: f64) -> CellData {
    CellData {
        user_entered_value: Some(ExtendedValue::number(n)),
        ..CellData::default()
    }
}

/// Spreadsheet with a single sheet holding `rows` as its grid.
pub fn sheet_with_rows(title: &str, sheet_id: i64, rows: Vec<RowData>) -> Spreadsheet {
    Spreadsheet {
        spreadsheet_id: "test-workbook".to_string(),
        sheets: vec![Sheet {
            properties: SheetProperties {
                sheet_id,
                title: title.to_string(),
            },
            data: vec![GridData { row_data: rows }],
        }],
    }
}

/// Thread with one message, a video and an image, one save file and one log file.
pub fn sample_thread(id: u64, title: &str) -> ThreadRecord {
    let attachment = |name: &str, content_type: &str| Attachment {
        filename: name.to_string(),
        url: format!("https://cdn.example/{}/{}", id, name),
        content_type: Some(content_type.to_string()),
    };

    ThreadRecord {
        id,
        url: format!("https://chat.example/threads/{}", id),
        title: title.to_string(),
        poster: Some("alice".to_string()),
        create_date: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        last_post_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        messages: vec![Message {
            author: Some("alice".to_string()),
            content: format!("First message of {}", id),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        }],
        tags: vec!["bug".to_string(), "save".to_string()],
        media: vec![
            attachment("clip.mp4", "video/mp4"),
            attachment("shot.png", "image/png"),
        ],
        save_files: vec![attachment("world.json", "application/json")],
        log_files: vec![attachment("game.log", "text/plain")],
    }
}

#[derive(Default)]
struct MemoryState {
    spreadsheet: Spreadsheet,
    fetches: usize,
    batches: Vec<Vec<Request>>,
    fail_next_fetch: bool,
    fail_next_batch: bool,
    omit_updated_spreadsheet: bool,
}

/// In-memory backend applying `updateCells` requests to a grid.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new(spreadsheet: Spreadsheet) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                spreadsheet,
                ..MemoryState::default()
            })),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn batches(&self) -> Vec<Vec<Request>> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn rows(&self, title: &str) -> Vec<RowData> {
        let state = self.state.lock().unwrap();
        state
            .spreadsheet
            .sheets
            .iter()
            .find(|s| s.properties.title == title)
            .and_then(|s| s.data.first())
            .map(|g| g.row_data.clone())
            .unwrap_or_default()
    }

    pub fn fail_next_fetch(&self) {
        self.state.lock().unwrap().fail_next_fetch = true;
    }

    pub fn fail_next_batch(&self) {
        self.state.lock().unwrap().fail_next_batch = true;
    }

    pub fn omit_updated_spreadsheet(&self) {
        self.state.lock().unwrap().omit_updated_spreadsheet = true;
    }
}

impl SheetsBackend for MemoryBackend {
    async fn fetch_spreadsheet(&self, _workbook_key: &str) -> Result<Spreadsheet, AppError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_fetch) {
            return Err(AppError::Transport("fetch failed".to_string()));
        }
        state.fetches += 1;
        Ok(state.spreadsheet.clone())
    }

    async fn batch_update(
        &self,
        _workbook_key: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse, AppError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_batch) {
            return Err(AppError::Transport("batch update failed".to_string()));
        }

        for Request::UpdateCells(update) in &requests {
            let sheet = state
                .spreadsheet
                .sheets
                .iter_mut()
                .find(|s| s.properties.sheet_id == update.start.sheet_id)
                .ok_or_else(|| AppError::Transport("unknown sheet id".to_string()))?;
            if sheet.data.is_empty() {
                sheet.data.push(GridData::default());
            }
            let grid = &mut sheet.data[0].row_data;
            for (offset, row) in update.rows.iter().enumerate() {
                let index = update.start.row_index + offset;
                if grid.len() <= index {
                    grid.resize(index + 1, RowData::default());
                }
                grid[index] = row.clone();
            }
        }
        state.batches.push(requests);

        Ok(BatchUpdateResponse {
            spreadsheet_id: state.spreadsheet.spreadsheet_id.clone(),
            updated_spreadsheet: (!state.omit_updated_spreadsheet)
                .then(|| state.spreadsheet.clone()),
        })
    }
}
