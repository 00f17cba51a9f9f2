//! Row identity: find the row holding a thread, or reserve the next unused one.

use super::header::HeaderField;
use crate::errors::AppError;
use crate::models::{CellContent, HeaderRow, WorkbookSnapshot};

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_F64_INTEGER: u64 = 1 << 53;

/// Position of the first header resolving to the identifier column.
pub fn identifier_column(headers: &HeaderRow) -> Result<usize, AppError> {
    headers
        .iter()
        .position(|header| {
            header.is_some_and(|h| HeaderField::from_header(h) == HeaderField::DiscordId)
        })
        .ok_or_else(|| AppError::Configuration("No 'Discord ID' column found".to_string()))
}

/// First row (after the header) whose identifier cell equals `thread_id`.
pub fn find_row(
    snapshot: &WorkbookSnapshot,
    id_column: usize,
    thread_id: u64,
) -> Result<Option<usize>, AppError> {
    for (row_index, row) in snapshot.rows.iter().enumerate().skip(1) {
        if row.is_empty() {
            continue;
        }
        let Some(cell) = row.values.get(id_column) else {
            continue;
        };
        if let Some(content) = cell.read_value()? {
            if identifier_matches(&content, thread_id) {
                return Ok(Some(row_index));
            }
        }
    }
    Ok(None)
}

/// Resolve the row for `thread_id`, reserving `row_count + provisional_rows` when absent.
pub fn locate_or_allocate(
    snapshot: &WorkbookSnapshot,
    provisional_rows: &mut usize,
    id_column: usize,
    thread_id: u64,
) -> Result<RowSlot, AppError> {
    if let Some(row_index) = find_row(snapshot, id_column, thread_id)? {
        return Ok(RowSlot::Existing(row_index));
    }

    let row_index = snapshot.row_count() + *provisional_rows;
    *provisional_rows += 1;
    Ok(RowSlot::Appended(row_index))
}

/// Where a thread's row update lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSlot {
    Existing(usize),
    Appended(usize),
}

impl RowSlot {
    pub fn index(self) -> usize {
        match self {
            RowSlot::Existing(i) | RowSlot::Appended(i) => i,
        }
    }

    pub fn is_appended(self) -> bool {
        matches!(self, RowSlot::Appended(_))
    }
}

fn identifier_matches(content: &CellContent, thread_id: u64) -> bool {
    match content {
        CellContent::Text(s) | CellContent::Formula(s) => {
            s.trim().parse::<u64>().is_ok_and(|id| id == thread_id)
        }
        // Numbers beyond 2^53 were rounded on entry and cannot identify a thread.
        CellContent::Number(n) => thread_id <= MAX_EXACT_F64_INTEGER && *n == thread_id as f64,
        CellContent::Bool(_) => false,
    }
}
