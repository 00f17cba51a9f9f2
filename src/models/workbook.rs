//! Point-in-time copy of the target sheet.

use super::sheet::{RowData, Spreadsheet};
use crate::errors::AppError;

/// Row 1 of the sheet as literally entered; column index is the position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRow(Vec<Option<String>>);

impl HeaderRow {
    pub fn new(headers: Vec<Option<String>>) -> Self {
        Self(headers)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|h| h.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Immutable snapshot of one sheet: identifier, header row, and every grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSnapshot {
    pub sheet_id: i64,
    pub sheet_title: String,
    pub headers: HeaderRow,
    /// All grid rows; index 0 is the header row.
    pub rows: Vec<RowData>,
}

impl WorkbookSnapshot {
    /// Select the sheet titled `sheet_title` (case-insensitive) out of a fetched spreadsheet.
    pub fn from_spreadsheet(spreadsheet: Spreadsheet, sheet_title: &str) -> Result<Self, AppError> {
        let wanted = sheet_title.to_lowercase();
        let found_titles: Vec<String> = spreadsheet
            .sheets
            .iter()
            .map(|s| s.properties.title.clone())
            .collect();

        let sheet = spreadsheet
            .sheets
            .into_iter()
            .find(|s| s.properties.title.to_lowercase() == wanted)
            .ok_or_else(|| {
                AppError::Configuration(format!(
                    "No sheets found with title {}; found {:?}",
                    sheet_title, found_titles
                ))
            })?;

        let rows = sheet
            .data
            .into_iter()
            .next()
            .map(|grid| grid.row_data)
            .unwrap_or_default();

        let headers = match rows.first() {
            Some(header_row) => header_row
                .values
                .iter()
                .map(|cell| -> Result<Option<String>, AppError> {
                    Ok(cell.read_value()?.map(|content| content.into_text()))
                })
                .collect::<Result<Vec<_>, AppError>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            sheet_id: sheet.properties.sheet_id,
            sheet_title: sheet.properties.title,
            headers: HeaderRow::new(headers),
            rows,
        })
    }

    /// Number of grid rows including the header; also the first never-used row index.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
