//! Spreadsheet backend wire types.
//!
//! These mirror the Google Sheets v4 JSON schema for the subset of fields the sync reads and writes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Full spreadsheet as returned by a grid-data fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub properties: SheetProperties,
    #[serde(default)]
    pub data: Vec<GridData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub sheet_id: i64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridData {
    #[serde(default)]
    pub row_data: Vec<RowData>,
}

/// One grid row. A row with no values is a row with no data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RowData {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<CellData>,
}

impl RowData {
    pub fn new(values: Vec<CellData>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cell payload: value union plus optional format hints.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_entered_value: Option<ExtendedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_entered_format: Option<CellFormat>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_format_runs: Vec<TextFormatRun>,
}

impl CellData {
    /// Decode the entered value, `None` when the cell holds nothing.
    pub fn read_value(&self) -> Result<Option<CellContent>, AppError> {
        self.user_entered_value
            .as_ref()
            .map(ExtendedValue::decode)
            .transpose()
    }
}

/// Value union. Exactly one key is expected to be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    /// Keys this service does not understand (e.g. `errorValue`).
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A decoded cell value as read back from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    Number(f64),
    Formula(String),
    Bool(bool),
}

impl CellContent {
    /// Textual rendering used for header cells.
    pub fn into_text(self) -> String {
        match self {
            CellContent::Text(s) | CellContent::Formula(s) => s,
            CellContent::Number(n) => n.to_string(),
            CellContent::Bool(b) => b.to_string(),
        }
    }
}

impl ExtendedValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            number_value: Some(value),
            ..Self::default()
        }
    }

    pub fn formula(value: impl Into<String>) -> Self {
        Self {
            formula_value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn decode(&self) -> Result<CellContent, AppError> {
        let populated = [
            self.string_value.is_some(),
            self.number_value.is_some(),
            self.formula_value.is_some(),
            self.bool_value.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
            + self.other.len();

        if populated != 1 {
            return Err(self.encoding_error("Expected a single-key value union"));
        }

        if let Some(s) = &self.string_value {
            Ok(CellContent::Text(s.clone()))
        } else if let Some(n) = self.number_value {
            Ok(CellContent::Number(n))
        } else if let Some(f) = &self.formula_value {
            Ok(CellContent::Formula(f.clone()))
        } else if let Some(b) = self.bool_value {
            Ok(CellContent::Bool(b))
        } else {
            Err(self.encoding_error("Unhandled value type"))
        }
    }

    fn encoding_error(&self, message: &str) -> AppError {
        AppError::ValueEncoding {
            message: message.to_string(),
            raw: serde_json::to_string(self).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<NumberFormat>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NumberFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Marks the start of a styled span within the cell's string value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextFormatRun {
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub format: TextFormat,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub uri: String,
}

/// Batch update operation. Only full-row cell replacement is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    UpdateCells(UpdateCellsRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCellsRequest {
    pub start: GridCoordinate,
    pub rows: Vec<RowData>,
    /// Field mask; `*` overwrites every field of every addressed cell.
    pub fields: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: i64,
    pub row_index: usize,
    pub column_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateSpreadsheetRequest {
    pub requests: Vec<Request>,
    pub include_spreadsheet_in_response: bool,
    pub response_include_grid_data: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub updated_spreadsheet: Option<Spreadsheet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_single_key_unions() {
        let cell: CellData =
            serde_json::from_value(json!({ "userEnteredValue": { "stringValue": "abc" } }))
                .unwrap();
        assert_eq!(
            cell.read_value().unwrap(),
            Some(CellContent::Text("abc".into()))
        );

        let cell: CellData =
            serde_json::from_value(json!({ "userEnteredValue": { "numberValue": 12 } })).unwrap();
        assert_eq!(cell.read_value().unwrap(), Some(CellContent::Number(12.0)));

        let cell: CellData = serde_json::from_value(json!({ "formattedValue": "x" })).unwrap();
        assert_eq!(cell.read_value().unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_ambiguous_union() {
        let cell: CellData = serde_json::from_value(json!({
            "userEnteredValue": { "stringValue": "a", "numberValue": 1 }
        }))
        .unwrap();

        match cell.read_value() {
            Err(AppError::ValueEncoding { raw, .. }) => {
                assert!(raw.contains("stringValue"));
                assert!(raw.contains("numberValue"));
            }
            other => panic!("Expected value encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_unknown_key() {
        let cell: CellData = serde_json::from_value(json!({
            "userEnteredValue": { "errorValue": { "type": "REF" } }
        }))
        .unwrap();

        match cell.read_value() {
            Err(AppError::ValueEncoding { raw, .. }) => assert!(raw.contains("errorValue")),
            other => panic!("Expected value encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_cells_wire_shape() {
        let request = Request::UpdateCells(UpdateCellsRequest {
            start: GridCoordinate {
                sheet_id: 7,
                row_index: 3,
                column_index: 0,
            },
            rows: vec![RowData::new(vec![
                CellData {
                    user_entered_value: Some(ExtendedValue::string("42")),
                    ..CellData::default()
                },
                CellData::default(),
            ])],
            fields: "*".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "updateCells": {
                    "start": { "sheetId": 7, "rowIndex": 3, "columnIndex": 0 },
                    "rows": [{ "values": [
                        { "userEnteredValue": { "stringValue": "42" } },
                        {}
                    ] }],
                    "fields": "*"
                }
            })
        );
    }
}
