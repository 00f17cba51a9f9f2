//! Spreadsheet synchronization engine.
//!
//! Keeps one row per thread in the target sheet. Column layout comes from the sheet's own header
//! row; rows are found by the identifier column and new threads are appended after the last row.

mod cache;
mod client;
mod header;
mod locator;
mod projector;
mod sync;

pub use client::{GoogleSheetsClient, SheetsBackend};
pub use sync::{SheetSync, SyncReport};
