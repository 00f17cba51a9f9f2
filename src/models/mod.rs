//! Data models for the thread sync service.
//!
//! Wire types match the spreadsheet backend's JSON schema; thread types match the chat bridge payload.

mod cell;
mod sheet;
mod thread;
mod workbook;

pub use cell::*;
pub use sheet::*;
pub use thread::*;
pub use workbook::*;
