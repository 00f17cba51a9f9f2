//! Configuration module for the thread sync service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;

/// Sheet title used when `SYNC_SHEET_TITLE` is not set.
pub const DEFAULT_SHEET_TITLE: &str = "Discord Sync";

/// Google Sheets v4 REST endpoint.
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Key of the workbook that receives thread rows
    pub workbook_key: String,
    /// Title of the sheet inside the workbook, matched case-insensitively
    pub sheet_title: String,
    pub sheets_base_url: String,
    /// Bearer token for the spreadsheet backend
    pub access_token: Option<String>,
    /// Number of pending sync jobs the queue holds before producers wait
    pub queue_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("SYNC_API_PSK").ok();

        let bind_addr = env::var("SYNC_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid SYNC_BIND_ADDR format");

        let log_level = env::var("SYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("SYNC_LOG_FORMAT") {
            Ok(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let workbook_key = env::var("SYNC_WORKBOOK_KEY").unwrap_or_default();

        let sheet_title =
            env::var("SYNC_SHEET_TITLE").unwrap_or_else(|_| DEFAULT_SHEET_TITLE.to_string());

        let sheets_base_url = env::var("SYNC_SHEETS_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SHEETS_BASE_URL.to_string());

        let access_token = env::var("SYNC_ACCESS_TOKEN").ok();

        let queue_capacity = env::var("SYNC_QUEUE_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(256);

        Self {
            api_psk,
            bind_addr,
            log_level,
            log_format,
            workbook_key,
            sheet_title,
            sheets_base_url,
            access_token,
            queue_capacity,
        }
    }
}
