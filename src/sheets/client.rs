//! Spreadsheet backend transport.

use std::future::Future;

use crate::errors::AppError;
use crate::models::{BatchUpdateResponse, BatchUpdateSpreadsheetRequest, Request, Spreadsheet};

/// Remote spreadsheet operations the sync depends on.
pub trait SheetsBackend: Send + Sync {
    /// Full grid read of every sheet in the workbook.
    fn fetch_spreadsheet(
        &self,
        workbook_key: &str,
    ) -> impl Future<Output = Result<Spreadsheet, AppError>> + Send;

    /// Apply all requests as one atomic write, returning the post-write workbook when available.
    fn batch_update(
        &self,
        workbook_key: &str,
        requests: Vec<Request>,
    ) -> impl Future<Output = Result<BatchUpdateResponse, AppError>> + Send;
}

/// Google Sheets v4 REST client.
#[derive(Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl GoogleSheetsClient {
    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn spreadsheet_url(&self, workbook_key: &str) -> String {
        format!("{}/spreadsheets/{}", self.base_url, workbook_key)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl SheetsBackend for GoogleSheetsClient {
    async fn fetch_spreadsheet(&self, workbook_key: &str) -> Result<Spreadsheet, AppError> {
        let request = self
            .http
            .get(self.spreadsheet_url(workbook_key))
            .query(&[("includeGridData", "true")]);

        let spreadsheet = self
            .authorized(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Spreadsheet>()
            .await?;

        tracing::debug!(
            "Fetched workbook {} with {} sheets",
            workbook_key,
            spreadsheet.sheets.len()
        );
        Ok(spreadsheet)
    }

    async fn batch_update(
        &self,
        workbook_key: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse, AppError> {
        let count = requests.len();
        let body = BatchUpdateSpreadsheetRequest {
            requests,
            include_spreadsheet_in_response: true,
            response_include_grid_data: true,
        };

        let request = self
            .http
            .post(format!("{}:batchUpdate", self.spreadsheet_url(workbook_key)))
            .json(&body);

        let response = self
            .authorized(request)
            .send()
            .await?
            .error_for_status()?
            .json::<BatchUpdateResponse>()
            .await?;

        tracing::debug!("Applied batch of {} requests to {}", count, workbook_key);
        Ok(response)
    }
}
