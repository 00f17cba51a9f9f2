//! Worker status endpoint.

use axum::extract::State;
use serde::Serialize;

use super::ApiResult;
use crate::worker::WorkerStatus;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub sheet_title: String,
    pub queue_capacity: usize,
    pub queue_pending: usize,
    pub worker: WorkerStatus,
}

/// GET /api/status - Sync worker counters.
pub async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let worker = state.status.read().await.clone();

    Ok(super::ApiResponse::new(StatusResponse {
        sheet_title: state.config.sheet_title.clone(),
        queue_capacity: state.queue.capacity(),
        queue_pending: state.queue.pending(),
        worker,
    }))
}
