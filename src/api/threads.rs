//! Thread update endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{BulkThreadsRequest, ThreadPayload, ThreadRecord};
use crate::worker::SyncJob;
use crate::AppState;

/// Acknowledgement for an enqueued sync job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJob {
    /// Thread ids as decimal strings; they exceed the exact range of JSON numbers in many clients.
    pub thread_ids: Vec<String>,
    pub queue_pending: usize,
}

type Accepted = Result<(StatusCode, ApiResponse<QueuedJob>), AppError>;

/// POST /api/threads - One thread was created or changed.
pub async fn submit_thread(
    State(state): State<AppState>,
    payload: Result<Json<ThreadPayload>, JsonRejection>,
) -> Accepted {
    let Json(payload) = payload.map_err(reject_body)?;
    let thread = payload.into_record()?;
    let thread_ids = vec![thread.id.to_string()];

    tracing::debug!("Queueing {}", thread);
    state.queue.enqueue(SyncJob::One(thread)).await?;

    accepted(&state, thread_ids)
}

/// POST /api/threads/bulk - Initial sync of every existing thread, written as one batch.
pub async fn submit_threads_bulk(
    State(state): State<AppState>,
    payload: Result<Json<BulkThreadsRequest>, JsonRejection>,
) -> Accepted {
    let Json(request) = payload.map_err(reject_body)?;

    if request.threads.is_empty() {
        return Err(AppError::Validation("No threads provided".to_string()));
    }

    let threads = request
        .threads
        .into_iter()
        .map(ThreadPayload::into_record)
        .collect::<Result<Vec<ThreadRecord>, AppError>>()?;
    let thread_ids = threads.iter().map(|t| t.id.to_string()).collect();

    tracing::info!("Queueing initial sync of {} threads", threads.len());
    state.queue.enqueue(SyncJob::Many(threads)).await?;

    accepted(&state, thread_ids)
}

fn accepted(state: &AppState, thread_ids: Vec<String>) -> Accepted {
    Ok((
        StatusCode::ACCEPTED,
        ApiResponse::new(QueuedJob {
            thread_ids,
            queue_pending: state.queue.pending(),
        }),
    ))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::Validation(format!("Invalid thread payload: {}", rejection.body_text()))
}
