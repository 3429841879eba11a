use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use signet_sdk::objects::{IngestResponse, IngestStatus};

use super::ApiError;
use super::extractors::{CallerIdentity, SubmissionBody};
use crate::state::AppState;

/// `POST /ingest` - record an identity signal.
///
/// Returns 201 once the event is durably stored, whether or not the
/// downstream notification went out.
pub(super) async fn ingest(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
    SubmissionBody(submission): SubmissionBody,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state.pipeline.ingest(submission, user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            event_id: receipt.event_id,
            status: IngestStatus::Accepted,
            message: "Event ingested successfully".to_string(),
            created_at: receipt.created_at,
        }),
    ))
}
