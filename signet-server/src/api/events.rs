use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use signet_core::IngestError;
use signet_core::entities::IngestionEvent;
use signet_sdk::objects::{EventResponse, ListEventsResponse};
use uuid::Uuid;

use super::ApiError;
use super::extractors::CallerIdentity;
use crate::state::AppState;

fn to_response(event: &IngestionEvent) -> Result<EventResponse, ApiError> {
    event.to_response().map_err(|e| {
        ApiError::Ingest(IngestError::Internal(format!(
            "stored payload of {} does not decode: {e}",
            event.event_id
        )))
    })
}

/// `GET /events/{event_id}` - fetch one event.
///
/// An id that is not a UUID cannot name an event, so it is a 404 as well.
pub(super) async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = Uuid::parse_str(&event_id).map_err(|_| ApiError::NotFound)?;
    let event = state.pipeline.get_event(event_id).await?;
    Ok(Json(to_response(&event)?))
}

/// `GET /events` - the caller's most recent events, newest first.
pub(super) async fn list_events(
    State(state): State<AppState>,
    CallerIdentity(user_id): CallerIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let events = state
        .pipeline
        .list_events(user_id)
        .await?
        .iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ListEventsResponse {
        count: events.len(),
        events,
    }))
}
