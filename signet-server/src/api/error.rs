use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use signet_core::IngestError;
use signet_sdk::objects::{ErrorCode, ErrorResponse};

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The body or a header could not be parsed.
    InvalidRequest(String),
    /// No caller identity and anonymous access is disabled.
    Unauthorized,
    /// The path does not name an existing event.
    NotFound,
    Ingest(IngestError),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        ApiError::Ingest(err)
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, ErrorCode, String) {
        match self {
            ApiError::InvalidRequest(message) => {
                tracing::debug!(%message, "Rejected malformed request");
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, message)
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "missing X-User-Id header".to_string(),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                "event not found".to_string(),
            ),
            ApiError::Ingest(IngestError::InvalidRequest(message)) => {
                tracing::debug!(%message, "Rejected invalid submission");
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, message)
            }
            ApiError::Ingest(IngestError::NotFound(event_id)) => {
                tracing::debug!(%event_id, "Event not found");
                (
                    StatusCode::NOT_FOUND,
                    ErrorCode::NotFound,
                    "event not found".to_string(),
                )
            }
            ApiError::Ingest(IngestError::Storage(e)) => {
                tracing::error!(error = %e, "Event store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::StorageError,
                    "failed to access event store".to_string(),
                )
            }
            ApiError::Ingest(IngestError::Internal(message)) => {
                tracing::error!(%message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "internal server error".to_string(),
                )
            }
            ApiError::Ingest(IngestError::Overloaded) => {
                tracing::warn!("Shedding load, too many ingestions in flight");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::Overloaded,
                    "too many ingestions in flight, retry later".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_core::StoreError;
    use uuid::Uuid;

    fn status_and_code(err: ApiError) -> (StatusCode, ErrorCode) {
        let (status, code, _) = err.parts();
        (status, code)
    }

    #[test]
    fn test_ingest_error_mapping() {
        assert_eq!(
            status_and_code(IngestError::InvalidRequest("x".into()).into()),
            (StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest)
        );
        assert_eq!(
            status_and_code(IngestError::NotFound(Uuid::nil()).into()),
            (StatusCode::NOT_FOUND, ErrorCode::NotFound)
        );
        assert_eq!(
            status_and_code(IngestError::Storage(StoreError::Closed).into()),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageError)
        );
        assert_eq!(
            status_and_code(IngestError::Internal("x".into()).into()),
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError)
        );
        assert_eq!(
            status_and_code(IngestError::Overloaded.into()),
            (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::Overloaded)
        );
        assert_eq!(
            status_and_code(ApiError::Unauthorized),
            (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized)
        );
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let err = IngestError::Storage(StoreError::Rejected("fk_user violated".into()));
        let (_, _, message) = ApiError::from(err).parts();
        assert!(!message.contains("fk_user"));
    }
}
