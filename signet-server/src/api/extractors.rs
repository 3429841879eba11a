//! Custom Axum extractors.
//!
//! Provides:
//! - `CallerIdentity` resolves the acting user from the `X-User-Id` header,
//!   falling back to the configured default user when anonymous access is on.
//! - `SubmissionBody` parses the ingest body, reporting every JSON problem
//!   as `invalid_request`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use signet_core::intake::Submission;
use signet_sdk::objects::USER_ID_HEADER;
use uuid::Uuid;

use super::ApiError;
use crate::state::AppState;

/// The user on whose behalf the request acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity(pub Uuid);

impl FromRequestParts<AppState> for CallerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return if state.identity.allow_anonymous {
                Ok(CallerIdentity(state.identity.default_user_id))
            } else {
                Err(ApiError::Unauthorized)
            };
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(CallerIdentity)
            .ok_or_else(|| ApiError::InvalidRequest(format!("{USER_ID_HEADER} must be a UUID")))
    }
}

/// Ingest request body, loosely typed until the pipeline validates it.
pub struct SubmissionBody(pub Submission);

impl FromRequest<AppState> for SubmissionBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(submission) = Json::<Submission>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        Ok(SubmissionBody(submission))
    }
}
