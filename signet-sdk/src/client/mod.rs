//! HTTP client for the Signet ingestion API.
//!
//! Gated behind the `client` cargo feature so downstream crates that only
//! need the shared types do not pull in `reqwest`.

use reqwest::{Client, StatusCode};
use url::Url;
use uuid::Uuid;

use crate::canonical::Payload;
use crate::objects::{
    EventResponse, IngestRequest, IngestResponse, ListEventsResponse, SourceType, USER_ID_HEADER,
};

/// Errors produced by the SDK HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Typed HTTP client for the ingestion API.
///
/// When `user_id` is set, every request carries it in the `X-User-Id`
/// header; otherwise the server decides whether anonymous calls are allowed.
#[derive(Debug, Clone)]
pub struct IngestClient {
    http: Client,
    base_url: Url,
    user_id: Option<Uuid>,
}

impl IngestClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
            user_id: None,
        }
    }

    /// Act on behalf of the given user.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn with_identity(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.user_id {
            Some(id) => request.header(USER_ID_HEADER, id.to_string()),
            None => request,
        }
    }

    /// `POST /ingest` – submit an identity signal.
    pub async fn ingest(
        &self,
        source_type: SourceType,
        payload: Payload,
    ) -> Result<IngestResponse, ClientError> {
        let url = self.base_url.join("/ingest")?;
        let body = IngestRequest {
            source_type,
            payload,
        };

        let resp = self
            .with_identity(self.http.post(url))
            .json(&body)
            .send()
            .await?;

        parse_response(resp).await
    }

    /// `GET /events/{event_id}` – fetch one stored event.
    pub async fn get_event(&self, event_id: Uuid) -> Result<EventResponse, ClientError> {
        let url = self.base_url.join(&format!("/events/{event_id}"))?;

        let resp = self.with_identity(self.http.get(url)).send().await?;

        parse_response(resp).await
    }

    /// `GET /events` – the caller's most recent events, newest first.
    pub async fn list_events(&self) -> Result<ListEventsResponse, ClientError> {
        let url = self.base_url.join("/events")?;

        let resp = self.with_identity(self.http.get(url)).send().await?;

        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
