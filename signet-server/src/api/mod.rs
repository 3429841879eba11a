//! Ingestion API handlers.
//!
//! # Endpoints
//!
//! - `POST /ingest`             – record an identity signal
//! - `GET  /events/{event_id}`  – fetch one stored event
//! - `GET  /events`             – the caller's most recent events

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

mod error;
mod events;
mod extractors;
mod ingest;

use error::ApiError;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/events", get(events::list_events))
        .route("/events/{event_id}", get(events::get_event))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::file::DEFAULT_USER_ID;
    use crate::config::runtime::IdentityConfig;
    use crate::state::{AppState, Pipeline};
    use signet_core::notifier::{MemoryNotifier, Notifier};
    use signet_core::store::{EventStore, MemoryEventStore};
    use signet_core::{IngestPipeline, PipelineConfig};
    use std::sync::Arc;

    pub fn pipeline_over(
        store: Arc<MemoryEventStore>,
        notifier: Arc<MemoryNotifier>,
    ) -> Arc<Pipeline> {
        let store: Arc<dyn EventStore> = store;
        let notifier: Arc<dyn Notifier> = notifier;
        Arc::new(IngestPipeline::new(
            store,
            notifier,
            PipelineConfig::default(),
        ))
    }

    pub fn memory_pipeline() -> (Arc<Pipeline>, Arc<MemoryEventStore>, Arc<MemoryNotifier>) {
        let store = Arc::new(MemoryEventStore::new());
        let notifier = Arc::new(MemoryNotifier::new());
        (
            pipeline_over(store.clone(), notifier.clone()),
            store,
            notifier,
        )
    }

    pub fn app_state(pipeline: Arc<Pipeline>, allow_anonymous: bool) -> AppState {
        AppState::new(
            pipeline,
            IdentityConfig {
                default_user_id: DEFAULT_USER_ID,
                allow_anonymous,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{app_state, memory_pipeline, pipeline_over};
    use crate::config::file::DEFAULT_USER_ID;
    use crate::server::build_router;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use signet_core::notifier::MemoryNotifier;
    use signet_core::store::MemoryEventStore;
    use signet_sdk::canonical;
    use signet_sdk::objects::{EventResponse, IngestResponse, ListEventsResponse, USER_ID_HEADER};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn vc_payload() -> Value {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:test",
            "issuanceDate": "2024-01-01T00:00:00Z",
            "credentialSubject": { "name": "Test User" }
        })
    }

    fn ingest_request(body: &Value, user: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::post("/ingest").header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, user: Option<Uuid>) -> Request<Body> {
        let mut builder = Request::get(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_vc_ingest_then_fetch() {
        let (pipeline, _, notifier) = memory_pipeline();
        let router = build_router(app_state(pipeline, true));

        let (status, body) = send(&router, ingest_request(&json!({
            "source_type": "VC",
            "payload": vc_payload(),
        }), None))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: IngestResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(body["status"], "accepted");
        assert_eq!(created.event_id.get_version_num(), 4);

        let (status, body) = send(&router, get_request(&format!("/events/{}", created.event_id), None)).await;
        assert_eq!(status, StatusCode::OK);
        let event: EventResponse = serde_json::from_value(body).unwrap();
        assert_eq!(event.event_id, created.event_id);
        assert_eq!(event.user_id, DEFAULT_USER_ID);
        assert_eq!(event.created_at, created.created_at);
        assert_eq!(Value::Object(event.raw_payload.clone()), vc_payload());
        assert!(event.verify_checksum());
        assert_eq!(
            event.checksum,
            canonical::checksum(&canonical::encode_canonical(&event.raw_payload).unwrap())
        );

        assert_eq!(notifier.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failing_notifier_still_returns_created() {
        let store = Arc::new(MemoryEventStore::new());
        let notifier = Arc::new(MemoryNotifier::failing());
        let router = build_router(app_state(pipeline_over(store.clone(), notifier.clone()), true));

        let (status, body) = send(&router, ingest_request(&json!({
            "source_type": "OIDC",
            "payload": { "sub": "123", "iss": "https://issuer.example.com" },
        }), None))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(notifier.attempts(), 1);

        let event_id = body["event_id"].as_str().unwrap();
        let (status, _) = send(&router, get_request(&format!("/events/{event_id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_source_type_is_rejected_without_a_row() {
        let (pipeline, store, notifier) = memory_pipeline();
        let router = build_router(app_state(pipeline, true));

        let (status, body) = send(&router, ingest_request(&json!({
            "source_type": "BOGUS",
            "payload": {},
        }), None))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
        assert!(store.is_empty().await);
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_invalid_requests() {
        let (pipeline, store, _) = memory_pipeline();
        let router = build_router(app_state(pipeline, true));

        for body in [
            json!({ "payload": {} }),
            json!({ "source_type": "VC" }),
            json!({ "source_type": "VC", "payload": [1, 2] }),
            json!({ "source_type": 7, "payload": {} }),
            json!([1, 2, 3]),
        ] {
            let (status, json) = send(&router, ingest_request(&body, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert_eq!(json["error"], "invalid_request");
        }

        let raw = Request::post("/ingest")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, json) = send(&router, raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_request");

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_failure_is_storage_error() {
        let store = Arc::new(MemoryEventStore::new());
        store.set_fail_writes(true);
        let notifier = Arc::new(MemoryNotifier::new());
        let router = build_router(app_state(pipeline_over(store, notifier.clone()), true));

        let (status, body) = send(&router, ingest_request(&json!({
            "source_type": "MANUAL",
            "payload": { "name": "x" },
        }), None))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage_error");
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_not_found() {
        let (pipeline, _, _) = memory_pipeline();
        let router = build_router(app_state(pipeline, true));

        for uri in [format!("/events/{}", Uuid::new_v4()), "/events/not-a-uuid".to_string()] {
            let (status, body) = send(&router, get_request(&uri, None)).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body["error"], "not_found");
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_caller() {
        let (pipeline, _, _) = memory_pipeline();
        let router = build_router(app_state(pipeline, true));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for i in 0..3 {
            let body = json!({ "source_type": "MANUAL", "payload": { "i": i } });
            let (status, _) = send(&router, ingest_request(&body, Some(alice))).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let body = json!({ "source_type": "OIDC", "payload": { "sub": "bob" } });
        send(&router, ingest_request(&body, Some(bob))).await;

        let (status, body) = send(&router, get_request("/events", Some(alice))).await;
        assert_eq!(status, StatusCode::OK);
        let listed: ListEventsResponse = serde_json::from_value(body).unwrap();
        assert_eq!(listed.count, 3);
        assert!(listed.events.iter().all(|e| e.user_id == alice));
        assert!(
            listed
                .events
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );

        let (_, body) = send(&router, get_request("/events", None)).await;
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn test_identity_header_rules() {
        let (pipeline, _, _) = memory_pipeline();
        let strict = build_router(app_state(pipeline, false));

        let (status, body) = send(&strict, get_request("/events", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let bad = Request::get("/events")
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&strict, bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");

        let (status, _) = send(&strict, get_request("/events", Some(Uuid::new_v4()))).await;
        assert_eq!(status, StatusCode::OK);
    }
}
