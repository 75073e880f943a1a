use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::pipeline::WebhookPipeline;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Clone)]
pub struct AdapterState {
    pipeline: Arc<WebhookPipeline>,
}

impl AdapterState {
    pub fn new(pipeline: Arc<WebhookPipeline>) -> Self {
        Self { pipeline }
    }

    pub(crate) fn pipeline(&self) -> Arc<WebhookPipeline> {
        Arc::clone(&self.pipeline)
    }
}

/// Every path accepts `POST` (webhook) and `OPTIONS` (preflight); `GET
/// /healthz` is the only other route.
///
/// Bodies of any size reach the pipeline so the caller always gets an
/// in-band envelope, never a bare 413.
pub fn router_with_state(state: AdapterState) -> Router {
    let router = Router::new()
        .route(
            "/healthz",
            get(healthz_handler)
                .post(webhook_handler)
                .options(preflight_handler),
        )
        .route("/", post(webhook_handler).options(preflight_handler))
        .route("/*path", post(webhook_handler).options(preflight_handler))
        .layer(DefaultBodyLimit::disable())
        .with_state(state);
    with_cors_headers(router)
}

pub fn router(pipeline: Arc<WebhookPipeline>) -> Router {
    router_with_state(AdapterState::new(pipeline))
}

/// Stamps the permissive CORS headers on every response, preflight or not.
fn with_cors_headers(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
}

async fn healthz_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

/// Always answers 200; failures travel in the body's `error` field.
async fn webhook_handler(State(state): State<AdapterState>, body: Bytes) -> Response {
    let envelope = state.pipeline().handle(&body).await;
    (StatusCode::OK, Json(envelope)).into_response()
}
