use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{Encoder, Registry, TextEncoder};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info};

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        webhook_adapter::metrics::register_metrics(global_registry());
    });
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

/// Router exposing the global registry at `/metrics`.
pub fn metrics_router() -> Router {
    register_metrics();
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(global_registry().clone()))
}

/// Binds the metrics listener on `port` and serves it in the background.
/// `0` disables it. Bind failures are returned to the caller.
pub async fn spawn_metrics_server(port: u16) -> anyhow::Result<Option<JoinHandle<()>>> {
    if port == 0 {
        return Ok(None);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
    info!(%addr, "metrics server listening");

    let app = metrics_router();
    Ok(Some(tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(?err, "metrics server exited with error");
        }
    })))
}

pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> Response {
    match render(&registry) {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(?err, "failed to encode prometheus metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn metrics_route_serves_prometheus_text() {
        webhook_adapter::metrics::record_request(webhook_adapter::InboundShape::Direct);
        let response = metrics_router()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("vapi_bridge_requests_total"));
    }

    #[tokio::test]
    async fn port_zero_disables_the_listener() {
        assert!(spawn_metrics_server(0).await.unwrap().is_none());
    }

    #[test]
    fn adapter_metrics_are_exported() {
        register_metrics();
        webhook_adapter::metrics::record_failure("remote_call");
        let text = render(global_registry()).unwrap();
        assert!(text.contains("vapi_bridge_failures_total"));
    }
}
