/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Router, handlers, and server loop.
//!
//! Handlers only take shared access to the registry and the cache.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fixstatus_canonical::{CanonicalMessage, decode};
use fixstatus_core::types::ConnectionStatus;
use fixstatus_delivery::LatestMessageCache;
use fixstatus_session::SessionRegistry;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct StatusState {
    registry: Arc<SessionRegistry>,
    cache: Option<Arc<LatestMessageCache>>,
}

impl StatusState {
    /// Creates state exposing the registry only.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Exposes the latest-message cache on `/messages/latest`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<LatestMessageCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// One row of `GET /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Canonical session key.
    pub identity: String,
    /// `Connected` or `Disconnected`.
    pub status: ConnectionStatus,
}

/// Body of `GET /messages/latest`.
#[derive(Debug, Clone, Serialize)]
pub struct LatestMessageView {
    /// When the cache received the payload.
    pub captured_at: DateTime<Utc>,
    /// Decoded canonical message.
    pub message: CanonicalMessage,
}

/// Builds the status router.
pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/sessions", get(sessions))
        .route("/messages/latest", get(latest_message))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves the router on `listener` until `token` is cancelled.
///
/// # Errors
/// Returns the I/O error that stopped the server.
pub async fn serve(
    listener: TcpListener,
    state: StatusState,
    token: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "status service listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;
    info!("status service stopped");
    Ok(())
}

async fn sessions(State(state): State<StatusState>) -> Json<Vec<SessionView>> {
    let views = state
        .registry
        .snapshot()
        .into_iter()
        .map(|s| SessionView {
            status: s.status(),
            identity: s.identity,
        })
        .collect();
    Json(views)
}

async fn latest_message(State(state): State<StatusState>) -> Response {
    let Some(cached) = state.cache.as_ref().and_then(|cache| cache.latest()) else {
        return error_response(StatusCode::NOT_FOUND, "no message captured");
    };

    match decode(&cached.payload) {
        Ok(message) => Json(LatestMessageView {
            captured_at: cached.captured_at,
            message,
        })
        .into_response(),
        Err(error) => {
            warn!(%error, "cached payload does not decode");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use fixstatus_canonical::{MessageKind, encode};
    use fixstatus_core::types::SessionIdentity;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_sessions_ordered_by_identity() {
        let registry = Arc::new(SessionRegistry::new());
        registry.set_connected(&SessionIdentity::new("FIX.4.4", "B", "X"), false);
        registry.set_connected(&SessionIdentity::new("FIX.4.4", "A", "X"), true);

        let (status, body) = get_json(router(StatusState::new(registry)), "/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                {"identity": "FIX.4.4:A->X", "status": "Connected"},
                {"identity": "FIX.4.4:B->X", "status": "Disconnected"},
            ])
        );
    }

    #[tokio::test]
    async fn test_sessions_empty() {
        let app = router(StatusState::new(Arc::new(SessionRegistry::new())));
        let (status, body) = get_json(app, "/sessions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_latest_message_not_found() {
        let registry = Arc::new(SessionRegistry::new());
        let (status, _) = get_json(router(StatusState::new(Arc::clone(&registry))), "/messages/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let state = StatusState::new(registry).with_cache(Arc::new(LatestMessageCache::new()));
        let (status, body) = get_json(router(state), "/messages/latest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_latest_message_decoded() {
        let mut canonical = CanonicalMessage::default();
        canonical.header.msg_type = MessageKind::NewOrderSingle;
        canonical.body.symbol = "AAPL".to_string();
        canonical.body.order_qty = 100.0;

        let cache = Arc::new(LatestMessageCache::new());
        cache.store(encode(&canonical));
        let state = StatusState::new(Arc::new(SessionRegistry::new())).with_cache(cache);

        let (status, body) = get_json(router(state), "/messages/latest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"]["header"]["msg_type"], "NEW_ORDER_SINGLE");
        assert_eq!(body["message"]["body"]["symbol"], "AAPL");
        assert_eq!(body["message"]["body"]["order_qty"], 100.0);
        assert!(body["captured_at"].is_string());
    }

    #[tokio::test]
    async fn test_latest_message_undecodable() {
        let cache = Arc::new(LatestMessageCache::new());
        cache.store(Bytes::from_static(&[0x0A, 0x05, b'A']));
        let state = StatusState::new(Arc::new(SessionRegistry::new())).with_cache(cache);

        let (status, _) = get_json(router(state), "/messages/latest").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(StatusState::new(Arc::new(SessionRegistry::new())));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_serve_stops_on_cancel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let token = CancellationToken::new();
        let server = tokio::spawn(serve(
            listener,
            StatusState::new(Arc::new(SessionRegistry::new())),
            token.clone(),
        ));
        token.cancel();
        server.await.unwrap().unwrap();
    }
}
