//! HTTP and WebSocket surface.
//!
//! Thin routing over the session registry, the job orchestrator and the metadata
//! query:
//!
//! - `GET  /ws`             notification channel
//! - `POST /api/formats`    `{url}` → `{title, thumbnail, formats}`
//! - `POST /api/download`   `{session_id, url, title, options}` → 202
//! - `GET  /downloads/*`    finished artifacts (read-only)
//! - `GET  /health`

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::core::config::{self, Config};
use crate::core::error::AppError;
use crate::core::process::CommandRunner;
use crate::download::metadata::fetch_formats;
use crate::jobs::{JobOrchestrator, SubmitJobPayload};
use crate::session::SessionRegistry;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub orchestrator: Arc<JobOrchestrator>,
    pub runner: Arc<dyn CommandRunner>,
    pub ytdl_bin: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("Invalid request: {}", fields.join(", ")),
                    "invalid": fields,
                })),
            )
                .into_response(),
            AppError::Metadata(message) => (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response(),
            other => {
                log::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Build the router; split out from [`start_web_server`] for tests.
pub fn router(state: AppState, config: &Config) -> Router {
    let cors = match config.allowed_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(origin),
        Some(Err(e)) => {
            log::warn!("Invalid ALLOWED_ORIGIN ({}), allowing any origin", e);
            CorsLayer::new().allow_origin(Any)
        }
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/formats", post(formats_handler))
        .route("/api/download", post(download_handler))
        .route("/health", get(health_handler))
        .nest_service(config::server::DOWNLOAD_ROUTE, ServeDir::new(&config.download_folder))
        .layer(cors)
        .with_state(state)
}

/// Start the web server and serve until the listener fails.
pub async fn start_web_server(state: AppState, config: &Config) -> anyhow::Result<()> {
    let app = router(state, config);

    log::info!("Starting web server on http://{}", config.bind_addr);
    log::info!("  /ws            - Notification channel");
    log::info!("  /api/formats   - Metadata query");
    log::info!("  /api/download  - Job submission");
    log::info!("  {}/*    - Artifacts", config::server::DOWNLOAD_ROUTE);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// GET /ws: Upgrades and attaches the socket to a new session.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.sessions))
}

async fn handle_socket(socket: WebSocket, sessions: Arc<SessionRegistry>) {
    let (session_id, mut rx) = sessions.register();
    log::info!("WebSocket connected: session {}", session_id);

    let (mut sink, mut stream) = socket.split();

    let sender_session = session_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if sink.send(Message::Text(notification.to_json().into())).await.is_err() {
                log::debug!("WebSocket sink closed for session {}", sender_session);
                break;
            }
        }
    });

    // The channel is server → client only; inbound frames are drained until close.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("WebSocket receive error for session {}: {}", session_id, e);
                break;
            }
        }
    }

    sessions.unregister(&session_id);
    send_task.abort();
    log::info!("WebSocket disconnected: session {}", session_id);
}

#[derive(Debug, Deserialize)]
struct FormatsRequest {
    #[serde(default)]
    url: Option<Value>,
}

/// Unreadable bodies (not JSON, not an object) are reported like any other invalid field.
fn rejected_body(rejection: JsonRejection) -> Response {
    log::debug!("Rejected request body: {}", rejection.body_text());
    AppError::Validation(vec!["body".to_string()]).into_response()
}

/// POST /api/formats: Synchronous metadata query.
async fn formats_handler(State(state): State<AppState>, body: Result<Json<FormatsRequest>, JsonRejection>) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return rejected_body(rejection),
    };
    let Some(url) = body
        .url
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
    else {
        return AppError::Validation(vec!["url".to_string()]).into_response();
    };

    match fetch_formats(state.runner.as_ref(), &state.ytdl_bin, &url).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/download: Validates and acknowledges; the job continues in the background.
async fn download_handler(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJobPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejected_body(rejection),
    };
    match state.orchestrator.submit(payload) {
        Ok(_handle) => (StatusCode::ACCEPTED, Json(json!({ "message": "Download started" }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /health: Simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
