use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::events::sse_event;
use crate::message::Message;
use crate::ui::Theme;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(api_chat))
        .route("/api/messages", get(api_messages).delete(api_clear))
        .route("/api/state", get(api_state))
        .route("/api/events", get(api_events))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
///
/// Runs until Ctrl-C, then disposes the conversation so open event streams
/// end and the graceful shutdown can complete.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let generator = config.build_generator();
    info!(
        name: "generator.configured",
        word_delay_ms = config.generator.word_delay_ms,
        responses = generator.responses().len(),
        "Response generator configured"
    );

    let state = AppState::new(Arc::clone(&config), Arc::new(generator));
    let store = state.view.store().clone();
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!(name: "server.shutdown", "Shutting down");
            store.dispose();
        })
        .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct IndexQuery {
    #[serde(default)]
    theme: Option<Theme>,
}

/// GET / - The chat page.
async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Html<String> {
    Html(state.view.render(query.theme.unwrap_or_default()))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// False when the message was blank, a reply is still loading or the
    /// conversation is closed.
    accepted: bool,
}

/// POST /api/chat - Send a message; the reply streams over `/api/events`.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    let submission = state
        .view
        .take_submission(&req.message)
        .filter(|text| !text.trim().is_empty() && !state.view.store().is_disposed());
    let accepted = submission.is_some();

    if let Some(text) = submission {
        let view = state.view.clone();
        tokio::spawn(async move {
            if let Err(e) = view.submit(&text).await {
                tracing::warn!(error = %e, "Chat send failed");
            }
        });
    } else {
        tracing::debug!(message_length = req.message.len(), "Chat message not accepted");
    }

    (StatusCode::ACCEPTED, Json(ChatResponse { accepted }))
}

/// GET /api/messages - The conversation so far.
async fn api_messages(State(state): State<AppState>) -> Json<Vec<Message>> {
    Json(state.view.store().messages())
}

/// DELETE /api/messages - Clear the conversation.
async fn api_clear(State(state): State<AppState>) -> StatusCode {
    state.view.store().clear_chat();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
struct StateResponse {
    loading: bool,
    message_count: usize,
}

/// GET /api/state - Loading flag and message count.
async fn api_state(State(state): State<AppState>) -> Json<StateResponse> {
    let store = state.view.store();
    Json(StateResponse {
        loading: store.loading(),
        message_count: store.message_count(),
    })
}

/// GET /api/events - SSE stream of store events.
///
/// Events missed by a lagging client are skipped; the stream ends when the
/// conversation is disposed.
async fn api_events(State(state): State<AppState>) -> Response {
    let rx = state.view.store().subscribe();
    tracing::debug!("Event stream opened");

    let stream = BroadcastStream::new(rx)
        .filter_map(Result::ok)
        .map(|event| Ok::<String, Infallible>(sse_event(&event)));

    build_sse_response(Body::from_stream(stream))
}

/// GET /health
async fn health() -> impl IntoResponse {
    "ok"
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}
