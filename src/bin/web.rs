//! Waypoint HTTP 服务
//!
//! 启动: cargo run --bin waypoint-web --features web
//! 监听地址由 WAYPOINT_WEB_ADDR 指定，默认 0.0.0.0:8000
//!
//! - POST /api/chat            {"session_id"?: "...", "message": "..."} → {"reply", "session_id"}
//! - GET  /api/session/:id     会话快照（槽位、缺失项、日志）
//! - POST /api/session/clear   {"session_id": "..."}
//! - GET  /health

#![cfg(feature = "web")]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use waypoint::config::load_config;
use waypoint::dialogue::EngineSnapshot;
use waypoint::{observability, EngineFactory, SessionManager};

struct AppState {
    sessions: SessionManager,
}

#[derive(Deserialize)]
struct ChatRequest {
    session_id: Option<String>,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
    session_id: String,
}

#[derive(Deserialize)]
struct ClearRequest {
    session_id: String,
}

async fn health() -> &'static str {
    "ok"
}

async fn api_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "message is required".to_string()));
    }

    let session_id = req
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(SessionManager::new_session_id);

    tracing::info!(session = %session_id, "chat request");
    let reply = state.sessions.handle_turn(&session_id, message).await;

    Ok(Json(ChatResponse { reply, session_id }))
}

async fn api_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EngineSnapshot>, StatusCode> {
    state
        .sessions
        .snapshot(&id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn api_session_clear(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearRequest>,
) -> StatusCode {
    if state.sessions.reset(&req.session_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });
    let factory = EngineFactory::from_config(&cfg).context("Failed to configure planner")?;

    let state = Arc::new(AppState {
        sessions: SessionManager::new(factory, cfg.app.session_timeout_secs),
    });

    // 定期清理闲置会话
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            sweeper.sessions.cleanup_expired().await;
        }
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(api_chat))
        .route("/api/session/:id", get(api_session))
        .route("/api/session/clear", post(api_session_clear))
        .with_state(state);

    let addr: SocketAddr = std::env::var("WAYPOINT_WEB_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
        .parse()
        .context("Invalid WAYPOINT_WEB_ADDR")?;
    tracing::info!("Waypoint server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
