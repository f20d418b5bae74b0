//! HTTP/WebSocket API for the game server.
//!
//! The API is deliberately small: one health endpoint and one
//! WebSocket route carrying the whole game protocol. The session core
//! stays protocol-agnostic; every wire concern lives here.
//!
//! ## Endpoints
//!
//! ```text
//! GET /health   - Server health status (public)
//! GET /ws       - Game WebSocket connection
//! ```

pub mod websocket;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use heist_holdem::SessionHandle;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Application state shared across handlers and WebSocket connections.
/// Cloned per request; the handle is a cheap channel sender.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
async fn health_check() -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}
