//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The assistant is exposed as a small JSON API: one endpoint per turn, one
//! to read a session's transcript, and a health probe.

pub mod chat;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat::send_message))
        .route("/api/chat/{session_id}/history", get(chat::history))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthz_is_ok() {
        assert_eq!(healthz().await, StatusCode::OK);
    }

    #[test]
    fn app_builds_with_test_state() {
        let _router = app(crate::state::test_helpers::test_app_state());
    }
}
