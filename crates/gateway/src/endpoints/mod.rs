//! # Gatewayエンドポイント
//!
//! - `POST /upload`: ファイルをB2へ中継し公開URLを返す
//! - `GET /health`: 死活監視

pub mod health;
pub mod upload;

pub use health::handle_health;
pub use upload::handle_upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayState;

/// Gatewayのルーターを構築する。
///
/// `/upload` はリクエストボディの上限を無効化する。
pub fn router(state: Arc<GatewayState>) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route(
            "/upload",
            post(handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
