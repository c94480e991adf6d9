//! # GET /health
//!
//! 死活監視用エンドポイント。

use axum::Json;
use b2relay_types::HealthResponse;

/// GET /health: 常に `{"ok":true}` を返す。
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
