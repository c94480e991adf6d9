//! # Gateway エラー型
//!
//! 上流（B2）のエラーは受信した地点で `UpstreamError` として一度だけ構築され、
//! 以降は変更されずに `UploadCoordinator` まで伝播する。
//! クライアント向けのステータスとメッセージへの変換は `IntoResponse` のみで行う。

use std::fmt;

use axum::http::StatusCode;
use axum::Json;
use b2relay_types::ErrorResponse;

/// 上流呼び出しの失敗内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    /// 失敗したB2操作名（例: "b2_authorize_account"）
    pub operation: &'static str,
    /// 上流が返したHTTPステータス（通信自体に失敗した場合はNone）
    pub status: Option<u16>,
    /// 上流のエラーボディ、またはトランスポートエラーから得たメッセージ
    pub message: String,
}

impl UpstreamError {
    /// 上流からHTTPレスポンスを受け取れなかった場合のエラーを構築する。
    pub fn transport(operation: &'static str, err: &reqwest::Error) -> Self {
        Self {
            operation,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.operation, status, self.message),
            None => write!(f, "{}: {}", self.operation, self.message),
        }
    }
}

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（ファイル未指定、multipart不正）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// アカウント認可に失敗
    #[error("B2アカウント認可に失敗: {0}")]
    Auth(UpstreamError),
    /// アップロードURLの取得に失敗
    #[error("アップロードURL取得に失敗: {0}")]
    Broker(UpstreamError),
    /// アップロード本体の送信に失敗
    #[error("B2へのアップロードに失敗: {0}")]
    Transport(UpstreamError),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    /// クライアントに返すHTTPステータス。
    ///
    /// 上流エラーは上流のステータスをそのまま返し、不明な場合は500とする。
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Auth(e) | GatewayError::Broker(e) | GatewayError::Transport(e) => e
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// クライアントに返すエラーメッセージ。
    pub fn client_message(&self) -> String {
        match self {
            GatewayError::BadRequest(m) | GatewayError::Internal(m) => m.clone(),
            GatewayError::Auth(e) | GatewayError::Broker(e) | GatewayError::Transport(e) => {
                e.message.clone()
            }
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}
