//! # B2 Native API クライアント
//!
//! アップロード1件に必要な3つのB2操作のみを扱う。
//! - `session`: `b2_authorize_account` の結果をTTL付きでキャッシュする（SessionAuthority）
//! - `broker`: `b2_get_upload_url` で単回使用のアップロード先を取得する（UploadEndpointBroker）
//! - `upload`: `b2_upload_file` でバイト列を送信する
//!
//! どの操作もリトライしない。失敗はそのまま呼び出し元へ伝播する。

pub mod broker;
pub mod session;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use broker::{UploadEndpointBroker, UploadTarget};
pub use session::SessionAuthority;
pub use upload::{upload_file, UploadFile};

use b2relay_types::B2ErrorBody;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::UpstreamError;

/// B2 Native APIのパス接頭辞
pub(crate) const API_PREFIX: &str = "/b2api/v2";

/// 上流エラーをログに記録してそのまま返す。
pub(crate) fn report(err: UpstreamError) -> UpstreamError {
    tracing::error!(
        operation = err.operation,
        status = ?err.status,
        message = %err.message,
        "B2呼び出しに失敗"
    );
    err
}

/// B2のレスポンスを読み取り、2xxならJSONとしてパースする。
///
/// 非2xxの場合は上流ステータスとエラーボディから `UpstreamError` を構築する。
pub(crate) async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<T, UpstreamError> {
    let body = read_success_body(operation, response).await?;
    serde_json::from_str(&body).map_err(|e| {
        report(UpstreamError {
            operation,
            status: None,
            message: format!("レスポンスのパースに失敗: {e}"),
        })
    })
}

/// B2のレスポンス本文を読み取る。非2xxは `UpstreamError` になる。
pub(crate) async fn read_success_body(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<String, UpstreamError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        report(UpstreamError {
            operation,
            status: (!status.is_success()).then_some(status.as_u16()),
            message: format!("レスポンス読み取り失敗: {e}"),
        })
    })?;

    if !status.is_success() {
        return Err(report(UpstreamError {
            operation,
            status: Some(status.as_u16()),
            message: error_message(status, &body),
        }));
    }
    Ok(body)
}

/// エラーボディからクライアント向けメッセージを取り出す。
///
/// B2形式のJSONなら `message`（空なら `code`）、それ以外は本文そのもの。
/// 本文が空の場合はステータスの説明文を使う。
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<B2ErrorBody>(body) {
        if !parsed.message.is_empty() {
            return parsed.message;
        }
        if !parsed.code.is_empty() {
            return parsed.code;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
