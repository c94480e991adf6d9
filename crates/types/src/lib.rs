//! # B2 Relay 共有型定義
//!
//! Gatewayとストレージプロバイダ（Backblaze B2）の間、および
//! Gatewayとクライアントの間でやり取りされるデータ構造。
//!
//! ## エンコーディング規則
//! - プロバイダ側JSON: camelCase（B2 Native API v2 の形式に従う）
//! - クライアント側JSON: 単一フィールドのオブジェクト（`url` / `error` / `ok`）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// b2_authorize_account
// ---------------------------------------------------------------------------

/// `b2_authorize_account` レスポンス。
///
/// 必要なフィールドのみを定義する。未知のフィールドは無視される。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeAccountResponse {
    /// アカウントID
    #[serde(default)]
    pub account_id: String,
    /// 以降のAPI呼び出しに使用するベースURL
    pub api_url: String,
    /// アカウント単位の認可トークン
    pub authorization_token: String,
}

// ---------------------------------------------------------------------------
// b2_get_upload_url
// ---------------------------------------------------------------------------

/// `b2_get_upload_url` リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlRequest {
    /// アップロード先バケットのID
    pub bucket_id: String,
}

/// `b2_get_upload_url` レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlResponse {
    /// バケットID
    #[serde(default)]
    pub bucket_id: String,
    /// 単回使用のアップロードURL
    pub upload_url: String,
    /// アップロードURL専用の認可トークン
    pub authorization_token: String,
}

// ---------------------------------------------------------------------------
// b2_upload_file
// ---------------------------------------------------------------------------

/// `b2_upload_file` レスポンス。
///
/// 全フィールド省略可。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    /// プロバイダが割り当てたファイルID
    #[serde(default)]
    pub file_id: String,
    /// 保存されたオブジェクト名
    #[serde(default)]
    pub file_name: String,
    /// プロバイダが検証したSHA-1
    #[serde(default)]
    pub content_sha1: Option<String>,
    /// 保存されたバイト数
    #[serde(default)]
    pub content_length: Option<u64>,
}

/// B2 APIのエラーレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct B2ErrorBody {
    /// HTTPステータスコード
    #[serde(default)]
    pub status: Option<u16>,
    /// エラーコード（例: "unauthorized", "bad_request"）
    #[serde(default)]
    pub code: String,
    /// 人間向けのエラーメッセージ
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Gateway クライアント向けレスポンス
// ---------------------------------------------------------------------------

/// POST /upload 成功レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// 公開URL
    pub url: String,
}

/// エラーレスポンス。全エンドポイント共通。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health レスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}
