//! # b2_upload_file
//!
//! アップロード先にバイト列を1回のリクエストで送信する。
//! 本文サイズの上限は設けない。

use axum::body::Bytes;
use b2relay_types::UploadFileResponse;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::{read_success_body, report, UploadTarget};
use crate::error::UpstreamError;

const OPERATION: &str = "b2_upload_file";

/// 保存するオブジェクト名
const FILE_NAME_HEADER: &str = "X-Bz-File-Name";

/// 本文のSHA-1（16進）
const CONTENT_SHA1_HEADER: &str = "X-Bz-Content-Sha1";

/// 送信するファイル。
pub struct UploadFile<'a> {
    /// 保存オブジェクト名（サニタイズ済み）
    pub file_name: &'a str,
    /// Content-Type
    pub content_type: &'a str,
    /// 本文のSHA-1（16進）
    pub content_sha1: &'a str,
    /// 本文
    pub body: Bytes,
}

/// アップロード先を消費してファイルを送信する。
///
/// 成否は上流のステータスのみで判定する。2xxで本文がパースできない場合も
/// オブジェクトは保存済みなので成功として扱い、空のレスポンスを返す。
pub async fn upload_file(
    http_client: &reqwest::Client,
    target: UploadTarget,
    file: UploadFile<'_>,
) -> Result<UploadFileResponse, UpstreamError> {
    let response = http_client
        .post(&target.upload_url)
        .header(AUTHORIZATION, target.upload_token.as_str())
        .header(FILE_NAME_HEADER, file.file_name)
        .header(CONTENT_TYPE, file.content_type)
        .header(CONTENT_SHA1_HEADER, file.content_sha1)
        .body(file.body)
        .send()
        .await
        .map_err(|e| report(UpstreamError::transport(OPERATION, &e)))?;

    let body = read_success_body(OPERATION, response).await?;
    Ok(serde_json::from_str(&body).unwrap_or_else(|e| {
        tracing::warn!(
            operation = OPERATION,
            file_name = file.file_name,
            error = %e,
            "アップロードレスポンスのパースに失敗（保存済みとして扱う）"
        );
        UploadFileResponse::default()
    }))
}
