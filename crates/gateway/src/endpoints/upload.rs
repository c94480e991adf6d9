//! # POST /upload
//!
//! multipartの `file` フィールドを受け取り、B2へ中継して公開URLを返す。

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use b2relay_types::UploadResponse;

use crate::config::GatewayState;
use crate::coordinator::UploadRequest;
use crate::error::GatewayError;

/// ファイルを運ぶmultipartフィールド名
pub const FILE_FIELD: &str = "file";

/// POST /upload: ファイルをB2へアップロードする。
///
/// multipartでないリクエストや `file` フィールドが無いリクエストは、
/// 空のアップロード要求として扱い `400 No file uploaded` となる。
/// クライアントが切断するとこのFutureごと破棄され、B2への送信も中断される。
pub async fn handle_upload(
    State(state): State<Arc<GatewayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, GatewayError> {
    let request = match multipart {
        Ok(multipart) => read_upload_request(multipart).await?,
        Err(rejection) => {
            tracing::debug!(%rejection, "multipartではないリクエスト");
            UploadRequest::default()
        }
    };

    let uploaded = state
        .coordinator
        .handle_upload(request)
        .await
        .inspect_err(|e| tracing::warn!(status = %e.status_code(), error = %e, "アップロード失敗"))?;

    tracing::debug!(file_name = %uploaded.file_name, url = %uploaded.url, "公開URLを返却");
    Ok(Json(UploadResponse { url: uploaded.url }))
}

/// multipartから `file` フィールドを読み取る。それ以外のフィールドは読み飛ばす。
async fn read_upload_request(mut multipart: Multipart) -> Result<UploadRequest, GatewayError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        let declared_mime_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| GatewayError::BadRequest(e.body_text()))?;

        return Ok(UploadRequest {
            bytes,
            original_name,
            declared_mime_type,
        });
    }

    Ok(UploadRequest::default())
}
