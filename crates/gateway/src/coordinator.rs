//! # UploadCoordinator
//!
//! アップロード1件のオーケストレーション。
//!
//! ## 処理順序
//! 1. 検証: 本文が空なら `BadRequest`（上流呼び出しなし）
//! 2. アップロード先の取得（必要ならSessionの更新を伴う）
//! 3. SHA-1の計算
//! 4. 保存オブジェクト名の生成
//! 5. アップロード
//! 6. 公開URLの組み立て
//!
//! どの段階でもリトライしない。呼び出し元が再送すれば新しい名前で独立に処理される。

use axum::body::Bytes;

use crate::b2::{upload_file, UploadEndpointBroker, UploadFile};
use crate::error::GatewayError;
use crate::naming::{self, FALLBACK_CONTENT_TYPE};

/// ファイル未指定時のクライアント向けメッセージ
pub const NO_FILE_UPLOADED: &str = "No file uploaded";

/// 受信したアップロード要求。
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// 本文（ファイル未指定の場合は空）
    pub bytes: Bytes,
    /// クライアントが送った元ファイル名
    pub original_name: Option<String>,
    /// クライアントが宣言したContent-Type
    pub declared_mime_type: Option<String>,
}

/// アップロード成功時の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// 公開URL
    pub url: String,
    /// 保存オブジェクト名
    pub file_name: String,
}

pub type UploadResult = Result<UploadedObject, GatewayError>;

/// アップロード処理のオーケストレーションを担う。
pub struct UploadCoordinator {
    broker: UploadEndpointBroker,
    http_client: reqwest::Client,
    bucket_id: String,
    bucket_name: String,
    download_host: reqwest::Url,
}

impl UploadCoordinator {
    pub fn new(
        broker: UploadEndpointBroker,
        http_client: reqwest::Client,
        bucket_id: String,
        bucket_name: String,
        download_host: reqwest::Url,
    ) -> Self {
        Self {
            broker,
            http_client,
            bucket_id,
            bucket_name,
            download_host,
        }
    }

    /// アップロード1件を処理し、公開URLを返す。
    pub async fn handle_upload(&self, request: UploadRequest) -> UploadResult {
        let UploadRequest {
            bytes,
            original_name,
            declared_mime_type,
        } = request;

        if bytes.is_empty() {
            return Err(GatewayError::BadRequest(NO_FILE_UPLOADED.to_string()));
        }

        let target = self.broker.get_upload_target(&self.bucket_id).await?;

        // 大きな本文でランタイムを塞がないようブロッキングスレッドで計算する
        let content_sha1 = {
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || naming::content_sha1(&bytes))
                .await
                .map_err(|e| GatewayError::Internal(format!("SHA-1計算タスクが失敗: {e}")))?
        };

        let file_name = naming::stored_object_name(original_name.as_deref())?;
        let content_type = declared_mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE);
        let size = bytes.len();

        let uploaded = upload_file(
            &self.http_client,
            target,
            UploadFile {
                file_name: &file_name,
                content_type,
                content_sha1: &content_sha1,
                body: bytes,
            },
        )
        .await
        .map_err(GatewayError::Transport)?;

        let url = naming::public_url(&self.download_host, &self.bucket_name, &file_name)?;
        tracing::info!(
            file_name = %file_name,
            file_id = %uploaded.file_id,
            size,
            content_type,
            "アップロード完了"
        );

        Ok(UploadedObject { url, file_name })
    }
}
