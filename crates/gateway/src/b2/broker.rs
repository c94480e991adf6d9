//! # UploadEndpointBroker
//!
//! 有効なSessionを使って `b2_get_upload_url` を呼び出し、
//! バケット単位の単回使用アップロード先を取得する。
//!
//! アップロード先はキャッシュしない。B2は発行済みのアップロードURLを
//! 1回の使用後や短時間で無効化する場合があるため、呼び出しごとに新しく取得する。

use std::sync::Arc;

use b2relay_types::{GetUploadUrlRequest, GetUploadUrlResponse};
use reqwest::header::AUTHORIZATION;

use super::{read_json, report, SessionAuthority, API_PREFIX};
use crate::error::{GatewayError, UpstreamError};

const OPERATION: &str = "b2_get_upload_url";

/// 単回使用のアップロード先。
///
/// `upload_file` に値で渡され、1回のアップロード試行で消費される。
#[derive(Debug)]
pub struct UploadTarget {
    /// アップロードURL
    pub upload_url: String,
    /// アップロードURL専用の認可トークン
    pub upload_token: String,
}

/// アップロード先の取得を担う。
pub struct UploadEndpointBroker {
    http_client: reqwest::Client,
    session: Arc<SessionAuthority>,
}

impl UploadEndpointBroker {
    pub fn new(http_client: reqwest::Client, session: Arc<SessionAuthority>) -> Self {
        Self {
            http_client,
            session,
        }
    }

    /// `bucket_id` 向けのアップロード先を取得する。
    ///
    /// Sessionがstaleなら透過的に更新される。リトライはしない。
    pub async fn get_upload_target(&self, bucket_id: &str) -> Result<UploadTarget, GatewayError> {
        let session = self.session.get_session().await?;
        let url = format!("{}{API_PREFIX}/{OPERATION}", session.api_url);

        let response = self
            .http_client
            .post(&url)
            .header(AUTHORIZATION, session.authorization_token.as_str())
            .json(&GetUploadUrlRequest {
                bucket_id: bucket_id.to_string(),
            })
            .send()
            .await
            .map_err(|e| GatewayError::Broker(report(UpstreamError::transport(OPERATION, &e))))?;

        let body: GetUploadUrlResponse = read_json(OPERATION, response)
            .await
            .map_err(GatewayError::Broker)?;

        Ok(UploadTarget {
            upload_url: body.upload_url,
            upload_token: body.authorization_token,
        })
    }
}
