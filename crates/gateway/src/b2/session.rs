//! # SessionAuthority
//!
//! `b2_authorize_account` で得たアカウント単位の認可（APIベースURL + トークン）を
//! TTL付きでキャッシュする。
//!
//! - キャッシュはプロセス全体で1つ。同一TTL内の全リクエストが同じSessionを参照する。
//! - Sessionは部分的に更新されない。更新成功時に丸ごと差し替える。
//! - 更新に失敗した場合、既存のSessionには触れずにエラーを返す。
//! - 更新はstaleを観測した呼び出し元のみが `refresh_lock` で直列化する。
//!   新鮮なSessionの読み取りは `refresh_lock` を待たない。

use std::sync::Arc;
use std::time::{Duration, Instant};

use b2relay_types::AuthorizeAccountResponse;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use tokio::sync::{Mutex, RwLock};

use super::{read_json, report, API_PREFIX};
use crate::config::B2Credentials;
use crate::error::{GatewayError, UpstreamError};

const OPERATION: &str = "b2_authorize_account";

/// キャッシュされたアカウント認可。
pub struct Session {
    /// 以降のAPI呼び出しに使用するベースURL（末尾スラッシュなし）
    pub api_url: String,
    /// アカウント認可トークン
    pub authorization_token: String,
    /// 取得時刻
    pub fetched_at: Instant,
}

impl Session {
    /// `now` 時点でTTL内かどうか。経過時間がTTL以上ならstale。
    pub fn is_fresh_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }
}

/// アカウント認可のキャッシュと更新を担う。
pub struct SessionAuthority {
    http_client: reqwest::Client,
    credentials: B2Credentials,
    /// `b2_authorize_account` のベースURL
    api_base: String,
    ttl: Duration,
    current: RwLock<Option<Arc<Session>>>,
    refresh_lock: Mutex<()>,
}

impl SessionAuthority {
    pub fn new(
        http_client: reqwest::Client,
        credentials: B2Credentials,
        api_base: String,
        ttl: Duration,
    ) -> Self {
        Self {
            http_client,
            credentials,
            api_base,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// 有効なSessionを返す。未取得またはstaleの場合は認可を更新する。
    pub async fn get_session(&self) -> Result<Arc<Session>, GatewayError> {
        if let Some(session) = self.fresh_session().await {
            return Ok(session);
        }

        let _guard = self.refresh_lock.lock().await;
        // 待機中に他の呼び出し元が更新済みならそれを使う
        if let Some(session) = self.fresh_session().await {
            return Ok(session);
        }

        let session = Arc::new(self.authorize().await.map_err(GatewayError::Auth)?);
        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    /// 鮮度に関係なく現在キャッシュされているSession。
    #[cfg(test)]
    pub async fn cached_session(&self) -> Option<Arc<Session>> {
        self.current.read().await.clone()
    }

    async fn fresh_session(&self) -> Option<Arc<Session>> {
        let now = Instant::now();
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| s.is_fresh_at(now, self.ttl))
            .cloned()
    }

    /// `b2_authorize_account` を呼び出して新しいSessionを構築する。
    async fn authorize(&self) -> Result<Session, UpstreamError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.credentials.key_id, self.credentials.application_key
        ));
        let url = format!("{}{API_PREFIX}/{OPERATION}", self.api_base);

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("Basic {encoded}"))
            .send()
            .await
            .map_err(|e| report(UpstreamError::transport(OPERATION, &e)))?;

        let body: AuthorizeAccountResponse = read_json(OPERATION, response).await?;
        tracing::info!(
            account_id = %body.account_id,
            api_url = %body.api_url,
            "B2アカウント認可を更新しました"
        );

        Ok(Session {
            api_url: body.api_url.trim_end_matches('/').to_string(),
            authorization_token: body.authorization_token,
            fetched_at: Instant::now(),
        })
    }
}
