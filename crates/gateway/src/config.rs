//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::b2::{SessionAuthority, UploadEndpointBroker};
use crate::coordinator::UploadCoordinator;

/// B2 APIのデフォルトベースURL
pub const DEFAULT_API_BASE: &str = "https://api.backblazeb2.com";

/// 公開ファイル配信ホストのデフォルト
pub const DEFAULT_DOWNLOAD_HOST: &str = "https://f000.backblazeb2.com";

/// アカウント認可のデフォルトTTL（45分）
pub const DEFAULT_AUTH_TTL: Duration = Duration::from_secs(45 * 60);

/// B2アカウントの認証情報。
///
/// `Debug` 出力ではアプリケーションキーを伏せる。
#[derive(Clone)]
pub struct B2Credentials {
    /// アカウントキーID
    pub key_id: String,
    /// アプリケーションキー
    pub application_key: String,
}

impl fmt::Debug for B2Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("B2Credentials")
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .finish()
    }
}

/// Gatewayの設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// B2アカウント認証情報
    pub credentials: B2Credentials,
    /// アップロード先バケットID
    pub bucket_id: String,
    /// アップロード先バケット名（公開URLに使用）
    pub bucket_name: String,
    /// 待ち受けポート
    pub port: u16,
    /// `b2_authorize_account` を呼び出すベースURL
    pub api_base: String,
    /// 公開ファイル配信ホスト
    pub download_host: reqwest::Url,
    /// アカウント認可の有効期間
    pub auth_ttl: Duration,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    ///
    /// `KEY_ID`, `APP_KEY`, `BUCKET_ID`, `BUCKET_NAME` は必須。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数参照関数から構築する。
    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow::anyhow!("{name}が設定されていません"))
        };

        let credentials = B2Credentials {
            key_id: required("KEY_ID")?,
            application_key: required("APP_KEY")?,
        };
        let bucket_id = required("BUCKET_ID")?;
        let bucket_name = required("BUCKET_NAME")?;

        let port = match lookup("PORT").filter(|p| !p.is_empty()) {
            Some(p) => p
                .parse::<u16>()
                .with_context(|| format!("PORTが不正です: {p}"))?,
            None => 3000,
        };

        let api_base = lookup("B2_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let download_host_raw =
            lookup("B2_DOWNLOAD_HOST").unwrap_or_else(|| DEFAULT_DOWNLOAD_HOST.to_string());
        let download_host = reqwest::Url::parse(&download_host_raw)
            .with_context(|| format!("B2_DOWNLOAD_HOSTが不正です: {download_host_raw}"))?;
        if download_host.cannot_be_a_base() {
            anyhow::bail!("B2_DOWNLOAD_HOSTはベースURLである必要があります: {download_host_raw}");
        }

        let auth_ttl = match lookup("B2_AUTH_TTL_SECS") {
            Some(s) => Duration::from_secs(
                s.parse::<u64>()
                    .with_context(|| format!("B2_AUTH_TTL_SECSが不正です: {s}"))?,
            ),
            None => DEFAULT_AUTH_TTL,
        };

        Ok(Self {
            credentials,
            bucket_id,
            bucket_name,
            port,
            api_base,
            download_host,
            auth_ttl,
        })
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// アップロード処理のオーケストレーション
    pub coordinator: UploadCoordinator,
}

impl GatewayState {
    /// 設定とHTTPクライアントから共有状態を組み立てる。
    ///
    /// セッションキャッシュはプロセス全体で1つだけ生成される。
    pub fn new(config: &GatewayConfig, http_client: reqwest::Client) -> Self {
        let session = Arc::new(SessionAuthority::new(
            http_client.clone(),
            config.credentials.clone(),
            config.api_base.clone(),
            config.auth_ttl,
        ));
        let broker = UploadEndpointBroker::new(http_client.clone(), session);
        let coordinator = UploadCoordinator::new(
            broker,
            http_client,
            config.bucket_id.clone(),
            config.bucket_name.clone(),
            config.download_host.clone(),
        );
        Self { coordinator }
    }
}
