//! # B2 Relay Gateway
//!
//! クライアントからのファイルアップロードを受け取り、
//! Backblaze B2へ中継して公開URLを返すGateway。
//!
//! ## 役割
//! - B2アカウント認可のキャッシュ（TTL 45分）
//! - アップロードごとの単回使用アップロードURLの取得
//! - SHA-1計算と一意な保存オブジェクト名の生成
//! - B2へのアップロードと上流エラーのクライアントへの変換
//!
//! ## API エンドポイント
//! - `POST /upload`: multipartの `file` フィールドをアップロード
//! - `GET /health`: 死活監視

mod b2;
mod config;
mod coordinator;
mod endpoints;
mod error;
mod naming;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .envは任意
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "b2relay_gateway=info,tower_http=info".into()),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        bucket_name = %config.bucket_name,
        api_base = %config.api_base,
        download_host = %config.download_host,
        auth_ttl_secs = config.auth_ttl.as_secs(),
        "設定を読み込みました"
    );

    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|e| anyhow::anyhow!("HTTPクライアントの構築に失敗: {e}"))?;

    let state = Arc::new(GatewayState::new(&config, http_client));
    let app = endpoints::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
