//! # B2テスト用共通ヘルパー
//!
//! session, broker, coordinator, endpointsのテストで共有するモックB2サーバー。
//! 呼び出し回数とアップロード内容を記録する。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;

use crate::config::{B2Credentials, GatewayConfig};

/// テスト用の認証情報
pub fn test_credentials() -> B2Credentials {
    B2Credentials {
        key_id: "test-key-id".to_string(),
        application_key: "test-app-key".to_string(),
    }
}

/// モックB2を向いたテスト用設定
pub fn test_config(mock: &MockB2, auth_ttl: Duration) -> GatewayConfig {
    GatewayConfig {
        credentials: test_credentials(),
        bucket_id: "bucket-id-1".to_string(),
        bucket_name: "relay-bucket".to_string(),
        port: 0,
        api_base: mock.base_url.clone(),
        download_host: reqwest::Url::parse("https://f000.backblazeb2.com").unwrap(),
        auth_ttl,
    }
}

/// モックが受け取ったアップロード1件分の記録
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub upload_id: String,
    pub authorization: String,
    pub file_name: String,
    pub content_type: String,
    pub content_sha1: String,
    pub body: Vec<u8>,
}

/// モックB2サーバーの状態
#[derive(Default)]
pub struct MockB2 {
    pub base_url: String,
    authorize_calls: AtomicUsize,
    upload_url_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    authorize_failure: Mutex<Option<StatusCode>>,
    upload_url_failure: Mutex<Option<StatusCode>>,
    upload_failure: Mutex<Option<StatusCode>>,
    authorize_delay: Mutex<Option<Duration>>,
    garble_upload_response: AtomicBool,
    upload_url_bucket_ids: Mutex<Vec<String>>,
    uploads: Mutex<Vec<RecordedUpload>>,
}

impl MockB2 {
    pub fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn upload_url_calls(&self) -> usize {
        self.upload_url_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.authorize_calls() + self.upload_url_calls() + self.upload_calls()
    }

    pub fn fail_authorize(&self, status: Option<StatusCode>) {
        *self.authorize_failure.lock().unwrap() = status;
    }

    pub fn fail_upload_url(&self, status: Option<StatusCode>) {
        *self.upload_url_failure.lock().unwrap() = status;
    }

    pub fn fail_upload(&self, status: Option<StatusCode>) {
        *self.upload_failure.lock().unwrap() = status;
    }

    pub fn delay_authorize(&self, delay: Duration) {
        *self.authorize_delay.lock().unwrap() = Some(delay);
    }

    /// アップロード成功時に200でJSONでない本文を返す
    pub fn garble_upload_response(&self, garble: bool) {
        self.garble_upload_response.store(garble, Ordering::SeqCst);
    }

    pub fn upload_url_bucket_ids(&self) -> Vec<String> {
        self.upload_url_bucket_ids.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

/// モックB2サーバーを起動する。
pub async fn start_mock_b2() -> Arc<MockB2> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mock = Arc::new(MockB2 {
        base_url: format!("http://127.0.0.1:{port}"),
        ..Default::default()
    });

    let app = axum::Router::new()
        .route(
            "/b2api/v2/b2_authorize_account",
            axum::routing::get(authorize_account),
        )
        .route(
            "/b2api/v2/b2_get_upload_url",
            axum::routing::post(get_upload_url),
        )
        .route(
            "/upload/{upload_id}",
            axum::routing::post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        .with_state(mock.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    mock
}

fn b2_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "status": status.as_u16(),
            "code": code,
            "message": message,
        })),
    )
        .into_response()
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn authorize_account(State(mock): State<Arc<MockB2>>, headers: HeaderMap) -> Response {
    let n = mock.authorize_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let delay = *mock.authorize_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = *mock.authorize_failure.lock().unwrap();
    if let Some(status) = failure {
        return b2_error(status, "unauthorized", "account authorization rejected");
    }

    let creds = test_credentials();
    let expected = format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", creds.key_id, creds.application_key))
    );
    if header_str(&headers, header::AUTHORIZATION.as_str()) != expected {
        return b2_error(StatusCode::UNAUTHORIZED, "bad_auth_token", "bad credentials");
    }

    Json(serde_json::json!({
        "accountId": "test-account",
        "apiUrl": mock.base_url,
        "authorizationToken": format!("account-token-{n}"),
        "downloadUrl": mock.base_url,
    }))
    .into_response()
}

async fn get_upload_url(
    State(mock): State<Arc<MockB2>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let n = mock.upload_url_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if !header_str(&headers, header::AUTHORIZATION.as_str()).starts_with("account-token-") {
        return b2_error(StatusCode::UNAUTHORIZED, "bad_auth_token", "missing account token");
    }

    let failure = *mock.upload_url_failure.lock().unwrap();
    if let Some(status) = failure {
        return b2_error(status, "service_unavailable", "no upload pods available");
    }

    let bucket_id = body
        .get("bucketId")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    mock.upload_url_bucket_ids
        .lock()
        .unwrap()
        .push(bucket_id.clone());

    Json(serde_json::json!({
        "bucketId": bucket_id,
        "uploadUrl": format!("{}/upload/{n}", mock.base_url),
        "authorizationToken": format!("upload-token-{n}"),
    }))
    .into_response()
}

async fn upload_file(
    State(mock): State<Arc<MockB2>>,
    Path(upload_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    mock.upload_calls.fetch_add(1, Ordering::SeqCst);

    let record = RecordedUpload {
        upload_id,
        authorization: header_str(&headers, header::AUTHORIZATION.as_str()),
        file_name: header_str(&headers, "x-bz-file-name"),
        content_type: header_str(&headers, header::CONTENT_TYPE.as_str()),
        content_sha1: header_str(&headers, "x-bz-content-sha1"),
        body: body.to_vec(),
    };
    mock.uploads.lock().unwrap().push(record.clone());

    let failure = *mock.upload_failure.lock().unwrap();
    if let Some(status) = failure {
        return b2_error(status, "bad_request", "sha1 did not match data received");
    }

    if mock.garble_upload_response.load(Ordering::SeqCst) {
        return (StatusCode::OK, "<html>ok</html>").into_response();
    }

    Json(serde_json::json!({
        "fileId": format!("file-{}", record.upload_id),
        "fileName": record.file_name,
        "contentSha1": record.content_sha1,
        "contentLength": record.body.len(),
    }))
    .into_response()
}
