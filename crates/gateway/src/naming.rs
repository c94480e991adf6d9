//! # 保存オブジェクト名・ダイジェスト・公開URL
//!
//! 保存オブジェクト名は `<ミリ秒タイムスタンプ>-<12桁16進乱数>-<サニタイズ済み元ファイル名>`。
//! サニタイズ後の名前は `[A-Za-z0-9_.-]` のみで構成されるため、
//! URLパスセグメントとしてもHTTPヘッダ値としてもそのまま使える。

use std::time::{SystemTime, UNIX_EPOCH};

use sha1::{Digest, Sha1};

use crate::error::GatewayError;

/// 元ファイル名が無い場合の名前
pub const DEFAULT_FILE_NAME: &str = "file";

/// Content-Typeが宣言されていない場合のフォールバック
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// 乱数サフィックスのバイト数（16進で12文字）
const RANDOM_SUFFIX_BYTES: usize = 6;

/// 本文のSHA-1を16進文字列で返す。
pub fn content_sha1(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// `[A-Za-z0-9_.-]` 以外の文字を1文字ずつ `_` に置き換える。
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 現在時刻と乱数から一意な保存オブジェクト名を生成する。
pub fn stored_object_name(original_name: Option<&str>) -> Result<String, GatewayError> {
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
        .as_millis();
    let random: [u8; RANDOM_SUFFIX_BYTES] = rand::random();
    Ok(format_stored_name(timestamp_ms, &random, original_name))
}

fn format_stored_name(timestamp_ms: u128, random: &[u8], original_name: Option<&str>) -> String {
    let original = original_name
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);
    format!(
        "{timestamp_ms}-{}-{}",
        hex::encode(random),
        sanitize_file_name(original)
    )
}

/// `<host>/file/<bucket_name>/<file_name>` 形式の公開URLを組み立てる。
///
/// 各セグメントはパーセントエンコードされる。
pub fn public_url(
    download_host: &reqwest::Url,
    bucket_name: &str,
    file_name: &str,
) -> Result<String, GatewayError> {
    let mut url = download_host.clone();
    url.path_segments_mut()
        .map_err(|_| {
            GatewayError::Internal(format!("配信ホストがベースURLではありません: {download_host}"))
        })?
        .pop_if_empty()
        .extend(["file", bucket_name, file_name]);
    Ok(url.into())
}
