//! クライアントのエラー型

use thiserror::Error;

/// 翻訳クライアントのエラー
///
/// 合流したインフライトリクエストの結果をすべての待機者に配れるよう、
/// `Clone` を実装しています。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Error reported by the translation API, carrying the server's
    /// `code` and `type`
    #[error("Translation API error ({code}): {message}")]
    Api {
        /// サーバーが返したエラーコード（例: "invalid_api_key"）
        code: String,
        /// サーバーが返したエラー種別
        error_type: String,
        /// エラーメッセージ
        message: String,
    },
    /// Error when the HTTP request itself fails
    #[error("Request failed: {0}")]
    Transport(String),
    /// Error when the response envelope cannot be decoded
    #[error("Malformed response envelope: {0}")]
    Envelope(String),
    /// Error when the request URL cannot be built
    #[error("Invalid request URL: {0}")]
    Url(String),
    /// Error when the entry set cannot be serialized
    #[error("Failed to encode entries: {0}")]
    Encode(String),
    /// Error when the request does not settle within the timeout
    #[error("`{operation}` timed out")]
    Timeout {
        /// タイムアウトした操作名
        operation: &'static str,
    },
}
