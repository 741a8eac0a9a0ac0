//! リクエストの構築と送出
//!
//! エントリー集合を URL 長の上限内に収まる 1 つ以上のリクエスト記述子に
//! 詰め込み、同一記述子の同時リクエストを 1 回のネットワーク呼び出しに
//! 合流させます。

use std::collections::{
    HashMap,
    HashSet,
};
use std::sync::{
    LazyLock,
    Mutex,
    MutexGuard,
    PoisonError,
};

use futures::FutureExt;
use futures::future::{
    BoxFuture,
    Shared,
};
use reqwest::Url;
use serde::{
    Deserialize,
    Serialize,
};

use super::error::ClientError;
use crate::entry::Entry;
use crate::settings::ClientSettings;
use crate::store::Translations;

/// エンコード済み URL の最大長
pub(crate) const MAX_URL_LENGTH: usize = 2048;

/// 成功として扱うエラーコード。原文ロケールへの翻訳要求は no-op です。
const LOCALE_IS_SOURCE_LOCALE: &str = "locale_is_source_locale";

/// ワイヤ形式のエントリー
///
/// キーが原文と同じ場合は `i` を省いてバイト数を節約します。
/// サーバー側も `s` をフォールバックキーとして使うため復元可能です。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct WireEntry {
    /// エントリー id（省略可）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<String>,
    /// 原文テキスト
    pub s: String,
}

/// サーバーが返すエラー本体
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    /// エラーメッセージ
    #[serde(default)]
    pub message: String,
    /// エラーコード
    #[serde(default)]
    pub code: String,
    /// エラー種別
    #[serde(default, rename = "type")]
    pub error_type: String,
}

/// `/api/v1/t` のレスポンスエンベロープ
#[derive(Debug, Deserialize)]
pub(crate) struct TranslationsEnvelope {
    /// リクエストが成功したか
    pub success: bool,
    /// 成功時の翻訳マップ
    #[serde(default)]
    pub translations: Option<Translations>,
    /// 成功時でも併記されることのある部分的なエラー
    #[serde(default)]
    pub errors: Option<Vec<ApiErrorBody>>,
    /// 失敗時のエラー
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// `/api/v1/l` のレスポンスエンベロープ
#[derive(Debug, Deserialize)]
pub(crate) struct LocalesEnvelope {
    /// リクエストが成功したか
    pub success: bool,
    /// 成功時のロケール一覧
    #[serde(default)]
    pub locales: Option<Vec<String>>,
    /// 失敗時のエラー
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// 翻訳リクエストのベース URL（`a`, `l`, `o` パラメータまで）を構築
pub(crate) fn translation_base_url(
    settings: &ClientSettings,
    locale: &str,
    origin: Option<&str>,
) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(&settings.api_url).map_err(|error| ClientError::Url(error.to_string()))?;
    url.set_path("/api/v1/t");
    url.query_pairs_mut().append_pair("a", &settings.api_key).append_pair("l", locale);

    if let Some(origin) = origin {
        url.query_pairs_mut().append_pair("o", origin);
    }

    Ok(url)
}

/// ロケール一覧リクエストの URL を構築
pub(crate) fn locales_url(settings: &ClientSettings) -> Result<Url, ClientError> {
    let mut url =
        Url::parse(&settings.api_url).map_err(|error| ClientError::Url(error.to_string()))?;
    url.set_path("/api/v1/l");
    url.query_pairs_mut().append_pair("a", &settings.api_key);
    Ok(url)
}

/// エントリーをワイヤ形式に正規化
///
/// 導出キーで重複を取り除き、`id` が原文と一致するものは `i` を省き、
/// 原文の辞書順に並べます。意味的に同じバッチが常にバイト単位で同じ
/// クエリ文字列になることが、記述子によるインフライト重複排除の前提です。
pub(crate) fn prepare_entries<F>(entries: &[Entry], derive_key: F) -> Vec<WireEntry>
where
    F: Fn(&Entry) -> String,
{
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();

    for entry in entries {
        if !seen.insert(derive_key(entry)) {
            continue;
        }

        let i = match &entry.id {
            Some(id) if *id != entry.string => Some(id.clone()),
            _ => None,
        };

        prepared.push(WireEntry { i, s: entry.string.clone() });
    }

    prepared.sort_by(|a, b| a.s.cmp(&b.s));
    prepared
}

/// `s` パラメータを付与した URL を構築
fn with_entries_param(base: &Url, entries: &[&WireEntry]) -> Result<Url, ClientError> {
    let json =
        serde_json::to_string(entries).map_err(|error| ClientError::Encode(error.to_string()))?;
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("s", &json);
    Ok(url)
}

/// エントリーを URL 長の上限内で貪欲に詰め込み、記述子 URL の列を返す
///
/// 次のエントリーを足したとき上限を超えるものは後続のリクエストに回します。
/// エントリーが空の場合はベース URL のみ（origin 全体の取得）です。
/// 1 件だけで上限を超えるエントリーも必ずどれかのリクエストに含め、
/// 分割が前に進むことを保証します。
pub(crate) fn build_translation_urls(
    base: &Url,
    prepared: Vec<WireEntry>,
) -> Result<Vec<Url>, ClientError> {
    if prepared.is_empty() {
        return Ok(vec![base.clone()]);
    }

    let mut urls = Vec::new();
    let mut remaining = prepared;

    while !remaining.is_empty() {
        let mut included: Vec<WireEntry> = Vec::new();
        let mut excluded: Vec<WireEntry> = Vec::new();

        for entry in remaining {
            let mut candidate: Vec<&WireEntry> = included.iter().collect();
            candidate.push(&entry);
            let attempted = with_entries_param(base, &candidate)?;

            if attempted.as_str().len() < MAX_URL_LENGTH {
                included.push(entry);
            } else {
                excluded.push(entry);
            }
        }

        if included.is_empty() {
            // 単独で上限を超えるエントリー。そのまま送らないと無限ループになる
            if let Some(oversized) = excluded.first() {
                tracing::warn!(
                    length = oversized.s.len(),
                    "Entry exceeds the URL length budget on its own; sending it unsplit"
                );
            }

            let mut iterator = excluded.into_iter();
            included.extend(iterator.next());
            excluded = iterator.collect();
        }

        let chunk: Vec<&WireEntry> = included.iter().collect();
        urls.push(with_entries_param(base, &chunk)?);
        remaining = excluded;
    }

    Ok(urls)
}

/// 翻訳レスポンスのエンベロープを解釈
///
/// `locale_is_source_locale` は失敗ではなく空の翻訳として扱います。
/// 成功時に併記された部分的なエラーはログに残すだけです。
pub(crate) fn translations_from_envelope(
    envelope: TranslationsEnvelope,
) -> Result<Translations, ClientError> {
    if envelope.success {
        if let Some(errors) = envelope.errors {
            for error in errors {
                tracing::warn!(
                    code = %error.code,
                    "Translation API reported a partial error: {}",
                    error.message
                );
            }
        }

        return Ok(envelope.translations.unwrap_or_default());
    }

    let Some(error) = envelope.error else {
        return Err(ClientError::Envelope("Missing error body on failure".to_string()));
    };

    if error.code == LOCALE_IS_SOURCE_LOCALE {
        return Ok(Translations::new());
    }

    Err(ClientError::Api { code: error.code, error_type: error.error_type, message: error.message })
}

/// ロケール一覧レスポンスのエンベロープを解釈
pub(crate) fn locales_from_envelope(envelope: LocalesEnvelope) -> Result<Vec<String>, ClientError> {
    if envelope.success {
        return Ok(envelope.locales.unwrap_or_default());
    }

    let Some(error) = envelope.error else {
        return Err(ClientError::Envelope("Missing error body on failure".to_string()));
    };

    Err(ClientError::Api { code: error.code, error_type: error.error_type, message: error.message })
}

/// 合流可能なフェッチの共有ハンドル
type SharedFetch = Shared<BoxFuture<'static, Result<Translations, ClientError>>>;

/// インフライトリクエストのレジストリ
///
/// 記述子 URL から共有中のフェッチへのプロセス全体のマップです。
/// エントリーはリクエストの送出時に登録され、成否にかかわらず決着した
/// 時点で取り除かれます。
static IN_FLIGHT: LazyLock<Mutex<HashMap<String, SharedFetch>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// レジストリのロックを取得（poison は無視して続行）
fn lock_in_flight() -> MutexGuard<'static, HashMap<String, SharedFetch>> {
    IN_FLIGHT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 現在インフライトな記述子の数（テスト・診断用）
#[must_use]
pub fn in_flight_count() -> usize {
    lock_in_flight().len()
}

/// 記述子 URL 単位でフェッチを合流させる
///
/// 同一記述子のリクエストが既にインフライトであれば、その共有フェッチに
/// 相乗りします。なければ新しいフェッチを登録し、待機者が全員タイムアウト
/// などで離脱しても完了とレジストリの掃除が行われるよう、独立したタスク
/// として走らせます。
pub(crate) fn coalesced_fetch(http: reqwest::Client, url: Url) -> SharedFetch {
    let descriptor = url.as_str().to_string();
    let mut registry = lock_in_flight();

    if let Some(pending) = registry.get(&descriptor) {
        tracing::debug!(descriptor = %descriptor, "Attaching to in-flight request");
        return pending.clone();
    }

    let fetch: SharedFetch = {
        let descriptor = descriptor.clone();
        async move {
            let result = dispatch_translations(&http, url).await;
            // 決着したら必ずレジストリから取り除く
            lock_in_flight().remove(&descriptor);
            result
        }
        .boxed()
        .shared()
    };

    registry.insert(descriptor, fetch.clone());
    drop(registry);
    drop(tokio::spawn(fetch.clone()));

    fetch
}

/// 翻訳リクエストを 1 回送出してエンベロープを解釈
async fn dispatch_translations(
    http: &reqwest::Client,
    url: Url,
) -> Result<Translations, ClientError> {
    tracing::debug!(url = %url, "Fetching translations");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|error| ClientError::Transport(error.to_string()))?;
    let status = response.status();

    let envelope: TranslationsEnvelope = response
        .json()
        .await
        .map_err(|error| ClientError::Envelope(format!("HTTP {status}: {error}")))?;

    translations_from_envelope(envelope)
}

/// ロケール一覧リクエストを 1 回送出してエンベロープを解釈
pub(crate) async fn dispatch_locales(
    http: &reqwest::Client,
    url: Url,
) -> Result<Vec<String>, ClientError> {
    tracing::debug!(url = %url, "Fetching locales");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|error| ClientError::Transport(error.to_string()))?;
    let status = response.status();

    let envelope: LocalesEnvelope = response
        .json()
        .await
        .map_err(|error| ClientError::Envelope(format!("HTTP {status}: {error}")))?;

    locales_from_envelope(envelope)
}
