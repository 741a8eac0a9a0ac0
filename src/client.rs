//! 翻訳 API クライアント
//!
//! 「locale L・origin O のエントリー集合 E を翻訳してほしい」という要求を、
//! URL 長の上限を守った 1 つ以上のネットワーク呼び出しに変換します。
//! 同一の (L, O, E) に対する同時リクエストは 1 回の呼び出しに合流します。

pub mod error;
pub mod locale_cache;
pub mod request;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

pub use error::ClientError;
pub use locale_cache::{
    LOCALE_CACHE_TTL,
    invalidate_locale_cache,
};
pub use request::in_flight_count;

use crate::entry::Entry;
use crate::locale;
use crate::settings::ClientSettings;
use crate::store::Translations;

/// 翻訳取得のデフォルトタイムアウト
pub const DEFAULT_TRANSLATIONS_TIMEOUT: Duration = Duration::from_secs(10);

/// ロケール一覧取得のデフォルトタイムアウト
pub const DEFAULT_LOCALES_TIMEOUT: Duration = Duration::from_secs(2);

/// エントリーからキーを導出する関数
pub type TranslationKeyFn = Arc<dyn Fn(&Entry) -> String + Send + Sync>;

/// 翻訳取得のパラメータ
#[derive(Debug, Clone, Default)]
pub struct GetTranslationsOptions {
    /// 翻訳先ロケール
    pub locale: String,
    /// 名前空間（ページ識別子など）
    pub origin: Option<String>,
    /// 翻訳対象のエントリー。`None` は origin 全体の取得
    pub entries: Option<Vec<Entry>>,
    /// タイムアウト（既定 10 秒）
    pub timeout: Option<Duration>,
    /// エラーを呼び出し元に伝播するか。既定ではエラーを吸収して
    /// 空の結果を返します
    pub throw_on_error: bool,
}

/// ロケール一覧取得のパラメータ
#[derive(Debug, Clone, Copy, Default)]
pub struct GetLocalesOptions {
    /// タイムアウト（既定 2 秒）
    pub timeout: Option<Duration>,
    /// エラーを呼び出し元に伝播するか
    pub throw_on_error: bool,
}

/// セッションが利用するトランスポートの面
///
/// [`TranslateClient`] が標準実装です。テストではネットワークを使わない
/// 代替実装に差し替えられます。キー導出はトランスポート側で上書きできる
/// 多態のポイントです。
pub trait TranslationApi: Send + Sync {
    /// エントリーの重複排除・キャッシュ参照キーを導出（既定は [`Entry::key`]）
    fn translation_key(&self, entry: &Entry) -> String {
        entry.key()
    }

    /// バッチ翻訳を取得
    fn get_translations(
        &self,
        options: GetTranslationsOptions,
    ) -> impl Future<Output = Result<Translations, ClientError>> + Send;

    /// 対応ロケールの一覧を取得
    fn get_locales(
        &self,
        options: GetLocalesOptions,
    ) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send;
}

/// HTTP ベースの翻訳クライアント
#[derive(Clone)]
pub struct TranslateClient {
    /// クライアント設定
    settings: ClientSettings,
    /// 共有の HTTP クライアント
    http: reqwest::Client,
    /// キー導出の上書き
    translation_key_fn: Option<TranslationKeyFn>,
}

impl std::fmt::Debug for TranslateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslateClient")
            .field("api_url", &self.settings.api_url)
            .field("is_enabled", &self.settings.is_enabled)
            .finish_non_exhaustive()
    }
}

impl TranslateClient {
    /// 新しいクライアントを作成
    #[must_use]
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings, http: reqwest::Client::new(), translation_key_fn: None }
    }

    /// キー導出関数を上書き
    ///
    /// 独自の導出を使う場合、`id` と原文の区切りが曖昧にならないことは
    /// 導出側で保証してください。
    #[must_use]
    pub fn with_translation_key(mut self, derive: TranslationKeyFn) -> Self {
        self.translation_key_fn = Some(derive);
        self
    }

    /// 設定を参照
    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// 翻訳取得の本体
    async fn fetch_translations(
        &self,
        options: GetTranslationsOptions,
    ) -> Result<Translations, ClientError> {
        if !self.settings.is_enabled {
            return Ok(Translations::new());
        }

        // 原文ロケールへの翻訳は常にスキップ
        if self.settings.project_locale.as_deref() == Some(options.locale.as_str()) {
            return Ok(Translations::new());
        }

        let base = request::translation_base_url(
            &self.settings,
            &options.locale,
            options.origin.as_deref(),
        )?;
        let prepared = request::prepare_entries(
            options.entries.as_deref().unwrap_or_default(),
            |entry| self.translation_key(entry),
        );
        let urls = request::build_translation_urls(&base, prepared)?;

        let fetches =
            urls.into_iter().map(|url| request::coalesced_fetch(self.http.clone(), url));
        let deadline = options.timeout.unwrap_or(DEFAULT_TRANSLATIONS_TIMEOUT);

        let results = match tokio::time::timeout(deadline, join_all(fetches)).await {
            Ok(results) => results,
            Err(_elapsed) => {
                return Err(ClientError::Timeout { operation: "get_translations" });
            }
        };

        let mut merged = Translations::new();
        for result in results {
            merged.extend(result?);
        }

        Ok(merged)
    }

    /// ロケール一覧取得の本体
    async fn fetch_locales(&self, options: GetLocalesOptions) -> Result<Vec<String>, ClientError> {
        if !self.settings.is_enabled {
            return Ok(locale::locale_codes());
        }

        let url = request::locales_url(&self.settings)?;
        let descriptor = url.as_str().to_string();

        if let Some(cached) = locale_cache::lookup(&descriptor) {
            return Ok(cached);
        }

        let deadline = options.timeout.unwrap_or(DEFAULT_LOCALES_TIMEOUT);
        let locales =
            match tokio::time::timeout(deadline, request::dispatch_locales(&self.http, url)).await
            {
                Ok(result) => result?,
                Err(_elapsed) => {
                    return Err(ClientError::Timeout { operation: "get_locales" });
                }
            };

        locale_cache::insert(&descriptor, locales.clone());
        Ok(locales)
    }

    /// 寛容モードでのロケール一覧フォールバック
    fn fallback_locales(&self) -> Vec<String> {
        self.settings
            .project_locale
            .as_ref()
            .map_or_else(locale::locale_codes, |project_locale| vec![project_locale.clone()])
    }
}

impl TranslationApi for TranslateClient {
    fn translation_key(&self, entry: &Entry) -> String {
        match &self.translation_key_fn {
            Some(derive) => derive(entry),
            None => entry.key(),
        }
    }

    fn get_translations(
        &self,
        options: GetTranslationsOptions,
    ) -> impl Future<Output = Result<Translations, ClientError>> + Send {
        async move {
            let throw_on_error = options.throw_on_error;

            match self.fetch_translations(options).await {
                Ok(translations) => Ok(translations),
                Err(error) if throw_on_error => Err(error),
                Err(error) => {
                    // 寛容モードではエラーを吸収して空の結果にフォールバック
                    tracing::error!(%error, "`get_translations` failed; returning no translations");
                    Ok(Translations::new())
                }
            }
        }
    }

    fn get_locales(
        &self,
        options: GetLocalesOptions,
    ) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send {
        async move {
            match self.fetch_locales(options).await {
                Ok(locales) => Ok(locales),
                Err(error) if options.throw_on_error => Err(error),
                Err(error) => {
                    tracing::error!(%error, "`get_locales` failed; falling back");
                    Ok(self.fallback_locales())
                }
            }
        }
    }
}
