//! テスト用ユーティリティ
//!
//! ネットワークを使わない [`TranslationApi`] の代替実装を提供します。
#![cfg(test)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};
use std::time::Duration;

use crate::client::{
    ClientError,
    GetLocalesOptions,
    GetTranslationsOptions,
    TranslationApi,
};
use crate::locale;
use crate::store::Translations;

/// 呼び出しを記録し、決め打ちの翻訳を返すテストダブル
#[derive(Debug, Clone, Default)]
pub(crate) struct MockApi {
    /// どのリクエストにも返す翻訳マップ
    pub translations: Translations,
    /// 受け取った `get_translations` のパラメータ
    pub calls: Arc<Mutex<Vec<GetTranslationsOptions>>>,
    /// レスポンスを遅らせる時間
    pub delay: Option<Duration>,
    /// この locale へのリクエストはエラーにする
    pub fail_locales: HashSet<String>,
}

impl MockApi {
    /// 決め打ちの翻訳を返すモックを作成
    pub(crate) fn with_translations(pairs: &[(&str, &str)]) -> Self {
        Self {
            translations: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Self::default()
        }
    }

    /// 記録された呼び出しのスナップショット
    pub(crate) fn recorded_calls(&self) -> Vec<GetTranslationsOptions> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 記録された呼び出しの数
    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl TranslationApi for MockApi {
    fn get_translations(
        &self,
        options: GetTranslationsOptions,
    ) -> impl Future<Output = Result<Translations, ClientError>> + Send {
        let this = self.clone();
        async move {
            this.calls.lock().unwrap_or_else(PoisonError::into_inner).push(options.clone());

            if let Some(delay) = this.delay {
                tokio::time::sleep(delay).await;
            }

            if this.fail_locales.contains(&options.locale) {
                return Err(ClientError::Transport("mock failure".to_string()));
            }

            Ok(this.translations.clone())
        }
    }

    fn get_locales(
        &self,
        _options: GetLocalesOptions,
    ) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send {
        async { Ok(locale::locale_codes()) }
    }
}
