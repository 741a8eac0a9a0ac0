//! 既知のエントリー集合の先行翻訳
//!
//! サーバーレンダリングや静的生成のように、描画前にエントリーが
//! 分かっている場合の取得ヘルパーです。ページ単位の先行取得は
//! 失敗を握りつぶさず、呼び出し元にエラーを返します。

use futures::future::join_all;

use crate::client::{
    ClientError,
    GetTranslationsOptions,
    TranslationApi,
};
use crate::entry::Entry;
use crate::store::{
    self,
    Localizations,
    Translations,
};
use crate::template::{
    TemplateVariables,
    patch_default_string,
    template,
};

/// 先行取得した翻訳の解決ビュー
///
/// [`translate_entries`] の結果で、エントリーから翻訳済み文字列を
/// 引きます。翻訳が見つからないエントリーはデフォルト値マーカーを
/// 取り除いた原文にフォールバックします。
#[derive(Debug, Clone)]
pub struct Translated {
    /// 取得済みの翻訳マップ
    translations: Translations,
}

impl Translated {
    /// エントリーの翻訳を取得
    #[must_use]
    pub fn get(&self, entry: &Entry) -> String {
        self.get_by_key(&entry.key(), &entry.string)
    }

    /// 変数を適用しつつエントリーの翻訳を取得
    #[must_use]
    pub fn get_with_variables(&self, entry: &Entry, variables: &TemplateVariables) -> String {
        template(&self.get(entry), variables)
    }

    /// 導出済みのキーで翻訳を取得
    fn get_by_key(&self, key: &str, source: &str) -> String {
        self.translations
            .get(key)
            .cloned()
            .unwrap_or_else(|| patch_default_string(source))
    }

    /// 取得済みの翻訳マップを参照
    #[must_use]
    pub const fn translations(&self) -> &Translations {
        &self.translations
    }
}

/// エントリー集合をまとめて翻訳
///
/// # Errors
/// 取得に失敗した場合。先行取得は寛容モードを使いません。
pub async fn translate_entries<C: TranslationApi>(
    client: &C,
    origin: impl Into<String>,
    locale: impl Into<String>,
    entries: Vec<Entry>,
) -> Result<Translated, ClientError> {
    let translations = client
        .get_translations(GetTranslationsOptions {
            locale: locale.into(),
            origin: Some(origin.into()),
            entries: Some(entries),
            timeout: None,
            throw_on_error: true,
        })
        .await?;

    Ok(Translated { translations })
}

/// 複数 origin の保存済み翻訳をまとめて取得
///
/// origin ごとのリクエストは同時に送出され、結果はセッションに
/// シードとして渡せる [`Localizations`] に組み立てられます。
///
/// # Errors
/// いずれかの origin の取得に失敗した場合。
pub async fn get_localizations<C: TranslationApi>(
    client: &C,
    locale: impl Into<String>,
    origins: &[String],
) -> Result<Localizations, ClientError> {
    let locale = locale.into();

    let fetches = origins.iter().map(|origin| {
        let locale = locale.clone();
        async move {
            let translations = client
                .get_translations(GetTranslationsOptions {
                    locale,
                    origin: Some(origin.clone()),
                    entries: None,
                    timeout: None,
                    throw_on_error: true,
                })
                .await?;
            Ok::<(String, Translations), ClientError>((origin.clone(), translations))
        }
    });

    let mut localizations = Localizations::new();
    for result in join_all(fetches).await {
        let (origin, translations) = result?;
        store::merge_into(&mut localizations, store::from_seed(&origin, &locale, translations));
    }

    Ok(localizations)
}
