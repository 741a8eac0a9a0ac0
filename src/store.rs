//! origin / locale ごとの翻訳キャッシュ
//!
//! キャッシュは `origin -> locale -> key -> 翻訳済み文字列` の入れ子構造です。
//! バッチレスポンスが届くたびに破壊せずマージされ、既存の翻訳は
//! 新しい値でのみ上書きされます。

use std::collections::HashMap;

/// 1 つの (origin, locale) に対するキーから翻訳へのマップ
pub type Translations = HashMap<String, String>;

/// キャッシュ全体。origin から locale ごとの [`Translations`] へのマップ
pub type Localizations = HashMap<String, HashMap<String, Translations>>;

/// `incoming` を `target` のコピーに深くマージして返す
///
/// origin と locale の階層で再帰的にマージし、葉（翻訳済み文字列）は
/// `incoming` 側が優先されます。どちらの入力も変更しません。
#[must_use]
pub fn merge(target: &Localizations, incoming: &Localizations) -> Localizations {
    let mut merged = target.clone();
    merge_into(&mut merged, incoming.clone());
    merged
}

/// `incoming` を `target` に直接マージ
///
/// マージは加算的で、`incoming` に含まれないキーはそのまま残ります。
pub fn merge_into(target: &mut Localizations, incoming: Localizations) {
    for (origin, locales) in incoming {
        let target_locales = target.entry(origin).or_default();

        for (locale, translations) in locales {
            target_locales.entry(locale).or_default().extend(translations);
        }
    }
}

/// キャッシュから 1 件の翻訳を参照
///
/// origin や locale がまだ存在しないのはエラーではなく、
/// 「未取得」を意味する `None` を返します。
#[must_use]
pub fn get<'a>(
    localizations: &'a Localizations,
    origin: &str,
    locale: &str,
    key: &str,
) -> Option<&'a str> {
    localizations.get(origin)?.get(locale)?.get(key).map(String::as_str)
}

/// 1 つの (origin, locale) に対するフラットなビューを参照
#[must_use]
pub fn translations_for<'a>(
    localizations: &'a Localizations,
    origin: &str,
    locale: &str,
) -> Option<&'a Translations> {
    localizations.get(origin)?.get(locale)
}

/// 事前取得済みの翻訳から初期キャッシュを構築
#[must_use]
pub fn from_seed(origin: &str, locale: &str, translations: Translations) -> Localizations {
    let mut localizations = Localizations::new();
    localizations
        .entry(origin.to_string())
        .or_default()
        .insert(locale.to_string(), translations);
    localizations
}
