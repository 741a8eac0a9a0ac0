//! 対応ロケールの静的カタログ
//!
//! カタログに含まれることがロケールの有効性の唯一の基準です。
//! ここにないロケールは動的にも受け付けません。

/// カタログの 1 エントリー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleInfo {
    /// ロケールコード（例: `"en"`, `"pt-pt"`）
    pub code: &'static str,
    /// 表示用の言語名
    pub language: &'static str,
    /// 地域バリアントを除いた基底の言語名（バリアントのないロケールは `None`）
    pub base_language: Option<&'static str>,
}

/// `LocaleInfo` を簡潔に書くためのヘルパー
const fn locale(
    code: &'static str,
    language: &'static str,
    base_language: Option<&'static str>,
) -> LocaleInfo {
    LocaleInfo { code, language, base_language }
}

/// 対応ロケールの一覧
pub const LOCALES: &[LocaleInfo] = &[
    locale("af", "Afrikaans", None),
    locale("sq", "Albanian", None),
    locale("am", "Amharic", None),
    locale("ar", "Arabic", None),
    locale("hy", "Armenian", None),
    locale("az", "Azerbaijani", None),
    locale("bn", "Bengali", None),
    locale("bs", "Bosnian", None),
    locale("bg", "Bulgarian", None),
    locale("ca", "Catalan", None),
    locale("zh", "Chinese (Simplified)", Some("Chinese")),
    locale("zh-tw", "Chinese (Traditional)", Some("Chinese")),
    locale("hr", "Croatian", None),
    locale("cs", "Czech", None),
    locale("da", "Danish", None),
    locale("fa-af", "Dari", None),
    locale("nl", "Dutch", None),
    locale("en", "English", None),
    locale("et", "Estonian", None),
    locale("fa", "Farsi (Persian)", Some("Farsi")),
    locale("tl", "Filipino, Tagalog", Some("Tagalog")),
    locale("fi", "Finnish", None),
    locale("fr", "French", None),
    locale("fr-ca", "French (Canada)", Some("French")),
    locale("ka", "Georgian", None),
    locale("de", "German", None),
    locale("el", "Greek", None),
    locale("gu", "Gujarati", None),
    locale("ht", "Haitian Creole", None),
    locale("ha", "Hausa", None),
    locale("he", "Hebrew", None),
    locale("hi", "Hindi", None),
    locale("hu", "Hungarian", None),
    locale("is", "Icelandic", None),
    locale("id", "Indonesian", None),
    locale("ga", "Irish", None),
    locale("it", "Italian", None),
    locale("ja", "Japanese", None),
    locale("kn", "Kannada", None),
    locale("kk", "Kazakh", None),
    locale("ko", "Korean", None),
    locale("lv", "Latvian", None),
    locale("lt", "Lithuanian", None),
    locale("mk", "Macedonian", None),
    locale("ms", "Malay", None),
    locale("ml", "Malayalam", None),
    locale("mt", "Maltese", None),
    locale("mr", "Marathi", None),
    locale("mn", "Mongolian", None),
    locale("no", "Norwegian (Bokmål)", Some("Norwegian")),
    locale("ps", "Pashto", None),
    locale("pl", "Polish", None),
    locale("pt", "Portuguese (Brazil)", Some("Portuguese")),
    locale("pt-pt", "Portuguese (Portugal)", Some("Portuguese")),
    locale("pa", "Punjabi", None),
    locale("ro", "Romanian", None),
    locale("ru", "Russian", None),
    locale("sr", "Serbian", None),
    locale("si", "Sinhala", None),
    locale("sk", "Slovak", None),
    locale("sl", "Slovenian", None),
    locale("so", "Somali", None),
    locale("es", "Spanish", None),
    locale("es-mx", "Spanish (Mexico)", Some("Spanish")),
    locale("sw", "Swahili", None),
    locale("sv", "Swedish", None),
    locale("ta", "Tamil", None),
    locale("te", "Telugu", None),
    locale("th", "Thai", None),
    locale("tr", "Turkish", None),
    locale("uk", "Ukrainian", None),
    locale("ur", "Urdu", None),
    locale("uz", "Uzbek", None),
    locale("vi", "Vietnamese", None),
    locale("cy", "Welsh", None),
];

/// 右から左に書くロケールのコード
pub const RIGHT_TO_LEFT_LOCALE_CODES: &[&str] = &["ar", "he", "ps", "fa", "ur"];

/// カタログからロケールを検索
#[must_use]
pub fn find_locale(code: &str) -> Option<&'static LocaleInfo> {
    LOCALES.iter().find(|info| info.code == code)
}

/// 対応ロケールのコード一覧
#[must_use]
pub fn locale_codes() -> Vec<String> {
    LOCALES.iter().map(|info| info.code.to_string()).collect()
}

/// カタログに含まれるロケールか判定
#[must_use]
pub fn is_supported_locale(code: &str) -> bool {
    find_locale(code).is_some()
}

/// 表示用の言語名を取得
#[must_use]
pub fn language_name(code: &str) -> Option<&'static str> {
    find_locale(code).map(|info| info.language)
}

/// 基底の言語名を取得（バリアントがなければ表示名と同じ）
#[must_use]
pub fn base_language_name(code: &str) -> Option<&'static str> {
    find_locale(code).map(|info| info.base_language.unwrap_or(info.language))
}

/// 右から左に書くロケールか判定
#[must_use]
pub fn is_right_to_left(code: &str) -> bool {
    RIGHT_TO_LEFT_LOCALE_CODES.contains(&code)
}

/// ロケールに対応する国コードを取得
///
/// 言語コードと国コードが一致しないロケールのみを表で持ち、
/// それ以外はロケールコードをそのまま返します。
#[must_use]
pub fn country_code(code: &str) -> &str {
    match code {
        "af" => "za",
        "am" => "et",
        "ar" => "sa",
        "bn" => "bd",
        "bs" => "ba",
        "ca" => "es",
        "cs" => "cz",
        "cy" => "gb",
        "da" => "dk",
        "el" => "gr",
        "en" => "us",
        "es-mx" => "mx",
        "et" => "ee",
        "fa" => "ir",
        "fa-af" | "ps" => "af",
        "fr-ca" => "ca",
        "ga" => "ie",
        "gu" | "hi" | "kn" | "ml" | "mr" | "pa" | "ta" | "te" => "in",
        "ha" => "ng",
        "he" => "il",
        "hy" => "am",
        "ja" => "jp",
        "ka" => "ge",
        "kk" => "kz",
        "ko" => "kr",
        "ms" => "my",
        "pt" => "br",
        "pt-pt" => "pt",
        "si" => "lk",
        "sl" => "si",
        "sq" => "al",
        "sr" => "rs",
        "sv" => "se",
        "sw" => "ke",
        "tl" => "ph",
        "uk" => "ua",
        "ur" => "pk",
        "vi" => "vn",
        "zh" => "cn",
        "zh-tw" => "tw",
        other => other,
    }
}
