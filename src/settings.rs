//! クライアント設定
//!
//! API の接続情報と動作フラグを保持します。プログラムから直接構築するか、
//! 環境変数から読み込みます。

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use crate::locale;

/// デフォルトの API ベース URL
pub const DEFAULT_API_URL: &str = "https://api.tacotranslate.com";

/// 設定フィールド単位のバリデーションエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid setting '{field_path}': {message}")]
pub struct ValidationError {
    /// 対象フィールド（例: "apiKey"）
    pub field_path: String,
    /// エラー内容
    pub message: String,
}

impl ValidationError {
    /// 新しいバリデーションエラーを作成
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// 設定の読み込み・検証エラー
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Error when one or more fields fail validation
    #[error("Settings validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),
}

/// バリデーションエラーを番号付きで整形
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 翻訳クライアントの設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// API のベース URL
    pub api_url: String,

    /// API キー
    pub api_key: String,

    /// プロジェクトの原文ロケール。このロケールへの翻訳は常にスキップされます。
    pub project_locale: Option<String>,

    /// 無効にするとすべてのネットワーク呼び出しを短絡し、
    /// 静的カタログまたは空の結果を返します。
    pub is_enabled: bool,

    /// エントリーのバリデーション失敗をエラーとして扱うか。
    /// 既定ではデバッグビルドのみ厳格です。
    pub strict_validation: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            project_locale: None,
            is_enabled: true,
            strict_validation: cfg!(debug_assertions),
        }
    }
}

impl ClientSettings {
    /// API キーのみ指定して設定を作成
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    /// 環境変数から設定を読み込む
    ///
    /// - `I18N_TRANSLATE_API_URL`
    /// - `I18N_TRANSLATE_API_KEY`
    /// - `I18N_TRANSLATE_PROJECT_LOCALE`
    /// - `I18N_TRANSLATE_IS_ENABLED`（`"false"` / `"0"` で無効化）
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_url: std::env::var("I18N_TRANSLATE_API_URL").unwrap_or(defaults.api_url),
            api_key: std::env::var("I18N_TRANSLATE_API_KEY").unwrap_or_default(),
            project_locale: std::env::var("I18N_TRANSLATE_PROJECT_LOCALE").ok(),
            is_enabled: std::env::var("I18N_TRANSLATE_IS_ENABLED")
                .map(|value| !matches!(value.as_str(), "false" | "0"))
                .unwrap_or(defaults.is_enabled),
            strict_validation: defaults.strict_validation,
        }
    }

    /// 設定を検証
    ///
    /// # Errors
    /// - `apiKey` が空
    /// - `apiUrl` が URL として不正
    /// - `projectLocale` がカタログ外
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();

        if self.api_key.is_empty() {
            errors.push(ValidationError::new(
                "apiKey",
                "The API key cannot be empty. Get one from the project dashboard",
            ));
        }

        if reqwest::Url::parse(&self.api_url).is_err() {
            errors.push(ValidationError::new(
                "apiUrl",
                format!("Not a valid URL: `{}`", self.api_url),
            ));
        }

        if let Some(project_locale) = &self.project_locale
            && !locale::is_supported_locale(project_locale)
        {
            errors.push(ValidationError::new(
                "projectLocale",
                format!("Unsupported locale code: `{project_locale}`"),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(SettingsError::ValidationErrors(errors)) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    /// new: 既定値で作成される
    #[rstest]
    fn new_uses_defaults() {
        let settings = ClientSettings::new("key");

        assert_that!(settings.api_url, eq(DEFAULT_API_URL));
        assert_that!(settings.api_key, eq("key"));
        assert_that!(settings.is_enabled, eq(true));
        assert_that!(settings.project_locale, none());
    }

    /// validate: 有効な設定
    #[rstest]
    fn validate_valid_settings() {
        let settings = ClientSettings {
            project_locale: Some("en".to_string()),
            ..ClientSettings::new("key")
        };

        assert_that!(settings.validate(), ok(anything()));
    }

    /// validate: 空の API キーはエラー
    #[rstest]
    fn validate_empty_api_key() {
        let settings = ClientSettings::default();

        let result = settings.validate();

        assert_that!(
            result,
            err(matches_pattern!(SettingsError::ValidationErrors(elements_are![all![
                field!(ValidationError.field_path, eq("apiKey")),
                field!(ValidationError.message, contains_substring("cannot be empty"))
            ]])))
        );
    }

    /// validate: 不正な URL とカタログ外ロケールが列挙される
    #[rstest]
    fn validate_collects_all_errors() {
        let settings = ClientSettings {
            api_url: "not a url".to_string(),
            project_locale: Some("xx".to_string()),
            ..ClientSettings::new("key")
        };

        let result = settings.validate();

        assert_that!(
            result,
            err(matches_pattern!(SettingsError::ValidationErrors(elements_are![
                field!(ValidationError.field_path, eq("apiUrl")),
                field!(ValidationError.field_path, eq("projectLocale")),
            ])))
        );
    }

    /// deserialize: camelCase の部分指定
    #[rstest]
    fn deserialize_partial_settings() {
        let json = r#"{"apiKey": "abc", "projectLocale": "en", "isEnabled": false}"#;

        let settings: ClientSettings = serde_json::from_str(json).unwrap();

        assert_that!(settings.api_key, eq("abc"));
        assert_that!(settings.project_locale, some(eq("en")));
        assert_that!(settings.is_enabled, eq(false));
        assert_that!(settings.api_url, eq(DEFAULT_API_URL));
    }
}
