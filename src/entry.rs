//! 翻訳対象のエントリーとキー導出
//!
//! エントリーは翻訳可能なテキストの最小単位です。同じキー・origin・locale を
//! 持つエントリーは同一の翻訳リクエストとして扱われ、重複排除されます。

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// `id` の最大長
const MAX_ID_LENGTH: usize = 50;

/// `string` の最大長
const MAX_STRING_LENGTH: usize = 1500;

/// エントリーのバリデーションエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Error when the id exceeds the maximum length
    #[error("`id` is too long at {length}. Max length is {MAX_ID_LENGTH} characters: `{id}`")]
    IdTooLong {
        /// 対象の id
        id: String,
        /// 実際の長さ
        length: usize,
    },
    /// Error when the id does not match the allowed format
    #[error("`id` format is invalid. Must start with a letter or `_` and contain only letters, digits, `_` or `-`: `{id}`")]
    IdFormat {
        /// 対象の id
        id: String,
    },
    /// Error when the source string exceeds the maximum length
    #[error("`string` is too long at {length}. Max length is {MAX_STRING_LENGTH} characters. Please split the string across multiple entries: `{preview}...`")]
    StringTooLong {
        /// 実際の長さ
        length: usize,
        /// 先頭 100 文字のプレビュー
        preview: String,
    },
}

/// 翻訳対象のテキスト 1 件
///
/// `origin` / `locale` はスコープの設定を上書きするためのオプションです。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// 安定した識別子。設定されている場合、キーは id から導出され、
    /// 元の文字列が変わってもキャッシュ済みの翻訳が無効になりません。
    pub id: Option<String>,
    /// 原文テキスト。`{{variable}}` プレースホルダーや
    /// `[[[...]]]` のデフォルト値マーカーを含むことがあります。
    pub string: String,
    /// このエントリーに限り origin を上書き
    pub origin: Option<String>,
    /// このエントリーに限り locale を上書き
    pub locale: Option<String>,
}

/// `Entry` を生成するための記述
///
/// UI バインディングから渡される形をそのまま受け取り、
/// [`create_entry`] で正規化します。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryDescription {
    /// 安定した識別子（任意）
    pub id: Option<String>,
    /// 原文テキスト
    pub string: String,
}

/// エントリー記述を正規化して [`Entry`] を生成
#[must_use]
pub fn create_entry(description: EntryDescription) -> Entry {
    Entry { id: description.id, string: description.string, origin: None, locale: None }
}

impl Entry {
    /// 原文テキストのみからエントリーを作成
    #[must_use]
    pub fn from_string(string: impl Into<String>) -> Self {
        Self { id: None, string: string.into(), origin: None, locale: None }
    }

    /// id と原文テキストからエントリーを作成
    #[must_use]
    pub fn with_id(id: impl Into<String>, string: impl Into<String>) -> Self {
        Self { id: Some(id.into()), string: string.into(), origin: None, locale: None }
    }

    /// 重複排除とキャッシュ参照に使うキーを導出
    ///
    /// `id` があれば `"{id}:{string}"`、なければ `string` そのものです。
    /// 入力が同じなら常に同じキーを返します。
    ///
    /// id の文法は `:` を許可しないため、生成されるキーが `id` と `string` の
    /// 境界で曖昧になることはありません。独自のキー導出関数を使う場合は
    /// この保証は導出側の責任になります。
    #[must_use]
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => format!("{id}:{}", self.string),
            None => self.string.clone(),
        }
    }

    /// エントリーを検証
    ///
    /// 空の `string` は有効です。
    ///
    /// # Errors
    /// - `id` が長すぎる、または形式が不正
    /// - `string` が長すぎる
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if let Some(id) = &self.id {
            if id.chars().count() > MAX_ID_LENGTH {
                return Err(EntryValidationError::IdTooLong {
                    id: id.clone(),
                    length: id.chars().count(),
                });
            }

            if !is_valid_id(id) {
                return Err(EntryValidationError::IdFormat { id: id.clone() });
            }
        }

        let length = self.string.chars().count();
        if length > MAX_STRING_LENGTH {
            return Err(EntryValidationError::StringTooLong {
                length,
                preview: self.string.chars().take(100).collect(),
            });
        }

        Ok(())
    }
}

/// id が `[A-Za-z_][A-Za-z0-9_-]*` を満たすか判定
fn is_valid_id(id: &str) -> bool {
    let mut chars = id.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
