//! 文字列テンプレートの展開
//!
//! `{{variable}}` プレースホルダーの置換と、`[[[...]]]` で注釈された
//! デフォルトテキストの取り出しを行います。副作用のない純粋な関数のみです。

use std::collections::HashMap;

/// プレースホルダー名から値へのマップ
pub type TemplateVariables = HashMap<String, String>;

/// プレースホルダー識別子に使える文字か判定（`[\w.]`）
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// `{{identifier}}` を `variables` の値で置換
///
/// 識別子は `[\w.]+` にマッチするものだけを認識します。対応する値が
/// 存在しないプレースホルダーは空文字列に置き換えます。未定義の変数が
/// あってもエラーにはなりません。
///
/// ```
/// use i18n_translate_client::template::template;
///
/// let mut variables = std::collections::HashMap::new();
/// variables.insert("name".to_string(), "Pedro".to_string());
/// assert_eq!(template("Hello, {{name}}!", &variables), "Hello, Pedro!");
/// ```
#[must_use]
pub fn template(input: &str, variables: &TemplateVariables) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);
        output.push_str(before);

        let (_, body) = tail.split_at(2);
        let identifier_length: usize =
            body.chars().take_while(|c| is_identifier_char(*c)).map(char::len_utf8).sum();
        let (identifier, after_identifier) = body.split_at(identifier_length);

        if identifier_length > 0 && after_identifier.starts_with("}}") {
            if let Some(value) = variables.get(identifier) {
                output.push_str(value);
            }

            (_, rest) = after_identifier.split_at(2);
        } else {
            // プレースホルダーとして成立しないので `{{` を本文として扱う
            output.push_str("{{");
            rest = body;
        }
    }

    output.push_str(rest);
    output
}

/// `[[[` と `]]]` のマーカーを取り除き、中身だけを残す
///
/// 翻訳がまだ存在しないときに原文をそのまま表示するための処理です。
///
/// ```
/// use i18n_translate_client::template::patch_default_string;
///
/// assert_eq!(patch_default_string("Hello, [[[Pedro]]]!"), "Hello, Pedro!");
/// ```
#[must_use]
pub fn patch_default_string(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("[[[") {
        let (before, tail) = rest.split_at(start);
        let (_, body) = tail.split_at(3);

        let Some(inner_length) = body.find("]]]") else {
            // 閉じマーカーがなければそのまま残す
            break;
        };

        output.push_str(before);
        let (inner, after_inner) = body.split_at(inner_length);
        output.push_str(inner);
        (_, rest) = after_inner.split_at(3);
    }

    output.push_str(rest);
    output
}

/// プレースホルダーをデフォルト値マーカーで包む
///
/// `{{name}}` を `[[[{{name}}]]]` に書き換えます。変数を持つ原文を
/// 翻訳リクエストに送る前に適用することで、翻訳が未到着でも
/// [`patch_default_string`] がプレースホルダーを復元できます。
#[must_use]
pub fn guard_template_variables(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let (before, tail) = rest.split_at(start);
        output.push_str(before);

        let (_, body) = tail.split_at(2);
        let inner_length: usize = body
            .chars()
            .take_while(|c| is_identifier_char(*c) || *c == ' ')
            .map(char::len_utf8)
            .sum();
        let (inner, after_inner) = body.split_at(inner_length);

        if inner.trim().is_empty() || !after_inner.starts_with("}}") {
            output.push_str("{{");
            rest = body;
            continue;
        }

        output.push_str("[[[{{");
        output.push_str(inner);
        output.push_str("}}]]]");
        (_, rest) = after_inner.split_at(2);
    }

    output.push_str(rest);
    output
}
