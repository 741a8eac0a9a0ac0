//! スコープの origin / locale 継承
//!
//! スコープは `{origin?, locale?, parent?}` を持つ明示的なオブジェクトで、
//! 解決は親チェーンをたどります。自分の値があればそれが勝ち、なければ
//! 最も近い祖先の値を使います。暗黙のグローバル参照はありません。

use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

/// 1 つの論理スコープ
///
/// origin と locale は独立に上書きでき、上書きしなかった方は親から
/// 継承します。値は後から変更でき、継承している子スコープからも
/// 変更後の値が見えます。
#[derive(Debug, Default)]
pub struct Scope {
    /// このスコープ自身の origin 上書き
    origin: RwLock<Option<String>>,
    /// このスコープ自身の locale 上書き
    locale: RwLock<Option<String>>,
    /// 親スコープ
    parent: Option<Arc<Scope>>,
}

impl Scope {
    /// ルートスコープを作成
    #[must_use]
    pub fn new(origin: Option<String>, locale: Option<String>) -> Self {
        Self { origin: RwLock::new(origin), locale: RwLock::new(locale), parent: None }
    }

    /// 親を持つスコープを作成
    #[must_use]
    pub fn child_of(parent: Arc<Self>, origin: Option<String>, locale: Option<String>) -> Self {
        Self { origin: RwLock::new(origin), locale: RwLock::new(locale), parent: Some(parent) }
    }

    /// origin の上書きを変更
    pub fn set_origin(&self, origin: Option<String>) {
        *self.origin.write().unwrap_or_else(PoisonError::into_inner) = origin;
    }

    /// locale の上書きを変更
    pub fn set_locale(&self, locale: Option<String>) {
        *self.locale.write().unwrap_or_else(PoisonError::into_inner) = locale;
    }

    /// 親チェーンをたどって origin を解決
    #[must_use]
    pub fn resolve_origin(&self) -> Option<String> {
        let own = self.origin.read().unwrap_or_else(PoisonError::into_inner).clone();
        own.or_else(|| self.parent.as_ref().and_then(|parent| parent.resolve_origin()))
    }

    /// 親チェーンをたどって locale を解決
    #[must_use]
    pub fn resolve_locale(&self) -> Option<String> {
        let own = self.locale.read().unwrap_or_else(PoisonError::into_inner).clone();
        own.or_else(|| self.parent.as_ref().and_then(|parent| parent.resolve_locale()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    /// 自分の値が親より優先される
    #[rstest]
    fn own_value_wins() {
        let root = Arc::new(Scope::new(Some("site".to_string()), Some("en".to_string())));
        let child = Scope::child_of(Arc::clone(&root), Some("page".to_string()), None);

        assert_that!(child.resolve_origin(), some(eq("page")));
        assert_that!(child.resolve_locale(), some(eq("en")));
    }

    /// 未設定の値は最も近い祖先から継承する
    #[rstest]
    fn inherits_from_nearest_ancestor() {
        let root = Arc::new(Scope::new(Some("site".to_string()), Some("en".to_string())));
        let middle =
            Arc::new(Scope::child_of(Arc::clone(&root), None, Some("no".to_string())));
        let leaf = Scope::child_of(Arc::clone(&middle), None, None);

        assert_that!(leaf.resolve_origin(), some(eq("site")));
        assert_that!(leaf.resolve_locale(), some(eq("no")));
    }

    /// 親の変更は継承している子からも見える
    #[rstest]
    fn parent_changes_are_visible() {
        let root = Arc::new(Scope::new(None, Some("en".to_string())));
        let child = Scope::child_of(Arc::clone(&root), None, None);

        root.set_locale(Some("no".to_string()));

        assert_that!(child.resolve_locale(), some(eq("no")));
    }

    /// どこにも値がなければ None
    #[rstest]
    fn unset_everywhere_is_none() {
        let scope = Scope::new(None, None);

        assert_that!(scope.resolve_origin(), none());
        assert_that!(scope.resolve_locale(), none());
    }
}
