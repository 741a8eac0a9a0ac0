//! セッションコーディネーター
//!
//! レンダリングツリーの 1 スコープ分のオーケストレーションを担います。
//! 描画パスで要求されたエントリーを集め、フラッシュのタイミングで
//! リクエストバッチャーに流し、ロード中・エラー状態を追跡し、
//! エントリーに対する現在の翻訳を公開します。

pub mod scope;

use std::collections::HashSet;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use futures::future::join_all;
use thiserror::Error;

pub use scope::Scope;

use crate::client::{
    ClientError,
    GetTranslationsOptions,
    TranslationApi,
};
use crate::entry::{
    Entry,
    EntryValidationError,
};
use crate::locale;
use crate::store::{
    self,
    Localizations,
    Translations,
};
use crate::template::{
    TemplateVariables,
    guard_template_variables,
    patch_default_string,
    template,
};

/// origin が未指定のときに使う名前空間
pub const DEFAULT_ORIGIN: &str = "*";

/// セッションのエラー
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// フラッシュ中に発生したクライアントエラー
    #[error(transparent)]
    Client(#[from] ClientError),
    /// 厳格モードで検出したエントリーの不備
    #[error(transparent)]
    Validation(#[from] EntryValidationError),
}

/// セッション作成時のパラメータ
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// ルートスコープの origin
    pub origin: Option<String>,
    /// ルートスコープの locale
    pub locale: Option<String>,
    /// (origin, locale) に対する事前取得済みの翻訳シード
    pub translations: Option<Translations>,
    /// 事前取得済みのキャッシュ全体（サーバーレンダリングのハイドレーション用）
    pub localizations: Option<Localizations>,
    /// バリデーションの厳格さ。未指定ならデバッグビルドのみ厳格
    pub strict_validation: Option<bool>,
}

/// スコープの現在の状態のスナップショット
#[derive(Debug, Clone)]
pub struct Ambient {
    /// 解決済みの origin
    pub origin: String,
    /// 確定している locale
    pub locale: Option<String>,
    /// locale に対応する表示用言語名
    pub language: Option<String>,
    /// フラッシュが進行中か
    pub is_loading: bool,
    /// 直近のエラー
    pub error: Option<SessionError>,
    /// 右から左に書くロケールか（カタログから導出）
    pub is_right_to_left: bool,
}

/// [`Session::subscribe`] が返す購読の識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

/// 状態変化の通知を受け取るコールバック
type ObserverFn = Arc<dyn Fn(&Ambient) + Send + Sync>;

/// スコープごとの可変状態
struct ScopeState {
    /// 翻訳待ちのエントリーキュー
    queue: Vec<Entry>,
    /// フラッシュが進行中か
    is_loading: bool,
    /// 直近のエラー
    error: Option<SessionError>,
    /// 解決済みの origin
    current_origin: String,
    /// 確定している locale
    current_locale: Option<String>,
    /// 登録済みのオブザーバー
    observers: Vec<(u64, ObserverFn)>,
    /// 次に払い出すオブザーバー id
    next_observer_id: u64,
}

impl ScopeState {
    /// 初期状態を作成
    fn new(current_origin: String, current_locale: Option<String>) -> Self {
        Self {
            queue: Vec::new(),
            is_loading: false,
            error: None,
            current_origin,
            current_locale,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }
}

/// フラッシュ時のリクエストグループ
///
/// エントリーは個別に origin / locale を上書きできるため、
/// 実効ペアごとにまとめて送ります。
struct FlushGroup {
    /// グループの origin
    origin: String,
    /// グループの locale
    locale: String,
    /// グループ内で重複排除に使ったキー
    keys: HashSet<String>,
    /// 送信するエントリー
    entries: Vec<Entry>,
}

/// 1 つの論理スコープに対するセッション
///
/// 子スコープ（[`Session::child`]）はキャッシュとクライアントを共有し、
/// キュー・ロード状態・エラーは自分専用に持ちます。
pub struct Session<C: TranslationApi> {
    /// トランスポート
    client: Arc<C>,
    /// このセッションのスコープ
    scope: Arc<Scope>,
    /// 共有の翻訳キャッシュ
    localizations: Arc<Mutex<Localizations>>,
    /// スコープごとの状態
    state: Arc<Mutex<ScopeState>>,
    /// バリデーション失敗をエラーとして扱うか
    strict_validation: bool,
}

impl<C: TranslationApi> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scope", &self.scope)
            .field("strict_validation", &self.strict_validation)
            .finish_non_exhaustive()
    }
}

impl<C: TranslationApi> Session<C> {
    /// ルートセッションを作成
    ///
    /// `options.localizations` と `options.translations` の両方が与えられた
    /// 場合は両方ともシードとしてマージされます。
    #[must_use]
    pub fn new(client: C, options: SessionOptions) -> Self {
        let scope = Arc::new(Scope::new(options.origin.clone(), options.locale.clone()));
        let current_origin = options.origin.unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let mut localizations = options.localizations.unwrap_or_default();
        if let (Some(locale), Some(translations)) = (&options.locale, options.translations) {
            store::merge_into(
                &mut localizations,
                store::from_seed(&current_origin, locale, translations),
            );
        }

        let current_locale = scope.resolve_locale();
        Self {
            client: Arc::new(client),
            scope,
            localizations: Arc::new(Mutex::new(localizations)),
            state: Arc::new(Mutex::new(ScopeState::new(current_origin, current_locale))),
            strict_validation: options.strict_validation.unwrap_or(cfg!(debug_assertions)),
        }
    }

    /// 子スコープのセッションを作成
    ///
    /// origin / locale は個別に上書きでき、上書きしなかった方は
    /// このセッションのスコープから継承します。
    #[must_use]
    pub fn child(&self, origin: Option<String>, locale: Option<String>) -> Self {
        let scope = Arc::new(Scope::child_of(Arc::clone(&self.scope), origin, locale));
        let current_origin =
            scope.resolve_origin().unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
        let current_locale = scope.resolve_locale();

        Self {
            client: Arc::clone(&self.client),
            scope,
            localizations: Arc::clone(&self.localizations),
            state: Arc::new(Mutex::new(ScopeState::new(current_origin, current_locale))),
            strict_validation: self.strict_validation,
        }
    }

    /// 状態ロックを取得（poison は無視して続行）
    ///
    /// ロック順序: `state` → `localizations`。両方を取る場合は必ず
    /// この順で取得します。どちらのロックも await をまたぎません。
    fn lock_state(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// キャッシュロックを取得（poison は無視して続行）
    fn lock_localizations(&self) -> MutexGuard<'_, Localizations> {
        self.localizations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// エントリーを解決
    ///
    /// キャッシュ済みの翻訳があればそれを、なければデフォルト値マーカーを
    /// 取り除いた原文を返します。未解決のエントリーは副作用として
    /// ペンディングキューに登録されます。描画パスから呼ばれる前提のため、
    /// 失敗もブロックもしません。
    pub fn resolve(&self, entry: &Entry) -> String {
        self.resolve_inner(entry, None)
    }

    /// 変数つきでエントリーを解決
    ///
    /// 原文のプレースホルダーはキー導出・送信の前にデフォルト値マーカーで
    /// ガードされ、出力に対して [`template`] が適用されます。
    pub fn resolve_with_variables(
        &self,
        entry: &Entry,
        variables: &TemplateVariables,
    ) -> String {
        self.resolve_inner(entry, Some(variables))
    }

    /// resolve の本体
    fn resolve_inner(&self, entry: &Entry, variables: Option<&TemplateVariables>) -> String {
        if let Err(validation_error) = entry.validate() {
            if self.strict_validation {
                tracing::error!(%validation_error, "Rejecting invalid entry");
                {
                    let mut state = self.lock_state();
                    state.error = Some(SessionError::Validation(validation_error));
                }
                self.notify();
                return patch_default_string(&entry.string);
            }

            tracing::warn!(%validation_error, "Entry failed validation; continuing");
        }

        if entry.string.contains("  ") {
            tracing::warn!(
                string = %entry.string,
                "Detected a string with multiple spaces. This may lead to unintentional side effects in the translation"
            );
        }

        let mut effective = entry.clone();
        if variables.is_some() {
            effective.string = guard_template_variables(&entry.string);
        }

        let key = self.client.translation_key(&effective);
        let translation = {
            let state = self.lock_state();
            let origin = effective.origin.clone().unwrap_or_else(|| state.current_origin.clone());
            let read_locale = effective.locale.clone().or_else(|| state.current_locale.clone());
            drop(state);

            read_locale.and_then(|read_locale| {
                let localizations = self.lock_localizations();
                store::get(&localizations, &origin, &read_locale, &key).map(ToString::to_string)
            })
        };

        let needs_fetch = translation.is_none();
        let output = translation.unwrap_or_else(|| patch_default_string(&effective.string));

        if needs_fetch {
            self.register(effective);
        }

        match variables {
            Some(variables) => template(&output, variables),
            None => output,
        }
    }

    /// エントリーをペンディングキューに登録
    ///
    /// 同じキー・同じ上書きのエントリーが既に並んでいれば何もしません。
    fn register(&self, entry: Entry) {
        let key = self.client.translation_key(&entry);
        let mut state = self.lock_state();

        let already_queued = state.queue.iter().any(|queued| {
            self.client.translation_key(queued) == key
                && queued.origin == entry.origin
                && queued.locale == entry.locale
        });

        if !already_queued {
            state.queue.push(entry);
        }
    }

    /// 翻訳待ちのエントリーがあるか
    #[must_use]
    pub fn has_pending_entries(&self) -> bool {
        !self.lock_state().queue.is_empty()
    }

    /// ペンディングキューをフラッシュ
    ///
    /// キューのスナップショットと掃除は 1 つのロックの中で行うため、
    /// ネットワーク待ちの間に登録されたエントリーは掃除されず、
    /// 次のサイクルに残ります。グループは同時に送出され、各グループの
    /// 結果は届いた順にキャッシュへマージされます（マージは加算的なので
    /// 部分的な反映で一貫性は崩れません）。いずれかのグループが失敗すると
    /// エラーとして記録されますが、成功した兄弟グループの結果は残ります。
    pub async fn flush(&self) -> Result<(), SessionError> {
        let target_locale = self.scope.resolve_locale();

        let groups = {
            let mut state = self.lock_state();

            if state.is_loading {
                return Ok(());
            }

            if state.queue.is_empty() {
                // ペンディングがなければロケールの切り替えは即時
                if state.current_locale != target_locale {
                    state.current_locale = target_locale;
                    drop(state);
                    self.notify();
                }
                return Ok(());
            }

            let Some(target_locale) = target_locale.clone() else {
                // ロケールが決まるまでフラッシュのしようがない
                return Ok(());
            };

            let current_origin = state.current_origin.clone();
            let localizations = self.lock_localizations();
            let mut groups: Vec<FlushGroup> = Vec::new();

            for entry in state.queue.drain(..) {
                let origin = entry.origin.clone().unwrap_or_else(|| current_origin.clone());
                let locale = entry.locale.clone().unwrap_or_else(|| target_locale.clone());
                let key = self.client.translation_key(&entry);

                // 登録後にシードが届いて解決済みになったものはフェッチしない
                if store::get(&localizations, &origin, &locale, &key).is_some() {
                    continue;
                }

                let index = groups
                    .iter()
                    .position(|group| group.origin == origin && group.locale == locale)
                    .unwrap_or_else(|| {
                        groups.push(FlushGroup {
                            origin,
                            locale,
                            keys: HashSet::new(),
                            entries: Vec::new(),
                        });
                        groups.len() - 1
                    });

                if let Some(group) = groups.get_mut(index)
                    && group.keys.insert(key)
                {
                    // 送信用には上書きを剥がす
                    group.entries.push(Entry {
                        id: entry.id,
                        string: entry.string,
                        origin: None,
                        locale: None,
                    });
                }
            }

            drop(localizations);

            if groups.is_empty() {
                // すべてシードで解決済みだった
                if state.current_locale.as_deref() != Some(target_locale.as_str()) {
                    state.current_locale = Some(target_locale);
                    drop(state);
                    self.notify();
                }
                return Ok(());
            }

            state.is_loading = true;
            groups
        };

        self.notify();

        let target_locale = self.scope.resolve_locale();
        let fetches = groups.into_iter().map(|group| {
            let client = Arc::clone(&self.client);
            let localizations = Arc::clone(&self.localizations);

            async move {
                let translations = client
                    .get_translations(GetTranslationsOptions {
                        locale: group.locale.clone(),
                        origin: Some(group.origin.clone()),
                        entries: Some(group.entries),
                        timeout: None,
                        throw_on_error: true,
                    })
                    .await?;

                let incoming = store::from_seed(&group.origin, &group.locale, translations);
                store::merge_into(
                    &mut localizations.lock().unwrap_or_else(PoisonError::into_inner),
                    incoming,
                );
                Ok::<(), ClientError>(())
            }
        });

        let results = join_all(fetches).await;
        let failure = results.into_iter().find_map(Result::err);

        {
            let mut state = self.lock_state();
            state.is_loading = false;

            match &failure {
                Some(error) => {
                    tracing::error!(%error, "Translation flush failed");
                    state.error = Some(SessionError::Client(error.clone()));
                }
                None => {
                    state.error = None;
                    state.current_locale = target_locale;
                }
            }
        }

        self.notify();
        failure.map_or(Ok(()), |error| Err(SessionError::Client(error)))
    }

    /// スコープの locale を変更
    ///
    /// キューが空であれば確定ロケールも即座に切り替わります。
    /// ペンディングがある場合は次のフラッシュ完了時に切り替わります。
    pub fn set_locale(&self, locale: Option<String>) {
        self.scope.set_locale(locale);
        let target_locale = self.scope.resolve_locale();

        let changed = {
            let mut state = self.lock_state();
            if state.queue.is_empty() && state.current_locale != target_locale {
                state.current_locale = target_locale;
                true
            } else {
                false
            }
        };

        if changed {
            self.notify();
        }
    }

    /// スコープの origin を変更（即時反映）
    pub fn set_origin(&self, origin: Option<String>) {
        self.scope.set_origin(origin);
        let resolved =
            self.scope.resolve_origin().unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        let changed = {
            let mut state = self.lock_state();
            if state.current_origin == resolved {
                false
            } else {
                state.current_origin = resolved;
                true
            }
        };

        if changed {
            self.notify();
        }
    }

    /// 外部から届いたシードをキャッシュにマージ
    ///
    /// マウント後に届いたデータも破棄せずマージするため、セッション中の
    /// 帯域外の更新が観測できます。登録済みで未解決のエントリーが
    /// これで解決可能になった場合、次のフラッシュで再フェッチせずに
    /// キューから外れます。
    pub fn merge_localizations(&self, incoming: Localizations) {
        store::merge_into(&mut self.lock_localizations(), incoming);
        self.notify();
    }

    /// キャッシュ全体のスナップショット
    #[must_use]
    pub fn localizations(&self) -> Localizations {
        self.lock_localizations().clone()
    }

    /// 現在の (origin, locale) に対するフラットな翻訳ビュー
    #[must_use]
    pub fn translations(&self) -> Translations {
        let (origin, locale) = {
            let state = self.lock_state();
            (state.current_origin.clone(), state.current_locale.clone())
        };

        let Some(locale) = locale else {
            return Translations::new();
        };

        let localizations = self.lock_localizations();
        store::translations_for(&localizations, &origin, &locale).cloned().unwrap_or_default()
    }

    /// 現在の状態のスナップショット
    #[must_use]
    pub fn ambient(&self) -> Ambient {
        Self::ambient_from(&self.lock_state())
    }

    /// 状態から [`Ambient`] を組み立てる
    fn ambient_from(state: &ScopeState) -> Ambient {
        Ambient {
            origin: state.current_origin.clone(),
            locale: state.current_locale.clone(),
            language: state
                .current_locale
                .as_deref()
                .and_then(locale::language_name)
                .map(ToString::to_string),
            is_loading: state.is_loading,
            error: state.error.clone(),
            is_right_to_left: state
                .current_locale
                .as_deref()
                .is_some_and(locale::is_right_to_left),
        }
    }

    /// 状態変化の通知を購読
    pub fn subscribe(&self, observer: impl Fn(&Ambient) + Send + Sync + 'static) -> ObserverId {
        let mut state = self.lock_state();
        let id = state.next_observer_id;
        state.next_observer_id += 1;
        state.observers.push((id, Arc::new(observer)));
        ObserverId(id)
    }

    /// 購読を解除
    pub fn unsubscribe(&self, id: ObserverId) {
        self.lock_state().observers.retain(|(observer_id, _)| *observer_id != id.0);
    }

    /// 登録済みのオブザーバーへ現在の状態を通知
    ///
    /// コールバックは状態ロックの外で呼びます。
    fn notify(&self) {
        let (ambient, observers) = {
            let state = self.lock_state();
            let observers: Vec<ObserverFn> =
                state.observers.iter().map(|(_, observer)| Arc::clone(observer)).collect();
            (Self::ambient_from(&state), observers)
        };

        for observer in observers {
            observer(&ambient);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::test_utils::MockApi;

    /// テスト用のセッションを作成
    fn session_with(api: MockApi, options: SessionOptions) -> Session<MockApi> {
        Session::new(api, options)
    }

    /// 既定のオプション（origin "test", locale "no"）
    fn options() -> SessionOptions {
        SessionOptions {
            origin: Some("test".to_string()),
            locale: Some("no".to_string()),
            ..SessionOptions::default()
        }
    }

    /// シード済みの翻訳はフェッチなしで解決される
    #[tokio::test]
    async fn cached_translation_avoids_fetch() {
        let api = MockApi::default();
        let session = session_with(
            api.clone(),
            SessionOptions {
                translations: Some(
                    [("Hello, world!".to_string(), "Hallo, verden!".to_string())].into(),
                ),
                ..options()
            },
        );

        let output = session.resolve(&Entry::from_string("Hello, world!"));

        assert_that!(output, eq("Hallo, verden!"));
        assert_that!(session.has_pending_entries(), eq(false));

        session.flush().await.unwrap();
        assert_that!(api.call_count(), eq(0));
    }

    /// 未解決のエントリーは原文で描画され、キューに登録される
    #[tokio::test]
    async fn unresolved_entry_falls_back_and_queues() {
        let api = MockApi::default();
        let session = session_with(api.clone(), options());

        let output = session.resolve(&Entry::from_string("Another [[[string]]]."));

        assert_that!(output, eq("Another string."));
        assert_that!(session.has_pending_entries(), eq(true));

        session.flush().await.unwrap();
        assert_that!(api.call_count(), eq(1));
    }

    /// フラッシュ後は翻訳がキャッシュされ、キューは空になる
    #[tokio::test]
    async fn flush_merges_results() {
        let api = MockApi::with_translations(&[("Hello!", "Hei!")]);
        let session = session_with(api.clone(), options());

        assert_that!(session.resolve(&Entry::from_string("Hello!")), eq("Hello!"));
        session.flush().await.unwrap();

        assert_that!(session.resolve(&Entry::from_string("Hello!")), eq("Hei!"));
        assert_that!(session.has_pending_entries(), eq(false));
        assert_that!(session.ambient().is_loading, eq(false));
    }

    /// エントリー単位の上書きは実効ペアごとのグループになる
    #[tokio::test]
    async fn flush_groups_by_effective_pair() {
        let api = MockApi::default();
        let session = session_with(api.clone(), options());

        session.resolve(&Entry::from_string("Hello!"));
        session.resolve(&Entry {
            locale: Some("de".to_string()),
            ..Entry::from_string("Hello!")
        });
        session.resolve(&Entry {
            origin: Some("other".to_string()),
            ..Entry::from_string("Hello!")
        });

        session.flush().await.unwrap();

        let calls = api.recorded_calls();
        assert_that!(calls, len(eq(3)));

        let pairs: Vec<(String, Option<String>)> =
            calls.iter().map(|call| (call.locale.clone(), call.origin.clone())).collect();
        assert_that!(
            pairs,
            unordered_elements_are![
                eq(&("no".to_string(), Some("test".to_string()))),
                eq(&("de".to_string(), Some("test".to_string()))),
                eq(&("no".to_string(), Some("other".to_string()))),
            ]
        );
    }

    /// フラッシュ中に登録されたエントリーは掃除されず、次のサイクルに残る
    #[tokio::test(start_paused = true)]
    async fn entries_registered_during_flush_survive() {
        let api = MockApi {
            delay: Some(Duration::from_millis(50)),
            ..MockApi::with_translations(&[("Hello!", "Hei!")])
        };
        let session = session_with(api.clone(), options());

        session.resolve(&Entry::from_string("Hello!"));

        let late_registration = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.resolve(&Entry::from_string("Late entry"));
        };

        let (flush_result, ()) = tokio::join!(session.flush(), late_registration);
        flush_result.unwrap();

        assert_that!(session.has_pending_entries(), eq(true));

        session.flush().await.unwrap();

        let calls = api.recorded_calls();
        assert_that!(calls, len(eq(2)));
        let second_entries = calls.get(1).unwrap().entries.clone().unwrap();
        assert_that!(
            second_entries,
            elements_are![matches_pattern!(Entry { string: eq("Late entry"), .. })]
        );
    }

    /// 1 つのグループの失敗はエラーとして記録され、兄弟の成功は残る
    #[tokio::test]
    async fn failing_group_is_fail_fast_but_merges_siblings() {
        let api = MockApi {
            fail_locales: ["de".to_string()].into(),
            ..MockApi::with_translations(&[("Hello!", "Hei!")])
        };
        let session = session_with(api.clone(), options());

        session.resolve(&Entry::from_string("Hello!"));
        session.resolve(&Entry {
            locale: Some("de".to_string()),
            ..Entry::from_string("Hello!")
        });

        let result = session.flush().await;

        assert_that!(result, err(matches_pattern!(SessionError::Client(anything()))));
        let ambient = session.ambient();
        assert_that!(ambient.is_loading, eq(false));
        assert_that!(ambient.error, some(anything()));

        // 成功した "no" グループの結果はマージ済み
        assert_that!(session.resolve(&Entry::from_string("Hello!")), eq("Hei!"));
    }

    /// 帯域外のシードで解決済みになったエントリーは再フェッチされない
    #[tokio::test]
    async fn out_of_band_seed_resolves_without_fetch() {
        let api = MockApi::default();
        let session = session_with(api.clone(), options());

        session.resolve(&Entry::from_string("Hello!"));
        assert_that!(session.has_pending_entries(), eq(true));

        session.merge_localizations(store::from_seed(
            "test",
            "no",
            [("Hello!".to_string(), "Hei!".to_string())].into(),
        ));

        session.flush().await.unwrap();

        assert_that!(api.call_count(), eq(0));
        assert_that!(session.has_pending_entries(), eq(false));
        assert_that!(session.resolve(&Entry::from_string("Hello!")), eq("Hei!"));
    }

    /// キューが空ならロケール変更は即時、ペンディング中はフラッシュ後
    #[tokio::test]
    async fn locale_change_timing() {
        let api = MockApi::default();
        let session = session_with(api.clone(), options());

        session.set_locale(Some("de".to_string()));
        assert_that!(session.ambient().locale, some(eq("de")));

        session.resolve(&Entry::from_string("Hello!"));
        session.set_locale(Some("sv".to_string()));
        assert_that!(session.ambient().locale, some(eq("de")));

        session.flush().await.unwrap();
        assert_that!(session.ambient().locale, some(eq("sv")));
    }

    /// 変数つきの解決はガードされたキーで引き、テンプレートを適用する
    #[tokio::test]
    async fn resolve_with_variables_round_trip() {
        let api = MockApi::default();
        let session = session_with(
            api.clone(),
            SessionOptions {
                translations: Some(
                    [("Hello, [[[{{name}}]]]!".to_string(), "Hallo, {{name}}!".to_string())]
                        .into(),
                ),
                ..options()
            },
        );

        let variables: TemplateVariables =
            [("name".to_string(), "Pablo".to_string())].into();

        let translated = session
            .resolve_with_variables(&Entry::from_string("Hello, {{name}}!"), &variables);
        assert_that!(translated, eq("Hallo, Pablo!"));

        // 未解決でもプレースホルダーは原文から復元される
        let fallback =
            session.resolve_with_variables(&Entry::from_string("Bye, {{name}}!"), &variables);
        assert_that!(fallback, eq("Bye, Pablo!"));
    }

    /// 子スコープはキャッシュを共有し、origin / locale を継承する
    #[tokio::test]
    async fn child_scope_shares_cache() {
        let api = MockApi::default();
        let session = session_with(api.clone(), options());
        let child = session.child(Some("page".to_string()), None);

        assert_that!(child.ambient().origin, eq("page"));
        assert_that!(child.ambient().locale, some(eq("no")));

        session.merge_localizations(store::from_seed(
            "page",
            "no",
            [("Hello!".to_string(), "Hei!".to_string())].into(),
        ));

        assert_that!(child.resolve(&Entry::from_string("Hello!")), eq("Hei!"));
    }

    /// オブザーバーは状態変化のたびに通知される
    #[tokio::test]
    async fn observers_are_notified() {
        let api = MockApi::with_translations(&[("Hello!", "Hei!")]);
        let session = session_with(api.clone(), options());

        let events: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&events);
        let id = session.subscribe(move |ambient| {
            recorded.lock().unwrap().push(ambient.is_loading);
        });

        session.resolve(&Entry::from_string("Hello!"));
        session.flush().await.unwrap();

        let snapshot = events.lock().unwrap().clone();
        // 少なくともロード開始 (true) と完了 (false) の通知がある
        assert_that!(snapshot, contains(eq(&true)));
        assert_that!(snapshot.last(), some(eq(&false)));

        session.unsubscribe(id);
        session.set_locale(Some("de".to_string()));
        assert_that!(events.lock().unwrap().len(), eq(snapshot.len()));
    }

    /// 厳格モードでは不正なエントリーはキューに入らずエラーが記録される
    #[rstest]
    fn strict_validation_records_error() {
        let api = MockApi::default();
        let session = session_with(
            api,
            SessionOptions { strict_validation: Some(true), ..options() },
        );

        let output = session.resolve(&Entry::with_id("bad id!", "Hello!"));

        assert_that!(output, eq("Hello!"));
        assert_that!(session.has_pending_entries(), eq(false));
        assert_that!(
            session.ambient().error,
            some(matches_pattern!(SessionError::Validation(anything())))
        );
    }

    /// 寛容モードでは不正なエントリーも処理が続行される
    #[rstest]
    fn lenient_validation_continues() {
        let api = MockApi::default();
        let session = session_with(
            api,
            SessionOptions { strict_validation: Some(false), ..options() },
        );

        session.resolve(&Entry::with_id("bad id!", "Hello!"));

        assert_that!(session.has_pending_entries(), eq(true));
        assert_that!(session.ambient().error, none());
    }

    /// ambient: 右から左のロケールが導出される
    #[rstest]
    fn ambient_derives_directionality() {
        let api = MockApi::default();
        let session = session_with(
            api,
            SessionOptions { locale: Some("ar".to_string()), ..SessionOptions::default() },
        );

        let ambient = session.ambient();

        assert_that!(ambient.is_right_to_left, eq(true));
        assert_that!(ambient.language, some(eq("Arabic")));
        assert_that!(ambient.origin, eq(DEFAULT_ORIGIN));
    }
}
