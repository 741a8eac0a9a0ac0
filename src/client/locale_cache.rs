//! ロケール一覧のプロセス全体キャッシュ
//!
//! ルーティングミドルウェアなどから繰り返し呼ばれるロケール一覧取得の
//! ネットワーク呼び出しを抑えるための助言的なキャッシュです。最初の
//! 呼び出しで作られ、TTL 経過後に更新され、明示的な破棄は不要です。

use std::collections::HashMap;
use std::sync::{
    LazyLock,
    Mutex,
    MutexGuard,
    PoisonError,
};
use std::time::{
    Duration,
    Instant,
};

/// キャッシュの有効期間
pub const LOCALE_CACHE_TTL: Duration = Duration::from_secs(60);

/// キャッシュの 1 エントリー
#[derive(Debug, Clone)]
struct CachedLocales {
    /// 取得済みのロケール一覧
    locales: Vec<String>,
    /// 取得時刻
    fetched_at: Instant,
}

/// 記述子 URL からキャッシュ済みロケール一覧へのマップ
static LOCALE_CACHE: LazyLock<Mutex<HashMap<String, CachedLocales>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// キャッシュのロックを取得（poison は無視して続行）
fn lock_cache() -> MutexGuard<'static, HashMap<String, CachedLocales>> {
    LOCALE_CACHE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// TTL 内のキャッシュを参照
pub(crate) fn lookup(descriptor: &str) -> Option<Vec<String>> {
    let cache = lock_cache();
    let cached = cache.get(descriptor)?;

    if cached.fetched_at.elapsed() < LOCALE_CACHE_TTL {
        Some(cached.locales.clone())
    } else {
        None
    }
}

/// 取得結果をキャッシュに登録
pub(crate) fn insert(descriptor: &str, locales: Vec<String>) {
    lock_cache()
        .insert(descriptor.to_string(), CachedLocales { locales, fetched_at: Instant::now() });
}

/// ロケール一覧キャッシュを手動で無効化
///
/// 対応ロケールをプロジェクト側で変更した直後など、TTL を待たずに
/// 再取得させたい場合に呼びます。
pub fn invalidate_locale_cache() {
    lock_cache().clear();
}
