//! ブラウザセッションの保管（Cookie `searchmap_session` → SessionState）
//!
//! 表は全体で 1 つの Mutex、各セッションはそれぞれの Mutex。リクエストは自分のセッションだけをロックする。
//! 一定時間使われないセッションは捨て、件数が上限に達したら最も古く使われたものから捨てる。

use crate::domain::SessionState;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const SESSION_COOKIE: &str = "searchmap_session";
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_CAPACITY: usize = 1000;

pub type SharedSession = Arc<Mutex<SessionState>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
    /// 使われた順番（LRU 用）
    tick: u64,
}

#[derive(Default)]
struct Table {
    entries: HashMap<String, Entry>,
    tick: u64,
}

impl Table {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

pub struct SessionStore {
    table: Mutex<Table>,
    idle_ttl: Duration,
    capacity: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_CAPACITY)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_ttl: Duration, capacity: usize) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            idle_ttl,
            capacity: capacity.max(1),
        }
    }

    /// 見つかれば最終利用時刻を更新して返す。期限切れは捨てる
    pub fn get(&self, id: &str) -> Option<SharedSession> {
        let mut table = self.table.lock().ok()?;
        let now = Instant::now();
        let expired = now.duration_since(table.entries.get(id)?.last_seen) >= self.idle_ttl;
        if expired {
            table.entries.remove(id);
            return None;
        }
        let tick = table.next_tick();
        let entry = table.entries.get_mut(id)?;
        entry.last_seen = now;
        entry.tick = tick;
        Some(entry.session.clone())
    }

    /// 登録して共有ハンドルを返す。ロックが壊れていても呼び出し側のハンドルは有効
    pub fn insert(&self, session: SessionState) -> SharedSession {
        let id = session.id.clone();
        let shared = Arc::new(Mutex::new(session));
        if let Ok(mut table) = self.table.lock() {
            let now = Instant::now();
            let ttl = self.idle_ttl;
            table
                .entries
                .retain(|_, e| now.duration_since(e.last_seen) < ttl);
            while table.entries.len() >= self.capacity {
                let oldest = table
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.tick)
                    .map(|(id, _)| id.clone());
                match oldest {
                    Some(oldest) => table.entries.remove(&oldest),
                    None => break,
                };
            }
            let tick = table.next_tick();
            table.entries.insert(
                id,
                Entry {
                    session: shared.clone(),
                    last_seen: now,
                    tick,
                },
            );
        }
        shared
    }

    pub fn len(&self) -> usize {
        self.table.lock().map(|t| t.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cookie ヘッダからセッション ID を取り出す
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Set-Cookie の値
pub fn session_cookie(id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UpdateTable;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id_from_headers(&headers), None);
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; searchmap_session=abc-123; other=1"),
        );
        assert_eq!(session_id_from_headers(&headers), Some("abc-123".to_string()));
        assert_eq!(
            session_cookie("abc-123"),
            "searchmap_session=abc-123; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn test_store_insert_and_get() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        let shared = store.insert(SessionState::new("s-1", Vec::new(), Vec::new(), UpdateTable::default()));
        shared.lock().unwrap().pins.clear();
        assert!(store.get("s-1").is_some());
        assert!(store.get("s-2").is_none());
        assert_eq!(store.len(), 1);
    }

    fn state(id: &str) -> SessionState {
        SessionState::new(id, Vec::new(), Vec::new(), UpdateTable::default())
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let store = SessionStore::with_limits(Duration::from_secs(3600), 2);
        store.insert(state("s-1"));
        store.insert(state("s-2"));
        // s-1 を使ったので次に捨てられるのは s-2
        assert!(store.get("s-1").is_some());
        store.insert(state("s-3"));
        assert_eq!(store.len(), 2);
        assert!(store.get("s-1").is_some());
        assert!(store.get("s-2").is_none());
        assert!(store.get("s-3").is_some());
    }

    #[test]
    fn test_idle_sessions_expire() {
        let store = SessionStore::with_limits(Duration::ZERO, 10);
        store.insert(state("s-1"));
        assert!(store.get("s-1").is_none());
        store.insert(state("s-2"));
        store.insert(state("s-3"));
        assert_eq!(store.len(), 1);
    }
}
