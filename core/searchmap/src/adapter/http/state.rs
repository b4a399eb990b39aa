//! ルーター共有状態

use crate::adapter::http::error::HttpError;
use crate::adapter::http::session_store::{session_id_from_headers, SessionStore, SharedSession};
use crate::domain::{PersonProfile, SessionState};
use crate::usecase::chat_bridge::ChatBridge;
use crate::usecase::news_feed::NewsFeed;
use crate::usecase::session_init::SessionFactory;
use axum::http::HeaderMap;
use common::ports::outbound::Log;
use std::sync::Arc;

/// 画面の固定設定
#[derive(Debug, Clone, Default)]
pub struct PageSettings {
    pub maps_api_key: String,
    /// 担当者の選択肢
    pub people: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub factory: Arc<SessionFactory>,
    pub chat: Arc<ChatBridge>,
    pub news: Arc<NewsFeed>,
    /// 起動時に 1 度だけ読む。読めなければ None
    pub profile: Arc<Option<PersonProfile>>,
    pub page: Arc<PageSettings>,
    pub log: Arc<dyn Log>,
}

/// 解決したセッションと、新規なら返す Cookie
pub struct ResolvedSession {
    pub session: SharedSession,
    pub new_id: Option<String>,
}

impl AppState {
    /// Cookie のセッションを返す。無い・未知なら作る（作成は更新表の読み込みを伴うので blocking スレッドで行う）
    pub async fn resolve_session(&self, headers: &HeaderMap) -> Result<ResolvedSession, HttpError> {
        if let Some(session) = session_id_from_headers(headers).and_then(|id| self.sessions.get(&id)) {
            return Ok(ResolvedSession {
                session,
                new_id: None,
            });
        }
        let factory = self.factory.clone();
        let created = tokio::task::spawn_blocking(move || factory.create()).await?;
        let id = created.id.clone();
        Ok(ResolvedSession {
            session: self.sessions.insert(created),
            new_id: Some(id),
        })
    }
}

/// セッションをロックしてユースケースを blocking スレッドで走らせる
pub async fn with_session<F, T>(session: SharedSession, f: F) -> Result<T, HttpError>
where
    F: FnOnce(&mut SessionState) -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = session
            .lock()
            .map_err(|_| HttpError::internal("session lock poisoned"))?;
        Ok(f(&mut guard))
    })
    .await?
}
