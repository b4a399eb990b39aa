//! ブラウザセッションごとの状態

use crate::domain::chat::{ChatMessage, MessageLevel};
use crate::domain::news::Announcement;
use crate::domain::pin::Pin;
use crate::domain::volunteer::UpdateTable;
use crate::domain::zone::{LatLng, Zone};
use common::llm::Message;

/// ゾーン更新フォームの結果など、次の描画で 1 回だけ出す通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: MessageLevel,
    pub text: String,
}

/// セッション状態
///
/// `new` の時点でゾーンと更新表がそろっている。ピンとメッセージは空、ニュース告知は Pending から始まる。
#[derive(Debug, Clone)]
pub struct SessionState {
    pub id: String,
    pub zones: Vec<Zone>,
    /// テッセレーション時に描く境界線（CSV ゾーンのときは空）
    pub boundary: Vec<Vec<LatLng>>,
    pub pins: Vec<Pin>,
    pub messages: Vec<ChatMessage>,
    /// モデルとの会話履歴（セッションの間だけ保持）
    pub conversation: Vec<Message>,
    pub updates: UpdateTable,
    pub announcement: Announcement,
    pub notice: Option<Notice>,
}

impl SessionState {
    pub fn new(
        id: impl Into<String>,
        zones: Vec<Zone>,
        boundary: Vec<Vec<LatLng>>,
        updates: UpdateTable,
    ) -> Self {
        Self {
            id: id.into(),
            zones,
            boundary,
            pins: Vec::new(),
            messages: Vec::new(),
            conversation: Vec::new(),
            updates,
            announcement: Announcement::Pending,
            notice: None,
        }
    }

    pub fn notify(&mut self, level: MessageLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }
}
