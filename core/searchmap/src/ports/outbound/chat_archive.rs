//! チャット履歴の保存先（Outbound ポート）

use crate::domain::ChatMessage;
use common::error::Error;

/// セッションのメッセージ全体を保存する。ephemeral 設定では何もしない実装を使う
pub trait ChatArchive: Send + Sync {
    fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<(), Error>;
}
