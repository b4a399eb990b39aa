//! チャット履歴の保存（`chats/{session}.json`）

use crate::domain::ChatMessage;
use crate::ports::outbound::ChatArchive;
use common::error::Error;
use common::ports::outbound::{ObjectStore, Precondition};
use std::sync::Arc;

pub const CHATS_PREFIX: &str = "chats/";

/// オブジェクトストアに JSON で保存する（毎回全体を上書き）
pub struct BucketChatArchive {
    store: Arc<dyn ObjectStore>,
}

impl BucketChatArchive {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn object_name(session_id: &str) -> String {
        format!("{}{}.json", CHATS_PREFIX, session_id)
    }
}

impl ChatArchive for BucketChatArchive {
    fn save(&self, session_id: &str, messages: &[ChatMessage]) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(messages)
            .map_err(|e| Error::invalid_data(format!("chat archive: {}", e)))?;
        self.store.put(
            &Self::object_name(session_id),
            &json,
            "application/json",
            Precondition::None,
        )?;
        Ok(())
    }
}

/// 保存しない（ephemeral）
#[derive(Debug, Default)]
pub struct NoChatArchive;

impl ChatArchive for NoChatArchive {
    fn save(&self, _session_id: &str, _messages: &[ChatMessage]) -> Result<(), Error> {
        Ok(())
    }
}
