//! チャット欄に表示するメッセージ

use common::domain::MimeType;
use serde::Serialize;

/// 表示レベル。回復可能な失敗もチャット欄にそのまま出す
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Normal,
    Warning,
    Error,
}

/// 添付画像（メモリ上のバイト列）
#[derive(Debug, Clone, PartialEq)]
pub struct ChatImage {
    pub mime_type: MimeType,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub is_user: bool,
    pub text: Option<String>,
    #[serde(skip)]
    pub image: Option<ChatImage>,
    /// アップロード先のオブジェクト名（画像付きのとき）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_object: Option<String>,
    pub level: MessageLevel,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image: Option<ChatImage>) -> Self {
        Self {
            is_user: true,
            text: Some(text.into()),
            image,
            image_object: None,
            level: MessageLevel::Normal,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::assistant_with_level(text, MessageLevel::Normal)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::assistant_with_level(text, MessageLevel::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::assistant_with_level(text, MessageLevel::Error)
    }

    fn assistant_with_level(text: impl Into<String>, level: MessageLevel) -> Self {
        Self {
            is_user: false,
            text: Some(text.into()),
            image: None,
            image_object: None,
            level,
        }
    }
}
