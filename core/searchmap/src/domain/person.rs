//! 行方不明者のプロフィール

use crate::domain::volunteer::UpdateTable;
use common::domain::MimeType;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonProfile {
    /// .rtf から取り出したプレーンテキスト
    pub description: String,
    pub updates: UpdateTable,
    pub photo: Option<(MimeType, Vec<u8>)>,
}
