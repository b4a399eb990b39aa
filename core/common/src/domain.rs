//! ドメイン型（Newtype）
//!
//! String を直接運ばず、意味のある型に包んで境界を明確にする。

use serde::{Deserialize, Serialize};

/// モデル名（gemini-1.5-pro 等）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelName(String);

impl ModelName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl std::ops::Deref for ModelName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModelName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// MIME タイプ（image/png 等）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeType(String);

impl MimeType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// ファイル名の拡張子から画像の MIME タイプを推定する（対応外は None）
    pub fn image_from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".png") {
            Some(Self::new("image/png"))
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            Some(Self::new("image/jpeg"))
        } else {
            None
        }
    }

    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/")
    }
}

impl std::ops::Deref for MimeType {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
