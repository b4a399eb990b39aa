//! Google API 用アクセストークン Outbound ポート
//!
//! GCS と Vertex AI の両方が Bearer トークンを要求する。取得方法（サービスアカウント・固定値）は adapter 側。

use crate::error::Error;

/// OAuth2 アクセストークンの供給元
pub trait AccessTokenSource: Send + Sync {
    /// 有効なアクセストークンを返す（期限切れなら再取得する）
    fn access_token(&self) -> Result<String, Error>;
}
