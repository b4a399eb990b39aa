//! ユースケース層
//!
//! セッション状態を受け取り、ポート経由で外界に触れて状態を更新する。すべて同期処理。

pub mod chat_bridge;
pub mod map_render;
pub mod markup;
pub mod news_feed;
pub mod news_search;
pub mod person_profile;
pub mod rtf;
pub mod session_init;
pub mod tessellation;
pub mod volunteer_insights;
pub mod zone_loader;
