//! アダプター（ポートの実装と HTTP Inbound）

pub mod assistant_tools;
pub mod chat_archive;
pub mod config;
pub mod http;
pub mod news_api;
pub mod scripted_llm;

pub use assistant_tools::AssistantTools;
pub use chat_archive::{BucketChatArchive, NoChatArchive};
pub use news_api::NewsApiClient;
