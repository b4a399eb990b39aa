//! Outbound ポート: ニュース検索 API とチャット履歴の保存先

pub mod chat_archive;
pub mod news_source;

pub use chat_archive::ChatArchive;
pub use news_source::{Article, ArticleSource, NewsSource};
