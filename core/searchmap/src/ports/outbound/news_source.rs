//! ニュース検索 API の Outbound ポート

use chrono::NaiveDate;
use common::error::Error;
use serde::Deserialize;

/// 検索ヒット 1 件（News API の articles[] と同じ形）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub name: String,
}

/// キーワードと期間で記事を検索する
pub trait NewsSource: Send + Sync {
    fn search(&self, query: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Article>, Error>;
}
