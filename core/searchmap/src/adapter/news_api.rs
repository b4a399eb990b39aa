//! News API（/v2/everything）による NewsSource 実装

use crate::ports::outbound::{Article, NewsSource};
use chrono::NaiveDate;
use common::error::Error;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

pub const PAGE_SIZE: u32 = 50;

pub struct NewsApiClient {
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

impl NewsApiClient {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    fn request_url(&self, query: &str, from: NaiveDate, to: NaiveDate) -> Result<Url, Error> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let page_size = PAGE_SIZE.to_string();
        Url::parse_with_params(
            &self.url,
            &[
                ("q", query),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("language", "en"),
                ("sortBy", "popularity"),
                ("apiKey", self.api_key.as_str()),
                ("pageSize", page_size.as_str()),
            ],
        )
        .map_err(|e| Error::config(format!("invalid news_api_url: {}", e)))
    }
}

impl NewsSource for NewsApiClient {
    fn search(&self, query: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Article>, Error> {
        let url = self.request_url(query, from, to)?;
        let response = Client::new()
            .get(url)
            .send()
            .map_err(|e| Error::external("news", e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::external("news", e.to_string()))?;
        if !status.is_success() {
            let detail = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(String::from))
                .unwrap_or(body);
            return Err(Error::external("news", format!("HTTP {}: {}", status, detail)));
        }
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| Error::external("news", format!("invalid response: {}", e)))?;
        Ok(parsed.articles)
    }
}
