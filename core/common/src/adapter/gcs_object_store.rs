//! Google Cloud Storage JSON API による ObjectStore 実装
//!
//! 書き込みは `ifGenerationMatch` で前提条件を送り、412 を `Error::Conflict` に変換する。

use crate::error::Error;
use crate::ports::outbound::{AccessTokenSource, ObjectMeta, ObjectStore, Precondition, StoredObject};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://storage.googleapis.com";

pub struct GcsObjectStore {
    bucket: String,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    generation: Option<String>,
}

impl GcsObjectStore {
    pub fn new(bucket: impl Into<String>, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            bucket: bucket.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            tokens,
        }
    }

    /// エミュレータ等に向ける
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/{segments...}` を組み立てる（各セグメントはパーセントエンコードされる）
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("invalid storage base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::config("storage base url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn object_url(&self, name: &str) -> Result<Url, Error> {
        self.url(&["storage", "v1", "b", &self.bucket, "o", name])
    }

    fn bearer(&self) -> Result<String, Error> {
        Ok(format!("Bearer {}", self.tokens.access_token()?))
    }

    /// 非 2xx を Error に変換する
    fn check(response: Response, what: &str) -> Result<Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(body);
        if status == StatusCode::PRECONDITION_FAILED {
            return Err(Error::conflict(format!("{}: {}", what, detail)));
        }
        Err(Error::storage(format!("{}: HTTP {}: {}", what, status, detail)))
    }

    fn parse_generation(raw: Option<&str>) -> i64 {
        raw.and_then(|s| s.parse().ok()).unwrap_or(0)
    }
}

impl ObjectStore for GcsObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        let client = Client::new();
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.url(&["storage", "v1", "b", &self.bucket, "o"])?;
            url.query_pairs_mut().append_pair("prefix", prefix);
            if let Some(ref t) = page_token {
                url.query_pairs_mut().append_pair("pageToken", t);
            }
            let response = client
                .get(url)
                .header("Authorization", self.bearer()?)
                .send()
                .map_err(|e| Error::storage(format!("list {}: {}", prefix, e)))?;
            let response = Self::check(response, &format!("list {}", prefix))?;
            let page: ListResponse = response
                .json()
                .map_err(|e| Error::storage(format!("invalid list response: {}", e)))?;
            out.extend(page.items.into_iter().map(|o| ObjectMeta {
                size: o.size.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
                generation: Self::parse_generation(o.generation.as_deref()),
                name: o.name,
            }));
            match page.next_page_token {
                Some(t) => page_token = Some(t),
                None => break,
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn get(&self, name: &str) -> Result<StoredObject, Error> {
        let mut url = self.object_url(name)?;
        url.query_pairs_mut().append_pair("alt", "media");
        let response = Client::new()
            .get(url)
            .header("Authorization", self.bearer()?)
            .send()
            .map_err(|e| Error::storage(format!("get {}: {}", name, e)))?;
        let response = Self::check(response, &format!("get {}", name))?;
        let generation = Self::parse_generation(
            response
                .headers()
                .get("x-goog-generation")
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .map_err(|e| Error::storage(format!("read {}: {}", name, e)))?;
        Ok(StoredObject {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            generation,
        })
    }

    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
        precondition: Precondition,
    ) -> Result<i64, Error> {
        let mut url = self.url(&["upload", "storage", "v1", "b", &self.bucket, "o"])?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("uploadType", "media");
            q.append_pair("name", name);
            match precondition {
                Precondition::None => {}
                Precondition::DoesNotExist => {
                    q.append_pair("ifGenerationMatch", "0");
                }
                Precondition::GenerationMatch(g) => {
                    q.append_pair("ifGenerationMatch", &g.to_string());
                }
            }
        }
        let response = Client::new()
            .post(url)
            .header("Authorization", self.bearer()?)
            .header("Content-Type", content_type)
            .body(bytes.to_vec())
            .send()
            .map_err(|e| Error::storage(format!("upload {}: {}", name, e)))?;
        let response = Self::check(response, &format!("upload {}", name))?;
        let resource: ObjectResource = response
            .json()
            .map_err(|e| Error::storage(format!("invalid upload response: {}", e)))?;
        Ok(Self::parse_generation(resource.generation.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StaticTokenSource;

    fn store() -> GcsObjectStore {
        GcsObjectStore::new("missing_people_search", Arc::new(StaticTokenSource("t".into())))
    }

    #[test]
    fn test_object_url_encodes_slashes() {
        let url = store().object_url("person1234/volunteer_updates.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/missing_people_search/o/person1234%2Fvolunteer_updates.csv"
        );
    }

    #[test]
    fn test_base_url_override() {
        let s = store().with_base_url("http://localhost:4443/");
        let url = s.object_url("news/a.txt").unwrap();
        assert!(url.as_str().starts_with("http://localhost:4443/storage/v1/b/"));
    }

    #[test]
    fn test_parse_generation() {
        assert_eq!(GcsObjectStore::parse_generation(Some("1700000000000001")), 1700000000000001);
        assert_eq!(GcsObjectStore::parse_generation(Some("x")), 0);
        assert_eq!(GcsObjectStore::parse_generation(None), 0);
    }

    #[test]
    fn test_uri() {
        assert_eq!(store().uri("images/a.png"), "gs://missing_people_search/images/a.png");
    }
}
