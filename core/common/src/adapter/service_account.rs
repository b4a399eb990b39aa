//! サービスアカウント鍵による OAuth2 アクセストークン取得（JWT bearer grant）
//!
//! GCS と Vertex AI が共有する。取得したトークンは期限の 60 秒前まで使い回す。

use crate::error::Error;
use crate::ports::outbound::AccessTokenSource;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// サービスアカウント鍵ファイル（必要なフィールドのみ）
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    /// 鍵ファイルを読む。存在しない・JSON 不正は設定エラー
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::config(format!(
                "Service account file '{}' does not exist.",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    pub fn parse(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid service account key: {}", e)))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    token: String,
    expires_at: i64,
}

/// サービスアカウント鍵からトークンを取得してキャッシュする AccessTokenSource
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    fn token_uri(&self) -> &str {
        self.key.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// 署名済み JWT（assertion）を作る
    fn assertion(&self, now: i64) -> Result<String, Error> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: self.token_uri(),
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| Error::config(format!("invalid service account private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| Error::external("oauth", format!("failed to sign assertion: {}", e)))
    }

    fn fetch(&self, now: i64) -> Result<CachedToken, Error> {
        let assertion = self.assertion(now)?;
        let client = reqwest::blocking::Client::new();
        let response = client
            .post(self.token_uri())
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .map_err(|e| Error::external("oauth", format!("token request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::external("oauth", format!("failed to read token response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::external("oauth", format!("HTTP {}: {}", status, body)));
        }
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::external("oauth", format!("invalid token response: {}", e)))?;
        Ok(CachedToken {
            token: parsed.access_token,
            expires_at: now + parsed.expires_in,
        })
    }
}

impl AccessTokenSource for ServiceAccountTokenSource {
    fn access_token(&self) -> Result<String, Error> {
        let now = chrono::Utc::now().timestamp();
        let mut cached = self
            .cached
            .lock()
            .map_err(|_| Error::external("oauth", "token cache lock poisoned"))?;
        if let Some(ref c) = *cached {
            if c.expires_at - 60 > now {
                return Ok(c.token.clone());
            }
        }
        let fresh = self.fetch(now)?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// 固定トークンを返す AccessTokenSource（`gcloud auth print-access-token` の値を渡す用途・テスト用）
pub struct StaticTokenSource(pub String);

impl AccessTokenSource for StaticTokenSource {
    fn access_token(&self) -> Result<String, Error> {
        Ok(self.0.clone())
    }
}
