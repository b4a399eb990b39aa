//! プロバイダファクトリー
//!
//! プロバイダタイプと接続設定から適切なプロバイダを作成します。

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::echo::EchoProvider;
use crate::llm::gemini::{GeminiEndpoint, GeminiProvider};
use crate::llm::provider::{GenerateRequest, LlmProvider, ModelReply};
use crate::ports::outbound::AccessTokenSource;
use serde_json::Value;
use std::sync::Arc;

/// プロバイダタイプ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Gemini（API キー または Vertex AI）
    Gemini,
    /// Echo（入力を返すだけ）
    Echo,
}

impl ProviderType {
    /// 文字列からプロバイダタイプを解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "vertex" => Some(Self::Gemini),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Echo => "echo",
        }
    }
}

/// Vertex AI の接続先
pub struct VertexTarget {
    pub project_id: String,
    pub location: String,
    pub tokens: Arc<dyn AccessTokenSource>,
}

/// プロバイダ作成に必要な設定
pub struct ProviderSettings {
    pub provider_type: ProviderType,
    pub model: Option<ModelName>,
    /// Some のとき Vertex AI、None のとき API キー（`api_key_env` から読む）
    pub vertex: Option<VertexTarget>,
    pub api_key_env: String,
    pub temperature: Option<f32>,
}

/// プロバイダのenumラッパー
pub enum AnyProvider {
    Gemini(GeminiProvider),
    Echo(EchoProvider),
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::Echo(p) => p.name(),
        }
    }

    fn make_request_payload(&self, request: &GenerateRequest<'_>) -> Result<Value, Error> {
        match self {
            Self::Gemini(p) => p.make_request_payload(request),
            Self::Echo(p) => p.make_request_payload(request),
        }
    }

    fn make_http_request(&self, payload: &Value) -> Result<String, Error> {
        match self {
            Self::Gemini(p) => p.make_http_request(payload),
            Self::Echo(p) => p.make_http_request(payload),
        }
    }

    fn parse_reply(&self, response_json: &str) -> Result<ModelReply, Error> {
        match self {
            Self::Gemini(p) => p.parse_reply(response_json),
            Self::Echo(p) => p.parse_reply(response_json),
        }
    }
}

/// プロバイダを作成する
///
/// Gemini で `vertex` が None のとき、API キーの環境変数が無ければ設定エラー。
pub fn create_provider(settings: ProviderSettings) -> Result<AnyProvider, Error> {
    match settings.provider_type {
        ProviderType::Gemini => {
            let provider = match settings.vertex {
                Some(v) => GeminiProvider::new(
                    settings.model,
                    GeminiEndpoint::Vertex {
                        project_id: v.project_id,
                        location: v.location,
                        tokens: v.tokens,
                    },
                ),
                None => GeminiProvider::from_env(settings.model, &settings.api_key_env)?,
            };
            let provider = match settings.temperature {
                Some(t) => provider.with_temperature(t),
                None => provider,
            };
            Ok(AnyProvider::Gemini(provider))
        }
        ProviderType::Echo => Ok(AnyProvider::Echo(EchoProvider::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StaticTokenSource;

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!(ProviderType::from_str("gemini"), Some(ProviderType::Gemini));
        assert_eq!(ProviderType::from_str("GEMINI"), Some(ProviderType::Gemini));
        assert_eq!(ProviderType::from_str("echo"), Some(ProviderType::Echo));
        assert_eq!(ProviderType::from_str("gpt"), None);
        assert_eq!(ProviderType::Echo.as_str(), "echo");
    }

    #[test]
    fn test_create_echo() {
        let p = create_provider(ProviderSettings {
            provider_type: ProviderType::Echo,
            model: None,
            vertex: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            temperature: None,
        })
        .unwrap();
        assert_eq!(p.name(), "echo");
    }

    #[test]
    fn test_create_vertex_needs_no_api_key() {
        let p = create_provider(ProviderSettings {
            provider_type: ProviderType::Gemini,
            model: None,
            vertex: Some(VertexTarget {
                project_id: "p".to_string(),
                location: "us-central1".to_string(),
                tokens: Arc::new(StaticTokenSource("t".to_string())),
            }),
            api_key_env: "SEARCHMAP_TEST_UNSET_KEY".to_string(),
            temperature: Some(0.0),
        })
        .unwrap();
        assert_eq!(p.name(), "gemini");
    }

    #[test]
    fn test_create_gemini_without_key_fails() {
        let r = create_provider(ProviderSettings {
            provider_type: ProviderType::Gemini,
            model: None,
            vertex: None,
            api_key_env: "SEARCHMAP_TEST_UNSET_KEY".to_string(),
            temperature: None,
        });
        assert!(matches!(r, Err(Error::Config(_))));
    }
}
