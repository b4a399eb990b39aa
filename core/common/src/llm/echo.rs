//! Echoプロバイダの実装
//!
//! 実際にLLM APIを呼び出さず、最後の user テキストをそのまま返します。
//! API キーなしでダッシュボードを動かす開発用です。関数呼び出しは行いません。

use crate::error::Error;
use crate::llm::provider::{GenerateRequest, LlmProvider, ModelReply, Role};
use serde_json::{json, Value};

/// Echoプロバイダ
#[derive(Debug, Default)]
pub struct EchoProvider;

impl EchoProvider {
    /// 新しいEchoプロバイダを作成
    pub fn new() -> Self {
        Self
    }
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn make_request_payload(&self, request: &GenerateRequest<'_>) -> Result<Value, Error> {
        let last_user = request
            .contents
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.text().is_empty())
            .map(|m| m.text())
            .unwrap_or_default();
        Ok(json!({
            "query": last_user,
            "messages": request.contents.len(),
            "tools": request.tools.len(),
        }))
    }

    fn make_http_request(&self, payload: &Value) -> Result<String, Error> {
        // 実際のAPI呼び出しは行わない
        Ok(payload.to_string())
    }

    fn parse_reply(&self, response_json: &str) -> Result<ModelReply, Error> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| Error::llm(format!("echo: {}", e)))?;
        let query = v["query"].as_str().unwrap_or("");
        // プロンプト全体は長いので先頭行だけ返す
        let first_line = query.lines().next().unwrap_or("");
        Ok(ModelReply::text(format!("[echo] {}", first_line)))
    }
}
