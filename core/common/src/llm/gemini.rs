//! Gemini（generateContent）プロバイダの実装
//!
//! 2 種類のエンドポイントに対応する。
//! - API キー: generativelanguage.googleapis.com（画像は inlineData で送る）
//! - Vertex AI: {location}-aiplatform.googleapis.com（サービスアカウントの Bearer、画像は gs:// の fileData）

use crate::domain::ModelName;
use crate::error::Error;
use crate::llm::provider::{
    FinishReason, FunctionCall, GenerateRequest, LlmProvider, Message, ModelReply, Part,
};
use crate::ports::outbound::AccessTokenSource;
use crate::tool::ToolDef;
use base64::Engine;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// 接続先
pub enum GeminiEndpoint {
    ApiKey {
        api_key: String,
    },
    Vertex {
        project_id: String,
        location: String,
        tokens: Arc<dyn AccessTokenSource>,
    },
}

/// Gemini プロバイダ
pub struct GeminiProvider {
    model: ModelName,
    endpoint: GeminiEndpoint,
    temperature: Option<f32>,
}

impl GeminiProvider {
    pub fn new(model: Option<ModelName>, endpoint: GeminiEndpoint) -> Self {
        Self {
            model: model.unwrap_or_else(|| ModelName::new(DEFAULT_MODEL)),
            endpoint,
            temperature: None,
        }
    }

    /// API キーを環境変数から読んで作成
    ///
    /// # Arguments
    /// * `model` - モデル名（None のとき gemini-1.5-pro）
    /// * `api_key_env` - API キーを読む環境変数名
    pub fn from_env(model: Option<ModelName>, api_key_env: &str) -> Result<Self, Error> {
        let api_key = env::var(api_key_env)
            .map_err(|_| Error::config(format!("{} environment variable is not set", api_key_env)))?;
        Ok(Self::new(model, GeminiEndpoint::ApiKey { api_key }))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    fn endpoint_url(&self) -> String {
        match &self.endpoint {
            GeminiEndpoint::ApiKey { .. } => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                self.model
            ),
            GeminiEndpoint::Vertex {
                project_id,
                location,
                ..
            } => format!(
                "https://{loc}-aiplatform.googleapis.com/v1/projects/{p}/locations/{loc}/publishers/google/models/{m}:generateContent",
                loc = location,
                p = project_id,
                m = self.model
            ),
        }
    }

    fn part_to_json(&self, part: &Part) -> Value {
        match part {
            Part::Text(t) => json!({ "text": t }),
            Part::Image(img) => match (&self.endpoint, &img.uri) {
                (GeminiEndpoint::Vertex { .. }, Some(uri)) => json!({
                    "fileData": { "mimeType": img.mime_type.to_string(), "fileUri": uri }
                }),
                _ => json!({
                    "inlineData": {
                        "mimeType": img.mime_type.to_string(),
                        "data": base64::engine::general_purpose::STANDARD.encode(&img.bytes)
                    }
                }),
            },
            Part::FunctionCall(fc) => json!({
                "functionCall": { "name": fc.name, "args": fc.args }
            }),
            Part::FunctionResponse { name, response } => json!({
                "functionResponse": { "name": name, "response": response }
            }),
        }
    }

    fn message_to_json(&self, msg: &Message) -> Value {
        let mut parts: Vec<Value> = msg.parts.iter().map(|p| self.part_to_json(p)).collect();
        if parts.is_empty() {
            parts.push(json!({ "text": "" }));
        }
        json!({ "role": msg.role.as_str(), "parts": parts })
    }

    fn tools_to_json(defs: &[ToolDef]) -> Value {
        let declarations: Vec<Value> = defs
            .iter()
            .map(|d| {
                json!({
                    "name": d.name,
                    "description": d.description,
                    "parameters": d.parameters
                })
            })
            .collect();
        json!([{ "functionDeclarations": declarations }])
    }

    /// エラーレスポンスからメッセージを抽出
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| format!("HTTP {}: {}", status, body))
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn make_request_payload(&self, request: &GenerateRequest<'_>) -> Result<Value, Error> {
        if request.contents.is_empty() {
            return Err(Error::invalid_data("generateContent needs at least one message"));
        }
        let mut payload = json!({
            "contents": request.contents.iter().map(|m| self.message_to_json(m)).collect::<Vec<_>>(),
            "safetySettings": SAFETY_CATEGORIES
                .iter()
                .map(|c| json!({ "category": c, "threshold": "BLOCK_NONE" }))
                .collect::<Vec<_>>(),
        });
        if let Some(system) = request.system_instruction {
            payload["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if !request.tools.is_empty() {
            payload["tools"] = Self::tools_to_json(request.tools);
        }
        if let Some(t) = self.temperature {
            payload["generationConfig"] = json!({ "temperature": t });
        }
        Ok(payload)
    }

    fn make_http_request(&self, payload: &Value) -> Result<String, Error> {
        let client = reqwest::blocking::Client::new();
        let mut builder = client
            .post(self.endpoint_url())
            .header("Content-Type", "application/json")
            .json(payload);
        builder = match &self.endpoint {
            GeminiEndpoint::ApiKey { api_key } => builder.query(&[("key", api_key.as_str())]),
            GeminiEndpoint::Vertex { tokens, .. } => {
                builder.header("Authorization", format!("Bearer {}", tokens.access_token()?))
            }
        };
        let response = builder
            .send()
            .map_err(|e| Error::llm(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response
            .text()
            .map_err(|e| Error::llm(format!("Failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(Error::llm(format!(
                "Gemini API error: {}",
                Self::error_message(status, &response_text)
            )));
        }
        Ok(response_text)
    }

    fn parse_reply(&self, response_json: &str) -> Result<ModelReply, Error> {
        let v: Value = serde_json::from_str(response_json)
            .map_err(|e| Error::llm(format!("Failed to parse response JSON: {}", e)))?;

        if let Some(error) = v.get("error") {
            let error_msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(Error::llm(format!("Gemini API error: {}", error_msg)));
        }

        let candidate = &v["candidates"][0];
        if candidate.is_null() {
            // 候補なし: プロンプト自体がブロックされた
            let reason = v["promptFeedback"]["blockReason"]
                .as_str()
                .unwrap_or("no candidates returned");
            return Err(Error::llm(format!("Gemini returned no answer: {}", reason)));
        }

        let mut parts = Vec::new();
        if let Some(raw_parts) = candidate["content"]["parts"].as_array() {
            for part in raw_parts {
                if let Some(text) = part["text"].as_str() {
                    if !text.is_empty() {
                        parts.push(Part::Text(text.to_string()));
                    }
                }
                if let Some(fc) = part["functionCall"].as_object() {
                    let name = fc.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                    let args = fc.get("args").cloned().unwrap_or_else(|| json!({}));
                    parts.push(Part::FunctionCall(FunctionCall { name, args }));
                }
            }
        }
        let finish = candidate["finishReason"]
            .as_str()
            .map(FinishReason::from_api)
            .unwrap_or(FinishReason::Stop);
        Ok(ModelReply { parts, finish })
    }
}
