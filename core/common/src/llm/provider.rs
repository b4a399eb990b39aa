//! LLMプロバイダのトレイト定義と会話メッセージ型

use crate::domain::MimeType;
use crate::error::Error;
use crate::tool::ToolDef;
use serde_json::Value;

/// 生成リクエスト（システム指示・会話・公開するツール）
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub system_instruction: Option<&'a str>,
    pub contents: &'a [Message],
    pub tools: &'a [ToolDef],
}

/// LLMプロバイダのトレイト
///
/// 各プロバイダ（Gemini、Echo など）はこのトレイトを実装する。
/// `generate` はペイロード生成 → HTTP → 応答解析を順に呼ぶ既定実装。
pub trait LlmProvider: Send + Sync {
    /// プロバイダ名を返す
    fn name(&self) -> &str;

    /// リクエストペイロードを生成
    fn make_request_payload(&self, request: &GenerateRequest<'_>) -> Result<Value, Error>;

    /// HTTPリクエストを実行してレスポンス JSON 文字列を取得
    fn make_http_request(&self, payload: &Value) -> Result<String, Error>;

    /// レスポンスを ModelReply に変換
    fn parse_reply(&self, response_json: &str) -> Result<ModelReply, Error>;

    fn generate(&self, request: &GenerateRequest<'_>) -> Result<ModelReply, Error> {
        let payload = self.make_request_payload(request)?;
        let response = self.make_http_request(&payload)?;
        self.parse_reply(&response)
    }
}

/// 会話の話者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// 添付画像（バイト列と、アップロード済みなら gs:// URI）
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: MimeType,
    pub bytes: Vec<u8>,
    pub uri: Option<String>,
}

/// モデルが要求した関数呼び出し
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}

/// メッセージの構成要素
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Image(Attachment),
    FunctionCall(FunctionCall),
    FunctionResponse { name: String, response: Value },
}

/// メッセージ構造体（user / model と関数呼び出し・関数結果に対応）
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::Text(text.into())])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::Text(text.into())])
    }

    /// 画像付きの user メッセージ
    pub fn user_with_image(text: impl Into<String>, image: Attachment) -> Self {
        Self::new(Role::User, vec![Part::Text(text.into()), Part::Image(image)])
    }

    /// 関数の実行結果（user ターンで返す）
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self::new(
            Role::User,
            vec![Part::FunctionResponse {
                name: name.into(),
                response,
            }],
        )
    }

    /// テキスト部分を連結して返す
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// ストリーム終了理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// 通常終了
    Stop,
    /// 長さ制限
    Length,
    /// 安全性フィルタ
    Safety,
    /// その他（プロバイダ固有）
    Other(String),
}

impl FinishReason {
    pub fn from_api(s: &str) -> Self {
        match s {
            "STOP" => Self::Stop,
            "MAX_TOKENS" => Self::Length,
            "SAFETY" => Self::Safety,
            other => Self::Other(other.to_string()),
        }
    }
}

/// モデルの 1 ターン分の応答
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub parts: Vec<Part>,
    pub finish: FinishReason,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::Text(text.into())],
            finish: FinishReason::Stop,
        }
    }

    /// 全テキスト部分を連結（関数呼び出しのみの応答なら空文字）
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// 最初の関数呼び出し
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(|p| match p {
            Part::FunctionCall(fc) => Some(fc),
            _ => None,
        })
    }

    /// 並列呼び出しを含むすべての関数呼び出し（出現順）
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall(fc) => Some(fc),
                _ => None,
            })
            .collect()
    }

    /// 会話履歴に積むための model メッセージ
    pub fn to_message(&self) -> Message {
        Message::new(Role::Model, self.parts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
    }

    #[test]
    fn test_message_model() {
        let msg = Message::model("Hi there");
        assert_eq!(msg.role, Role::Model);
        assert_eq!(msg.role.as_str(), "model");
    }

    #[test]
    fn test_function_response_is_user_turn() {
        let msg = Message::function_response("add_pin", json!({"content": true}));
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn test_reply_text_and_function_call() {
        let reply = ModelReply {
            parts: vec![
                Part::Text("Marking it. ".to_string()),
                Part::FunctionCall(FunctionCall {
                    name: "add_pin".to_string(),
                    args: json!({"lat": 37.8}),
                }),
                Part::Text("Done.".to_string()),
            ],
            finish: FinishReason::Stop,
        };
        assert_eq!(reply.joined_text(), "Marking it. Done.");
        assert_eq!(reply.function_call().unwrap().name, "add_pin");
        assert_eq!(reply.function_calls().len(), 1);
        assert_eq!(reply.to_message().role, Role::Model);
    }

    #[test]
    fn test_parallel_function_calls_keep_order() {
        let call = |name: &str| {
            Part::FunctionCall(FunctionCall {
                name: name.to_string(),
                args: json!({}),
            })
        };
        let reply = ModelReply {
            parts: vec![call("add_pin"), Part::Text("ok".to_string()), call("update_zone")],
            finish: FinishReason::Stop,
        };
        let names: Vec<&str> = reply.function_calls().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["add_pin", "update_zone"]);
    }

    #[test]
    fn test_finish_reason_from_api() {
        assert_eq!(FinishReason::from_api("STOP"), FinishReason::Stop);
        assert_eq!(FinishReason::from_api("MAX_TOKENS"), FinishReason::Length);
        assert_eq!(FinishReason::from_api("RECITATION"), FinishReason::Other("RECITATION".to_string()));
    }
}
