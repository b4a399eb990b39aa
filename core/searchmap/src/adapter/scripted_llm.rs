//! テスト用: 用意した応答を順に返す LlmProvider 実装

#[cfg(test)]
mod scripted {
    use common::error::Error;
    use common::llm::{GenerateRequest, LlmProvider, Message, ModelReply};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 受け取ったリクエスト（会話と公開ツール名）
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub contents: Vec<Message>,
        pub tools: Vec<String>,
    }

    /// 応答キューが尽きたら `Error::llm` を返す
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<ModelReply, Error>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: Vec<Result<ModelReply, Error>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl LlmProvider for ScriptedLlm {
        fn name(&self) -> &str {
            "scripted"
        }

        fn make_request_payload(&self, _request: &GenerateRequest<'_>) -> Result<Value, Error> {
            Ok(Value::Null)
        }

        fn make_http_request(&self, _payload: &Value) -> Result<String, Error> {
            Ok(String::new())
        }

        fn parse_reply(&self, _response_json: &str) -> Result<ModelReply, Error> {
            Err(Error::llm("scripted provider does not parse replies"))
        }

        fn generate(&self, request: &GenerateRequest<'_>) -> Result<ModelReply, Error> {
            self.requests.lock().unwrap().push(RecordedRequest {
                contents: request.contents.to_vec(),
                tools: request.tools.iter().map(|t| t.name.clone()).collect(),
            });
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::llm("no scripted reply left")))
        }
    }
}

#[cfg(test)]
pub use scripted::ScriptedLlm;
