//! チャット入力 → モデル → 検証済みコマンド実行 → 応答
//!
//! 失敗は 1 つの方針で扱う。外部サービスの失敗はログに出して error メッセージとして表示し、
//! データ不備は warning メッセージとして表示して状態を変えない。どちらもセッションは使い続けられる。
//! モデルとの会話（`SessionState::conversation`）は成功したターンだけ積む。

use crate::domain::{
    update_zone, AssistantCommand, ChatImage, ChatMessage, SessionState, UpdateTable, Zone,
};
use crate::ports::outbound::ChatArchive;
use crate::usecase::volunteer_insights::VolunteerInsights;
use common::error::{Error, ErrorKind};
use common::llm::{
    Attachment, FunctionCall, GenerateRequest, LlmProvider, Message, ModelReply, Part, Role,
};
use common::ports::outbound::{IdGenerator, Log, LogRecord, ObjectStore, Precondition};
use common::tool::{ToolDef, ToolSet};
use serde_json::{json, Value};
use std::sync::Arc;

/// モデルがテキストを返さなかったときの表示
pub const EMPTY_REPLY: &str = "Done. (The assistant returned no text.)";

const RULES: &str = "You have access to tools to add pins on a map and update the status of zones. \
First, decide the appropriate action based on the input:\n\n\
If the input describes an event (excluding search-related updates), determine its approximate location using the best available information, \
categorize it as either a 'collision' or 'robbery,' and add a pin to the map.\n\
If there is an update directly related to the missing person, update the file with volunteers insights. \
For instance someone has found something that belongs to them or saw them somewhere. Do not use ' signs when you rephrase the update.\n\
If the input indicates that a search has started or finished, update the zone status with one of the following: 'Available,' 'In Progress,' or 'Searched.'. \
List of the available zones will be specified further in the prompt. Make sure that you select the zone from the list. \
In case person is going to search the part of the specific zone - ask to search the full zone.\n\
For inquiries or inputs that require no action: Respond naturally to the user without using any tools.\n\
Act accordingly without asking follow-up questions. Always provide some text as output. User input:\n";

/// 1 回分のチャット入力
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub text: String,
    pub image: Option<ChatImage>,
}

pub struct ChatBridge {
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync>,
    store: Arc<dyn ObjectStore>,
    insights: Arc<VolunteerInsights>,
    archive: Arc<dyn ChatArchive>,
    ids: Arc<dyn IdGenerator>,
    log: Arc<dyn Log>,
}

impl ChatBridge {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync>,
        store: Arc<dyn ObjectStore>,
        insights: Arc<VolunteerInsights>,
        archive: Arc<dyn ChatArchive>,
        ids: Arc<dyn IdGenerator>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            insights,
            archive,
            ids,
            log,
        }
    }

    /// チャット入力を 1 件処理する。空文字は何もしない
    pub fn submit(&self, session: &mut SessionState, input: ChatInput) {
        let text = input.text.trim();
        if text.is_empty() {
            return;
        }
        // 画像は先にアップロードし、表示するメッセージにオブジェクト名を残す
        let mut message = ChatMessage::user(text, input.image.clone());
        let attachment = match input.image {
            Some(image) => self.upload(image).map(|(object, attachment)| {
                message.image_object = Some(object);
                Some(attachment)
            }),
            None => Ok(None),
        };
        session.messages.push(message);

        if let Err(e) = attachment.and_then(|a| self.converse(session, text, a)) {
            self.report(session, &e);
        }

        if let Err(e) = self.archive.save(&session.id, &session.messages) {
            self.log.emit(
                LogRecord::error("chat archive failed")
                    .layer("usecase")
                    .kind("storage")
                    .field("session", session.id.as_str())
                    .field("error", e.to_string()),
            );
        }
    }

    fn converse(
        &self,
        session: &mut SessionState,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<(), Error> {
        let prompt = build_prompt(text, &session.zones, &session.updates);
        let user_message = match attachment {
            Some(attachment) => Message::user_with_image(prompt, attachment),
            None => Message::user(prompt),
        };

        let tools = self.tools.definitions();
        let mut contents = session.conversation.clone();
        contents.push(user_message);
        let reply = self.generate(&contents, &tools)?;

        let calls: Vec<FunctionCall> = reply.function_calls().into_iter().cloned().collect();
        if calls.is_empty() {
            contents.push(reply.to_message());
            session.conversation = contents;
            self.reply(session, reply.joined_text());
            return Ok(());
        }

        // 並列呼び出しはすべて検証してから実行する。1 つでも不正なら何も適用しない
        let mut commands = Vec::with_capacity(calls.len());
        for call in &calls {
            match self.tools.parse(&call.name, &call.args) {
                Ok(command) => commands.push(command),
                Err(e) => {
                    // 呼び出しは捨て、テキスト部分だけを会話に残す
                    let text_parts: Vec<Part> = reply
                        .parts
                        .iter()
                        .filter(|p| matches!(p, Part::Text(_)))
                        .cloned()
                        .collect();
                    if !text_parts.is_empty() {
                        contents.push(Message::new(Role::Model, text_parts));
                        session.conversation = contents;
                        session.messages.push(ChatMessage::assistant(reply.joined_text()));
                    }
                    return Err(Error::invalid_data(format!(
                        "the assistant requested '{}' but it could not be applied: {}",
                        call.name, e
                    )));
                }
            }
        }

        // 呼び出し 1 つにつき functionResponse 1 つ
        let mut responses = Vec::with_capacity(commands.len());
        for command in &commands {
            let result = self.execute(session, command)?;
            responses.push(Part::FunctionResponse {
                name: command.name().to_string(),
                response: json!({ "content": result }),
            });
        }
        contents.push(reply.to_message());
        contents.push(Message::new(Role::User, responses));
        let followup = self.generate(&contents, &tools)?;
        contents.push(followup.to_message());
        session.conversation = contents;
        self.reply(session, followup.joined_text());
        Ok(())
    }

    fn generate(&self, contents: &[Message], tools: &[ToolDef]) -> Result<ModelReply, Error> {
        self.llm.generate(&GenerateRequest {
            system_instruction: None,
            contents,
            tools,
        })
    }

    /// 画像を `images/{id}.png` に置き、モデルに渡す添付にする
    fn upload(&self, image: ChatImage) -> Result<(String, Attachment), Error> {
        let object = format!("images/{}.png", self.ids.next_id());
        self.store
            .put(&object, &image.bytes, &image.mime_type, Precondition::None)?;
        self.log.emit(
            LogRecord::info("chat image uploaded")
                .layer("usecase")
                .kind("storage")
                .field("object", object.as_str()),
        );
        let attachment = Attachment {
            mime_type: image.mime_type,
            bytes: image.bytes,
            uri: Some(self.store.uri(&object)),
        };
        Ok((object, attachment))
    }

    /// 検証済みコマンドを実行し、モデルに返す結果を作る
    fn execute(&self, session: &mut SessionState, command: &AssistantCommand) -> Result<Value, Error> {
        let result = match command {
            AssistantCommand::AddPin(pin) => {
                session.pins.push(pin.clone());
                Value::Bool(true)
            }
            AssistantCommand::UpdateZone {
                zone_name,
                status,
                assigned_to,
            } => {
                let updated = update_zone(
                    &mut session.zones,
                    zone_name,
                    *status,
                    assigned_to.as_deref(),
                );
                if updated == 0 {
                    self.log.emit(
                        LogRecord::warn("zone not found")
                            .layer("usecase")
                            .kind("tool")
                            .field("zone", zone_name.as_str()),
                    );
                }
                Value::Bool(updated > 0)
            }
            AssistantCommand::UpdateVolunteerInsight { location, details } => {
                session.updates = self.insights.append(location, details)?;
                Value::Bool(true)
            }
        };
        self.log.emit(
            LogRecord::info("tool executed")
                .layer("usecase")
                .kind("tool")
                .field("session", session.id.as_str())
                .field("name", command.name())
                .field("result", result.clone()),
        );
        Ok(result)
    }

    fn reply(&self, session: &mut SessionState, text: String) {
        let text = if text.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text
        };
        session.messages.push(ChatMessage::assistant(text));
    }

    fn report(&self, session: &mut SessionState, error: &Error) {
        let record = match error.kind() {
            ErrorKind::DataValidation => {
                session.messages.push(ChatMessage::warning(error.to_string()));
                LogRecord::warn("chat input not applied").kind("validation")
            }
            _ => {
                session.messages.push(ChatMessage::error(format!(
                    "{} Please try again.",
                    error
                )));
                LogRecord::error("chat request failed").kind("external")
            }
        };
        self.log.emit(
            record
                .layer("usecase")
                .field("session", session.id.as_str())
                .field("error", error.to_string()),
        );
    }
}

/// モデルに送る指示文（ルール・入力・ゾーン一覧・更新履歴）
pub fn build_prompt(input: &str, zones: &[Zone], updates: &UpdateTable) -> String {
    let mut prompt = String::from(RULES);
    prompt.push_str(input);
    prompt.push_str("\n Based on all the information you know provide the recommendations regarding the next steps for the search.\n");

    prompt.push_str("The available zones are:\n");
    for zone in zones {
        let center = zone
            .centroid()
            .map(|c| format!("{:.5}, {:.5}", c.lat, c.lng))
            .unwrap_or_else(|| "unknown".to_string());
        prompt.push_str(&format!(
            "- {} | status: {} | assigned to: {} | center: {}\n",
            zone.name,
            zone.status.as_str(),
            zone.assigned_to.as_deref().unwrap_or("None"),
            center
        ));
    }

    prompt.push_str("Updates:\n");
    for update in updates.updates() {
        prompt.push_str(&format!(
            "- #{} {} | {} | {} | reported by {}\n",
            update.update_id,
            update.update_date,
            update.location_reported,
            update.details,
            update.volunteer_name
        ));
    }
    prompt.push_str("\n The text response should be purely in natural language format even if the tool was used.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LatLng;

    #[test]
    fn test_prompt_lists_zones_and_updates() {
        let mut zone = Zone::new(
            "Mission",
            vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 2.0),
                LatLng::new(2.0, 2.0),
                LatLng::new(2.0, 0.0),
                LatLng::new(0.0, 0.0),
            ],
        );
        zone.assigned_to = Some("Alice".to_string());
        let updates = UpdateTable::parse_csv(
            "Update_ID,Volunteer_Name,Update_Date,Location_Reported,Details,Follow_Up_Action\n4,Bob,d,Presidio,Scarf,search\n",
        )
        .unwrap();
        let prompt = build_prompt("Started searching Mission", &[zone], &updates);
        assert!(prompt.contains("User input:\nStarted searching Mission\n"));
        assert!(prompt.contains("- Mission | status: Available | assigned to: Alice | center: 1.00000, 1.00000"));
        assert!(prompt.contains("- #4 d | Presidio | Scarf | reported by Bob"));
        assert!(prompt.ends_with("even if the tool was used."));
    }
}
