//! news/ フォルダの取り込みと、新着告知・ニュースからのピン配置

use crate::domain::{Announcement, AssistantCommand, ChatMessage, NewsItem, SessionState};
use common::error::Error;
use common::llm::{GenerateRequest, LlmProvider, Message};
use common::ports::outbound::{Log, LogRecord, ObjectStore};
use common::tool::ToolSet;
use std::sync::Arc;

pub const NEWS_PREFIX: &str = "news/";

const PIN_PROMPT: &str = "You have access to tools to add pins on a map. You will be given the news description.\n\
If the input describes an event (excluding search-related updates), determine its approximate location using the best available information, \
categorize it as either a 'collision', 'robbery' or 'other danger' and add a pin to the map.\n\
Act accordingly without asking follow-up questions. News:\n";

/// `news/*.txt` を名前順に読む。最後が最新
pub fn read_news(store: &dyn ObjectStore) -> Result<Vec<NewsItem>, Error> {
    let mut items = Vec::new();
    for meta in store.list(NEWS_PREFIX)? {
        if !meta.name.to_lowercase().ends_with(".txt") {
            continue;
        }
        let object = store.get(&meta.name)?;
        items.push(NewsItem::parse(&meta.name, &object.text()));
    }
    items.sort_by(|a, b| a.object_name.cmp(&b.object_name));
    Ok(items)
}

/// 新着告知のアシスタントメッセージ
pub fn announcement_text(item: &NewsItem) -> String {
    format!(
        "There is a new update: {}\nIt is recommended to visit the location to check whether it is related to the ongoing search.",
        item.describe()
    )
}

pub struct NewsFeed {
    store: Arc<dyn ObjectStore>,
    llm: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync>,
    log: Arc<dyn Log>,
}

impl NewsFeed {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        llm: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            store,
            llm,
            tools,
            log,
        }
    }

    pub fn read(&self) -> Result<Vec<NewsItem>, Error> {
        read_news(self.store.as_ref())
    }

    /// 保留中の最新ニュースを公開する。公開したら true
    ///
    /// ニュースが 1 件も無いとき、すでに公開済みのときは何もしない。
    pub fn acknowledge(&self, session: &mut SessionState) -> Result<bool, Error> {
        if session.announcement != Announcement::Pending {
            return Ok(false);
        }
        let items = self.read()?;
        let Some(newest) = items.last() else {
            return Ok(false);
        };
        session.announcement.acknowledge();
        session.messages.push(ChatMessage::assistant(announcement_text(newest)));
        self.log.emit(
            LogRecord::info("news acknowledged")
                .layer("usecase")
                .kind("news")
                .field("session", session.id.as_str())
                .field("object", newest.object_name.as_str()),
        );
        Ok(true)
    }

    /// 表示中のニュース 1 件ずつモデルに渡し、add_pin が返ればピンを置く。置いた数を返す
    ///
    /// add_pin 以外の呼び出しや引数不正は警告ログを出して飛ばす。LLM の失敗はそこで中断する。
    pub fn pin_news_incidents(&self, session: &mut SessionState) -> Result<usize, Error> {
        let items = self.read()?;
        let visible = session.announcement.visible(&items);
        let tools: Vec<_> = self
            .tools
            .definitions()
            .into_iter()
            .filter(|d| d.name == "add_pin")
            .collect();

        let mut added = 0;
        for item in visible {
            let contents = [Message::user(format!("{}{}", PIN_PROMPT, item.describe()))];
            let reply = self.llm.generate(&GenerateRequest {
                system_instruction: None,
                contents: &contents,
                tools: &tools,
            })?;
            for call in reply.function_calls() {
                match self.tools.parse(&call.name, &call.args) {
                    Ok(AssistantCommand::AddPin(pin)) => {
                        session.pins.push(pin);
                        added += 1;
                    }
                    Ok(other) => self.log.emit(
                        LogRecord::warn("unexpected tool for news item")
                            .layer("usecase")
                            .kind("tool")
                            .field("name", other.name())
                            .field("object", item.object_name.as_str()),
                    ),
                    Err(e) => self.log.emit(
                        LogRecord::warn("news pin skipped")
                            .layer("usecase")
                            .kind("validation")
                            .field("error", e.to_string())
                            .field("object", item.object_name.as_str()),
                    ),
                }
            }
        }
        self.log.emit(
            LogRecord::info("news pins placed")
                .layer("usecase")
                .kind("news")
                .field("session", session.id.as_str())
                .field("pins", added),
        );
        Ok(added)
    }
}
