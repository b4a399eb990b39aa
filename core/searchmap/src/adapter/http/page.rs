//! ダッシュボード HTML
//!
//! リクエストごとに全体を描き直す。地図は `/map` の iframe、フォームはすべて POST して `/` に戻る。

use crate::domain::{ChatMessage, MessageLevel, NewsItem, PersonProfile, SessionState, ZoneStatus};
use crate::usecase::markup::escape_html;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub const TITLE: &str = "San Francisco Mini Neighborhood Zones and Chat";

/// サイドバーのタブ（既定はニュース）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    News,
    Person,
}

impl Tab {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("person") => Self::Person,
            _ => Self::News,
        }
    }
}

pub struct PageView<'a> {
    pub session: &'a SessionState,
    pub tab: Tab,
    /// ニュースタブのときだけ Some（読み込み失敗はメッセージ）
    pub news: Option<Result<Vec<NewsItem>, String>>,
    pub profile: Option<&'a PersonProfile>,
    pub people: &'a [String],
}

const STYLE: &str = "<style>
body { font-family: sans-serif; margin: 0; display: flex; }
main { flex: 3; padding: 16px; }
aside { flex: 1; padding: 16px; background: #f0f2f6; min-width: 320px; }
iframe { width: 100%; height: 600px; border: 0; }
.message-block { background: #fff; border: 2px solid #C0C0C0; border-radius: 8px; padding: 12px 16px; margin-bottom: 10px; }
.scrollable-container { overflow-y: auto; max-height: 540px; }
.chat { max-height: 360px; overflow-y: auto; }
.user { text-align: right; }
.warning { border-color: #e0a800; background: #fff8e1; }
.error { border-color: #dc3545; background: #fdecea; }
.notice { padding: 8px 12px; border-radius: 6px; margin-bottom: 12px; }
.notice.normal { background: #e6f4ea; }
.new-update { color: green; }
.chat img, .photo img { max-width: 150px; height: auto; }
.tabs a { margin-right: 12px; }
.tabs a.active { font-weight: bold; }
</style>";

pub fn render_page(view: &PageView<'_>) -> String {
    let session = view.session;
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>{style}</head><body><main><h1>{title}</h1>",
        title = TITLE,
        style = STYLE
    );
    if let Some(notice) = &session.notice {
        let _ = write!(
            html,
            "<div class=\"notice {}\">{}</div>",
            level_class(notice.level),
            escape_html(&notice.text)
        );
    }
    html.push_str("<iframe src=\"/map\" title=\"map\"></iframe>");
    html.push_str(&chat_section(&session.messages));
    html.push_str("</main><aside>");
    html.push_str(&zone_form(session, view.people));
    html.push_str(&person_card(view.profile));
    html.push_str(&tabs(view.tab));
    match view.tab {
        Tab::News => html.push_str(&news_section(session, view.news.as_ref())),
        Tab::Person => html.push_str(&updates_section(session)),
    }
    html.push_str("</aside></body></html>");
    html
}

fn level_class(level: MessageLevel) -> &'static str {
    match level {
        MessageLevel::Normal => "normal",
        MessageLevel::Warning => "warning",
        MessageLevel::Error => "error",
    }
}

fn zone_form(session: &SessionState, people: &[String]) -> String {
    let names: BTreeSet<&str> = session.zones.iter().map(|z| z.name.as_str()).collect();
    let mut html = String::from(
        "<h3>Assign Zones and Update Status</h3><form method=\"post\" action=\"/zones\"><label>Select Zone <select name=\"zone\">",
    );
    for name in names {
        let name = escape_html(name);
        let _ = write!(html, "<option value=\"{0}\">{0}</option>", name);
    }
    html.push_str("</select></label><br><label>Select Status <select name=\"status\">");
    for status in ZoneStatus::ALL {
        let _ = write!(html, "<option>{}</option>", status.as_str());
    }
    html.push_str("</select></label><br><label>Assign to <select name=\"assigned_to\"><option>None</option>");
    for person in people {
        let _ = write!(html, "<option>{}</option>", escape_html(person));
    }
    html.push_str("</select></label><br><button type=\"submit\">Update Zone</button></form>");
    html
}

fn chat_section(messages: &[ChatMessage]) -> String {
    let mut html = String::from("<h2>Chat Interface</h2><div class=\"chat\">");
    for m in messages {
        let mut class = String::from("message-block");
        if m.is_user {
            class.push_str(" user");
        }
        if m.level != MessageLevel::Normal {
            class.push(' ');
            class.push_str(level_class(m.level));
        }
        let _ = write!(html, "<div class=\"{}\">", class);
        if let Some(text) = &m.text {
            let _ = write!(html, "<div>{}</div>", escape_html(text).replace('\n', "<br>"));
        }
        if let Some(image) = &m.image {
            let _ = write!(
                html,
                "<img src=\"data:{};base64,{}\" alt=\"uploaded image\">",
                escape_html(&image.mime_type),
                STANDARD.encode(&image.bytes)
            );
        }
        html.push_str("</div>");
    }
    html.push_str(
        "</div><form method=\"post\" action=\"/chat\" enctype=\"multipart/form-data\">\
         <input type=\"text\" name=\"text\" placeholder=\"You:\" autocomplete=\"off\">\
         <input type=\"file\" name=\"image\" accept=\"image/png,image/jpeg\">\
         <button type=\"submit\">Send</button></form>",
    );
    html
}

fn tabs(active: Tab) -> String {
    let link = |tab: Tab, href: &str, label: &str| {
        let class = if tab == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{}\"{}>{}</a>", href, class, label)
    };
    format!(
        "<nav class=\"tabs\">{}{}</nav>",
        link(Tab::News, "/?tab=news", "Media news"),
        link(Tab::Person, "/?tab=person", "Person")
    )
}

fn news_section(session: &SessionState, news: Option<&Result<Vec<NewsItem>, String>>) -> String {
    let items = match news {
        Some(Ok(items)) => items,
        Some(Err(e)) => {
            return format!(
                "<div class=\"message-block error\">News could not be loaded: {}</div>",
                escape_html(e)
            )
        }
        None => return String::new(),
    };
    let visible = session.announcement.visible(items);
    let mut html = String::from("<div class=\"scrollable-container\">");
    for (i, item) in visible.iter().enumerate() {
        let newest = i + 1 == visible.len() && session.announcement.highlights_newest();
        let title = if newest {
            format!(
                "<strong class=\"new-update\">New update:</strong> <span class=\"new-update\">{}</span>",
                escape_html(&item.name)
            )
        } else {
            format!("<strong>Title:</strong> {}", escape_html(&item.name))
        };
        let field = |v: &Option<String>| escape_html(v.as_deref().unwrap_or("N/A"));
        let url = item.url.as_deref().filter(|u| is_web_url(u)).unwrap_or("#");
        let _ = write!(
            html,
            "<div class=\"message-block\"><div>{}</div><div><strong>Source:</strong> {}</div>\
             <div><strong>Published At:</strong> {}</div>\
             <div><strong>URL:</strong> <a href=\"{}\" target=\"_blank\">{}</a></div>\
             <div><strong>Coordinates:</strong> {}</div></div>",
            title,
            field(&item.source),
            field(&item.published_at),
            escape_html(url),
            field(&item.url),
            field(&item.coordinates)
        );
    }
    html.push_str("</div>");
    if visible.len() < items.len() {
        html.push_str(
            "<form method=\"post\" action=\"/news/ack\"><button type=\"submit\">Show new update</button></form>",
        );
    }
    if !visible.is_empty() {
        html.push_str(
            "<form method=\"post\" action=\"/news/pins\"><button type=\"submit\">Pin news incidents</button></form>",
        );
    }
    html
}

/// リンクにしてよいのは http(s) だけ
fn is_web_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// 写真と説明はタブに関係なく常に出す
fn person_card(profile: Option<&PersonProfile>) -> String {
    let mut html = String::from("<div class=\"message-block photo\">");
    match profile.and_then(|p| p.photo.as_ref()) {
        Some((mime, bytes)) => {
            let _ = write!(
                html,
                "<img src=\"data:{};base64,{}\" alt=\"Person Photo\">",
                escape_html(mime),
                STANDARD.encode(bytes)
            );
        }
        None => html.push_str("<div style=\"color: red;\">Photo not available</div>"),
    }
    if let Some(profile) = profile {
        html.push_str(&description_html(&profile.description));
    }
    html.push_str("</div>");
    html
}

fn updates_section(session: &SessionState) -> String {
    let mut html = String::from("<div class=\"scrollable-container\">");
    for update in session.updates.updates() {
        let _ = write!(
            html,
            "<div class=\"message-block\"><div><strong>Date: </strong> {}</div>\
             <div><strong>Location: </strong> {}</div>\
             <div><strong>Details: </strong>{}</div>\
             <div><strong>Volunteer name: </strong> {}</div></div>",
            escape_html(&update.update_date),
            escape_html(&update.location_reported),
            escape_html(&update.details),
            escape_html(&update.volunteer_name)
        );
    }
    html.push_str("</div>");
    html
}

/// `key: value` 行のキーを太字にする
pub fn description_html(description: &str) -> String {
    description
        .lines()
        .map(|line| match line.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                format!("<strong>{}:</strong>{}", escape_html(key), escape_html(value))
            }
            _ => escape_html(line),
        })
        .collect::<Vec<_>>()
        .join("<br>")
}
