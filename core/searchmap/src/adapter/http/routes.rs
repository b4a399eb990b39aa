//! ルートハンドラ
//!
//! どのハンドラもセッションを解決し、ユースケースを blocking スレッドで実行してから応答する。
//! POST は処理後 `/` へ 303 で戻る。

use crate::adapter::http::error::HttpError;
use crate::adapter::http::page::{render_page, PageView, Tab};
use crate::adapter::http::session_store::session_cookie;
use crate::adapter::http::state::{with_session, AppState, ResolvedSession};
use crate::domain::{update_zone, ChatImage, MessageLevel, ZoneStatus};
use crate::usecase::chat_bridge::ChatInput;
use crate::usecase::map_render::{render_map, MapView};
use crate::adapter::http::MAX_UPLOAD_BYTES;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use common::domain::MimeType;
use common::ports::outbound::LogRecord;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ZoneForm {
    pub zone: String,
    pub status: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
}

/// 新規セッションなら Set-Cookie を付ける
fn with_cookie(resolved: &ResolvedSession, response: impl IntoResponse) -> Response {
    match &resolved.new_id {
        Some(id) => ([(SET_COOKIE, session_cookie(id))], response).into_response(),
        None => response.into_response(),
    }
}

fn back_to_page(resolved: &ResolvedSession) -> Response {
    with_cookie(resolved, Redirect::to("/"))
}

pub async fn page_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let tab = Tab::parse(query.tab.as_deref());
    let news = state.news.clone();
    let profile = state.profile.clone();
    let page = state.page.clone();

    let html = with_session(resolved.session.clone(), move |session| {
        let news = match tab {
            Tab::News => Some(news.read().map_err(|e| e.to_string())),
            Tab::Person => None,
        };
        let html = render_page(&PageView {
            session,
            tab,
            news,
            profile: (*profile).as_ref(),
            people: &page.people,
        });
        // 告知は 1 回描いたら既読、通知は 1 回だけ出す
        if tab == Tab::News {
            session.announcement.rendered();
        }
        session.notice = None;
        html
    })
    .await?;
    Ok(with_cookie(&resolved, Html(html)))
}

pub async fn map_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let page = state.page.clone();
    let html = with_session(resolved.session.clone(), move |session| {
        render_map(&MapView {
            zones: &session.zones,
            pins: &session.pins,
            boundary: &session.boundary,
            api_key: &page.maps_api_key,
        })
    })
    .await?;
    Ok(with_cookie(&resolved, Html(html)))
}

pub async fn zones_json_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let zones = with_session(resolved.session.clone(), |session| session.zones.clone()).await?;
    Ok(with_cookie(&resolved, Json(zones)))
}

/// 手動のゾーン更新。担当者 "None" は担当者を変えない
pub async fn zone_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ZoneForm>,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let log = state.log.clone();
    with_session(resolved.session.clone(), move |session| {
        let Some(status) = ZoneStatus::parse(&form.status) else {
            session.notify(
                MessageLevel::Warning,
                format!("Unknown status '{}'.", form.status),
            );
            return;
        };
        let assigned_to = form
            .assigned_to
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "None");
        let updated = update_zone(&mut session.zones, &form.zone, status, assigned_to);
        if updated == 0 {
            log.emit(
                LogRecord::warn("zone not found")
                    .layer("http")
                    .kind("validation")
                    .field("zone", form.zone.as_str()),
            );
            session.notify(
                MessageLevel::Warning,
                format!("Zone '{}' was not found.", form.zone),
            );
        } else {
            session.notify(
                MessageLevel::Normal,
                format!("Zone '{}' updated successfully.", form.zone),
            );
        }
    })
    .await?;
    Ok(back_to_page(&resolved))
}

/// チャットフォームの読み取り結果
#[derive(Default)]
struct ChatForm {
    input: ChatInput,
    unsupported_image: Option<String>,
    /// 本文を最後まで読めなかった（サイズ超過など）
    unreadable: bool,
}

async fn read_chat_form(multipart: &mut Multipart, form: &mut ChatForm) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => form.input.text = field.text().await?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                let mime = content_type
                    .map(MimeType::new)
                    .filter(MimeType::is_image)
                    .or_else(|| MimeType::image_from_file_name(&file_name));
                match mime {
                    Some(mime_type) => {
                        form.input.image = Some(ChatImage {
                            mime_type,
                            bytes: bytes.to_vec(),
                        })
                    }
                    None => form.unsupported_image = Some(file_name),
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// multipart の `text` と任意の `image` を読んでチャットに渡す
///
/// 読み取りに失敗しても 400 にはせず、読めたテキストだけを渡して警告を出す。
pub async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let mut form = ChatForm::default();
    if let Err(e) = read_chat_form(&mut multipart, &mut form).await {
        state.log.emit(
            LogRecord::warn("chat form unreadable")
                .layer("http")
                .kind("validation")
                .field("error", e.to_string()),
        );
        form.input.image = None;
        form.unreadable = true;
    }

    let chat = state.chat.clone();
    with_session(resolved.session.clone(), move |session| {
        if form.unreadable {
            session.notify(
                MessageLevel::Warning,
                format!(
                    "The upload could not be read. Images must be PNG or JPEG and at most {} MB.",
                    MAX_UPLOAD_BYTES / (1024 * 1024)
                ),
            );
        } else if let Some(name) = form.unsupported_image {
            session.notify(
                MessageLevel::Warning,
                format!("'{}' is not a PNG or JPEG image and was ignored.", name),
            );
        }
        chat.submit(session, form.input);
    })
    .await?;
    Ok(back_to_page(&resolved))
}

pub async fn news_ack_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let news = state.news.clone();
    with_session(resolved.session.clone(), move |session| {
        if let Err(e) = news.acknowledge(session) {
            session.notify(MessageLevel::Error, format!("News could not be loaded: {}", e));
        }
    })
    .await?;
    Ok(back_to_page(&resolved))
}

pub async fn news_pins_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, HttpError> {
    let resolved = state.resolve_session(&headers).await?;
    let news = state.news.clone();
    let log = state.log.clone();
    with_session(resolved.session.clone(), move |session| {
        match news.pin_news_incidents(session) {
            Ok(added) => session.notify(
                MessageLevel::Normal,
                format!("{} pin(s) added from the news.", added),
            ),
            Err(e) => {
                log.emit(
                    LogRecord::error("news pins failed")
                        .layer("http")
                        .kind("external")
                        .field("error", e.to_string()),
                );
                session.notify(
                    MessageLevel::Error,
                    format!("Pins could not be added from the news: {}", e),
                );
            }
        }
    })
    .await?;
    Ok(back_to_page(&resolved))
}
