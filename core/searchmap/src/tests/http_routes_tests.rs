use super::fixtures::{clock, store, tools, zones, UPDATES_CSV};
use crate::adapter::http::page::TITLE;
use crate::adapter::http::session_store::SessionStore;
use crate::adapter::http::{router, AppState, PageSettings, MAX_UPLOAD_BYTES};
use crate::adapter::NoChatArchive;
use crate::domain::{Announcement, MessageLevel, ZoneStatus};
use crate::usecase::chat_bridge::ChatBridge;
use crate::usecase::news_feed::NewsFeed;
use crate::usecase::session_init::SessionFactory;
use crate::usecase::volunteer_insights::VolunteerInsights;
use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use common::adapter::{NoopLog, SequenceIdGenerator};
use common::llm::echo::EchoProvider;
use common::ports::outbound::ObjectStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app_state() -> AppState {
    app_state_with(SessionStore::new())
}

fn app_state_with(sessions: SessionStore) -> AppState {
    let store: Arc<dyn ObjectStore> = Arc::new(
        store().with_object("news/001.txt", "Cliff rescue at Baker Beach\nsource: SF Chronicle"),
    );
    let llm = Arc::new(EchoProvider::new());
    let insights = Arc::new(VolunteerInsights::new(
        store.clone(),
        UPDATES_CSV,
        "Volunteer",
        Arc::new(clock()),
        Arc::new(NoopLog),
    ));
    let chat = ChatBridge::new(
        llm.clone(),
        tools(),
        store.clone(),
        insights.clone(),
        Arc::new(NoChatArchive),
        Arc::new(SequenceIdGenerator::new("img")),
        Arc::new(NoopLog),
    );
    let news = NewsFeed::new(store, llm, tools(), Arc::new(NoopLog));
    let factory = SessionFactory::new(
        zones(),
        Vec::new(),
        insights,
        Arc::new(SequenceIdGenerator::new("s")),
        Arc::new(NoopLog),
    );
    AppState {
        sessions: Arc::new(sessions),
        factory: Arc::new(factory),
        chat: Arc::new(chat),
        news: Arc::new(news),
        profile: Arc::new(None),
        page: Arc::new(PageSettings {
            maps_api_key: "test-key".to_string(),
            people: vec!["Alice".to_string(), "Bob".to_string()],
        }),
        log: Arc::new(NoopLog),
    }
}

async fn send(state: &AppState, request: Request<Body>) -> Response {
    router(state.clone()).oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, cookie: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(COOKIE, cookie)
        .header(CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

fn form(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    post(uri, cookie, "application/x-www-form-urlencoded", body.to_string())
}

fn assert_redirect_home(response: &Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
}

#[tokio::test]
async fn test_first_visit_creates_session() {
    let state = app_state();
    let response = send(&state, get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("searchmap_session=s-1;"));
    let html = body_text(response).await;
    assert!(html.contains(TITLE));
    assert!(html.contains("Photo not available"));
    assert_eq!(state.sessions.len(), 1);

    // 同じ Cookie なら同じセッション
    let response = send(&state, get("/", Some("searchmap_session=s-1"))).await;
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_manual_zone_update() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let cookie = "searchmap_session=s-1";

    let response = send(
        &state,
        form("/zones", cookie, "zone=Mission&status=Searched&assigned_to=Alice"),
    )
    .await;
    assert_redirect_home(&response);
    {
        let session = state.sessions.get("s-1").unwrap();
        let session = session.lock().unwrap();
        assert_eq!(session.zones[0].status, ZoneStatus::Searched);
        assert_eq!(session.zones[0].assigned_to.as_deref(), Some("Alice"));
        assert_eq!(session.zones[1].status, ZoneStatus::Available);
    }

    // 通知は次の描画で 1 回だけ
    let html = body_text(send(&state, get("/", Some(cookie))).await).await;
    assert!(html.contains("updated successfully."));
    let html = body_text(send(&state, get("/", Some(cookie))).await).await;
    assert!(!html.contains("updated successfully."));
}

#[tokio::test]
async fn test_manual_update_keeps_assignee_for_none() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let cookie = "searchmap_session=s-1";
    send(&state, form("/zones", cookie, "zone=Mission&status=In+Progress&assigned_to=Bob")).await;
    send(&state, form("/zones", cookie, "zone=Mission&status=Searched&assigned_to=None")).await;

    let session = state.sessions.get("s-1").unwrap();
    let session = session.lock().unwrap();
    assert_eq!(session.zones[0].status, ZoneStatus::Searched);
    assert_eq!(session.zones[0].assigned_to.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_manual_update_unknown_zone_warns() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let response = send(
        &state,
        form("/zones", "searchmap_session=s-1", "zone=Atlantis&status=Searched"),
    )
    .await;
    assert_redirect_home(&response);

    let session = state.sessions.get("s-1").unwrap();
    let session = session.lock().unwrap();
    assert_eq!(session.zones, zones());
    let notice = session.notice.as_ref().unwrap();
    assert_eq!(notice.level, MessageLevel::Warning);
    assert_eq!(notice.text, "Zone 'Atlantis' was not found.");
}

#[tokio::test]
async fn test_zones_json_and_map() {
    let state = app_state();
    let response = send(&state, get("/zones.json", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_some());
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["name"], "Mission");
    assert_eq!(json[0]["status"], "Available");

    let html = body_text(send(&state, get("/map", Some("searchmap_session=s-1"))).await).await;
    assert!(html.contains("key=test-key"));
}

#[tokio::test]
async fn test_chat_post_runs_bridge() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nAny news about the search?\r\n--{b}--\r\n",
        b = boundary
    );
    let response = send(
        &state,
        post(
            "/chat",
            "searchmap_session=s-1",
            &format!("multipart/form-data; boundary={}", boundary),
            body,
        ),
    )
    .await;
    assert_redirect_home(&response);

    let session = state.sessions.get("s-1").unwrap();
    let session = session.lock().unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].text.as_deref(), Some("Any news about the search?"));
    assert!(session.messages[1].text.as_deref().unwrap().starts_with("[echo] "));
}

#[tokio::test]
async fn test_news_acknowledge() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let response = send(
        &state,
        post("/news/ack", "searchmap_session=s-1", "text/plain", Body::empty()),
    )
    .await;
    assert_redirect_home(&response);

    let session = state.sessions.get("s-1").unwrap();
    let session = session.lock().unwrap();
    assert_eq!(session.announcement, Announcement::Highlighted);
    assert!(session.messages[0]
        .text
        .as_deref()
        .unwrap()
        .starts_with("There is a new update: Cliff rescue at Baker Beach"));
}

#[tokio::test]
async fn test_oversized_upload_warns_and_keeps_session() {
    let state = app_state();
    send(&state, get("/", None)).await;
    let boundary = "XBOUNDARYX";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nFound a scarf\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"scarf.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend(std::iter::repeat(0xFFu8).take(MAX_UPLOAD_BYTES + 1));
    body.extend(format!("\r\n--{}--\r\n", boundary).into_bytes());
    let response = send(
        &state,
        post(
            "/chat",
            "searchmap_session=s-1",
            &format!("multipart/form-data; boundary={}", boundary),
            body,
        ),
    )
    .await;
    assert_redirect_home(&response);

    {
        let session = state.sessions.get("s-1").unwrap();
        let session = session.lock().unwrap();
        let notice = session.notice.as_ref().unwrap();
        assert_eq!(notice.level, MessageLevel::Warning);
        assert!(notice.text.starts_with("The upload could not be read."));
        assert!(session.messages.iter().all(|m| m.image.is_none()));
    }

    // 同じセッションで続けて使える
    let html = body_text(send(&state, get("/", Some("searchmap_session=s-1"))).await).await;
    assert!(html.contains("The upload could not be read."));
}

#[tokio::test]
async fn test_cookieless_requests_do_not_grow_sessions_without_bound() {
    let state = app_state_with(SessionStore::with_limits(Duration::from_secs(3600), 3));
    for _ in 0..5 {
        let response = send(&state, get("/zones.json", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.sessions.len(), 3);
    assert!(state.sessions.get("s-1").is_none());
    assert!(state.sessions.get("s-5").is_some());

    // 捨てられたセッションの Cookie には新しいセッションを発行する
    let response = send(&state, get("/", Some("searchmap_session=s-1"))).await;
    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("searchmap_session=s-6;"));
}
