//! HTTP Inbound アダプター（axum）
//!
//! ルーター組み立てとサーバー起動。Ctrl+C / SIGTERM で graceful shutdown する。

pub mod error;
pub mod page;
pub mod routes;
pub mod session_store;
pub mod state;

pub use state::{AppState, PageSettings};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use common::error::Error;
use common::ports::outbound::LogRecord;
use tokio::net::TcpListener;
use tokio::signal;

/// リクエスト本文の上限（スマートフォンの写真が収まる大きさ）
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::page_handler))
        .route("/map", get(routes::map_handler))
        .route("/zones", post(routes::zone_update_handler))
        .route("/zones.json", get(routes::zones_json_handler))
        .route("/chat", post(routes::chat_handler))
        .route("/news/ack", post(routes::news_ack_handler))
        .route("/news/pins", post(routes::news_pins_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// bind してシグナルを受けるまで待ち受ける
pub async fn serve(state: AppState, bind: &str) -> Result<(), Error> {
    let log = state.log.clone();
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| Error::io(format!("failed to bind {}: {}", bind, e)))?;
    log.emit(
        LogRecord::info("server started")
            .layer("http")
            .kind("lifecycle")
            .field("bind", bind),
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::io(format!("server error: {}", e)))?;
    log.emit(LogRecord::info("server stopped").layer("http").kind("lifecycle"));
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        // ハンドラを登録できなければ Ctrl+C では止めない（SIGTERM は有効）
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
