//! 配線: 設定から標準アダプタを選び、ユースケースと HTTP 状態を組み立てる
//!
//! ここでの失敗（設定不備・ゾーンが読めない等）はすべて起動前に返し、サーバーは立ち上げない。

use crate::adapter::config::{AppConfig, ChatPersistence, StorageConfig, ZoneSource};
use crate::adapter::http::{AppState, PageSettings};
use crate::adapter::http::session_store::SessionStore;
use crate::adapter::{AssistantTools, BucketChatArchive, NewsApiClient, NoChatArchive};
use crate::domain::{AssistantCommand, LatLng, Zone};
use crate::ports::outbound::ChatArchive;
use crate::usecase::chat_bridge::ChatBridge;
use crate::usecase::news_feed::NewsFeed;
use crate::usecase::person_profile::read_profile;
use crate::usecase::session_init::SessionFactory;
use crate::usecase::tessellation::{boundary_outline, load_boundary, tessellate};
use crate::usecase::volunteer_insights::VolunteerInsights;
use crate::usecase::zone_loader::load_zones_from_csv;
use common::adapter::{
    FileJsonLog, GcsObjectStore, LocalObjectStore, ServiceAccountKey, ServiceAccountTokenSource,
    StderrLog, StdClock, UuidGenerator,
};
use common::domain::ModelName;
use common::error::Error;
use common::llm::{create_provider, LlmProvider, ProviderSettings, ProviderType, VertexTarget};
use common::ports::outbound::{AccessTokenSource, Log, LogRecord, ObjectStore};
use common::tool::ToolSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// ログ出力先（log_path があれば JSONL ファイル、無ければ stderr）
pub fn open_log(config: &AppConfig) -> Result<Arc<dyn Log>, Error> {
    let log: Arc<dyn Log> = match &config.log_path {
        Some(path) => Arc::new(FileJsonLog::open(path)?),
        None => Arc::new(StderrLog),
    };
    Ok(log)
}

/// ゾーンと（分割時は）境界線
pub fn load_zones(source: &ZoneSource) -> Result<(Vec<Zone>, Vec<Vec<LatLng>>), Error> {
    match source {
        ZoneSource::Csv { path } => Ok((load_zones_from_csv(path)?, Vec::new())),
        ZoneSource::Tessellation {
            geojson_path,
            cells,
            seed,
        } => {
            let boundary = load_boundary(geojson_path)?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            let zones = tessellate(&boundary, *cells, &mut rng)?;
            Ok((zones, boundary_outline(&boundary)))
        }
    }
}

/// サービスアカウント鍵があればアクセストークン源を作る
pub fn token_source(config: &AppConfig) -> Result<Option<Arc<dyn AccessTokenSource>>, Error> {
    match &config.service_account_path {
        Some(path) => {
            let key = ServiceAccountKey::from_file(path)?;
            let tokens: Arc<dyn AccessTokenSource> = Arc::new(ServiceAccountTokenSource::new(key));
            Ok(Some(tokens))
        }
        None => Ok(None),
    }
}

pub fn object_store(
    config: &AppConfig,
    tokens: Option<Arc<dyn AccessTokenSource>>,
) -> Result<Arc<dyn ObjectStore>, Error> {
    match &config.storage {
        StorageConfig::Gcs { bucket } => {
            let tokens = tokens
                .ok_or_else(|| Error::config("'service_account_path' is required for storage \"gcs\""))?;
            Ok(Arc::new(GcsObjectStore::new(bucket.clone(), tokens)))
        }
        StorageConfig::Local { bucket, dir } => {
            Ok(Arc::new(LocalObjectStore::new(dir.clone(), bucket.clone())))
        }
    }
}

pub fn llm_provider(
    config: &AppConfig,
    tokens: Option<Arc<dyn AccessTokenSource>>,
) -> Result<Arc<dyn LlmProvider>, Error> {
    let llm = &config.llm;
    let vertex = match (&llm.project_id, llm.provider) {
        (Some(project_id), ProviderType::Gemini) => Some(VertexTarget {
            project_id: project_id.clone(),
            location: llm.location.clone(),
            tokens: tokens
                .ok_or_else(|| Error::config("'service_account_path' is required for Vertex AI"))?,
        }),
        _ => None,
    };
    let provider = create_provider(ProviderSettings {
        provider_type: llm.provider,
        model: Some(ModelName::new(llm.model.clone())),
        vertex,
        api_key_env: llm.api_key_env.clone(),
        temperature: None,
    })?;
    Ok(Arc::new(provider))
}

/// ダッシュボードの共有状態を組み立てる
pub fn wire_dashboard(config: &AppConfig, log: Arc<dyn Log>) -> Result<AppState, Error> {
    let (zones, boundary) = load_zones(&config.zone_source)?;
    log.emit(
        LogRecord::info("zones loaded")
            .layer("wiring")
            .kind("config")
            .field("zones", zones.len()),
    );

    let tokens = token_source(config)?;
    let store = object_store(config, tokens.clone())?;
    let llm = llm_provider(config, tokens)?;
    let tools: Arc<dyn ToolSet<Command = AssistantCommand> + Send + Sync> =
        Arc::new(AssistantTools::new(config.default_volunteer.clone()));
    let ids = Arc::new(UuidGenerator);

    let insights = Arc::new(VolunteerInsights::new(
        store.clone(),
        config.volunteer_csv.clone(),
        config.default_volunteer.clone(),
        Arc::new(StdClock),
        log.clone(),
    ));
    let archive: Arc<dyn ChatArchive> = match config.chat_persistence {
        ChatPersistence::Bucket => Arc::new(BucketChatArchive::new(store.clone())),
        ChatPersistence::Ephemeral => Arc::new(NoChatArchive),
    };

    let profile = match read_profile(store.as_ref(), &config.person_id) {
        Ok(profile) => Some(profile),
        Err(e) => {
            log.emit(
                LogRecord::error("person profile could not be read")
                    .layer("wiring")
                    .kind("storage")
                    .field("person_id", config.person_id.as_str())
                    .field("error", e.to_string()),
            );
            None
        }
    };

    let chat = ChatBridge::new(
        llm.clone(),
        tools.clone(),
        store.clone(),
        insights.clone(),
        archive,
        ids.clone(),
        log.clone(),
    );
    let news = NewsFeed::new(store, llm, tools, log.clone());
    let factory = SessionFactory::new(zones, boundary, insights, ids, log.clone());

    Ok(AppState {
        sessions: Arc::new(SessionStore::new()),
        factory: Arc::new(factory),
        chat: Arc::new(chat),
        news: Arc::new(news),
        profile: Arc::new(profile),
        page: Arc::new(PageSettings {
            maps_api_key: config.google_maps_api_key.clone(),
            people: config.people.clone(),
        }),
        log,
    })
}

/// news-search コマンド用の検索クライアント
pub fn news_client(config: &AppConfig) -> Result<NewsApiClient, Error> {
    let key = config
        .news_api_key
        .clone()
        .ok_or_else(|| Error::config("'news_api_key' is required for news-search"))?;
    Ok(NewsApiClient::new(config.news_api_url.clone(), key))
}
