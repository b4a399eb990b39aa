//! config.json の読み込み（adapter 層）
//!
//! serde 用の Raw 構造体で受けてから、既定値を埋めて検証済みの AppConfig にする。

use common::error::Error;
use common::llm::ProviderType;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.json";
pub const DEFAULT_BIND: &str = "0.0.0.0:8501";
pub const DEFAULT_PERSON_ID: &str = "person1234";
pub const DEFAULT_VOLUNTEER: &str = "Volunteer";
pub const DEFAULT_LLM_ID: &str = "gemini-1.5-pro";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_NEWS_API_URL: &str = "https://newsapi.org/v2/everything";
pub const DEFAULT_TESSELLATION_CELLS: usize = 150;

/// ゾーンの供給元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneSource {
    /// WKT ポリゴンの CSV
    Csv { path: PathBuf },
    /// 境界 GeoJSON のボロノイ分割
    Tessellation {
        geojson_path: PathBuf,
        cells: usize,
        seed: Option<u64>,
    },
}

/// オブジェクトストアの実体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Gcs {
        bucket: String,
    },
    Local {
        bucket: String,
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPersistence {
    Ephemeral,
    Bucket,
}

/// LLM の接続設定（project_id があれば Vertex AI、無ければ API キー）
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: ProviderType,
    pub model: String,
    pub project_id: Option<String>,
    pub location: String,
    pub api_key_env: String,
}

/// 検証済みのアプリ設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub google_maps_api_key: String,
    /// GCS と Vertex AI の認証に使う
    pub service_account_path: Option<PathBuf>,
    pub zone_source: ZoneSource,
    pub storage: StorageConfig,
    pub person_id: String,
    pub volunteer_csv: String,
    pub default_volunteer: String,
    pub people: Vec<String>,
    pub llm: LlmConfig,
    pub news_api_url: String,
    pub news_api_key: Option<String>,
    pub chat_persistence: ChatPersistence,
    pub bind: String,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    google_maps_api_key: Option<String>,
    zone_source: Option<String>,
    zones_csv_path: Option<PathBuf>,
    geojson_path: Option<PathBuf>,
    tessellation_cells: Option<usize>,
    tessellation_seed: Option<u64>,
    service_account_path: Option<PathBuf>,
    bucket_name: Option<String>,
    storage: Option<String>,
    storage_dir: Option<PathBuf>,
    person_id: Option<String>,
    volunteer_csv: Option<String>,
    default_volunteer: Option<String>,
    people: Option<Vec<String>>,
    llm_provider: Option<String>,
    llm_id: Option<String>,
    project_id: Option<String>,
    location: Option<String>,
    api_key_env: Option<String>,
    news_api_url: Option<String>,
    news_api_key: Option<String>,
    chat_persistence: Option<String>,
    bind: Option<String>,
    log_path: Option<PathBuf>,
}

/// 設定ファイルを読む。読めない・壊れている・値が不正なら `Error::Config`
pub fn load_config(path: &Path) -> Result<AppConfig, Error> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("config file '{}' could not be read: {}", path.display(), e))
    })?;
    parse_config(&text)
}

pub fn parse_config(json: &str) -> Result<AppConfig, Error> {
    let raw: RawConfig =
        serde_json::from_str(json).map_err(|e| Error::config(format!("invalid config JSON: {}", e)))?;
    AppConfig::try_from(raw)
}

/// 空文字は未設定として扱う
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn required(value: Option<String>, key: &str) -> Result<String, Error> {
    non_empty(value).ok_or_else(|| Error::config(format!("'{}' is required", key)))
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = Error;

    fn try_from(raw: RawConfig) -> Result<Self, Error> {
        let zone_source = match non_empty(raw.zone_source).as_deref().unwrap_or("csv") {
            "csv" => ZoneSource::Csv {
                path: raw
                    .zones_csv_path
                    .ok_or_else(|| Error::config("'zones_csv_path' is required for zone_source \"csv\""))?,
            },
            "tessellation" => {
                let cells = raw.tessellation_cells.unwrap_or(DEFAULT_TESSELLATION_CELLS);
                if cells == 0 {
                    return Err(Error::config("'tessellation_cells' must be at least 1"));
                }
                ZoneSource::Tessellation {
                    geojson_path: raw.geojson_path.ok_or_else(|| {
                        Error::config("'geojson_path' is required for zone_source \"tessellation\"")
                    })?,
                    cells,
                    seed: raw.tessellation_seed,
                }
            }
            other => {
                return Err(Error::config(format!(
                    "unknown zone_source '{}' (expected \"csv\" or \"tessellation\")",
                    other
                )))
            }
        };

        let bucket = required(raw.bucket_name, "bucket_name")?;
        let storage = match non_empty(raw.storage).as_deref().unwrap_or("gcs") {
            "gcs" => {
                if raw.service_account_path.is_none() {
                    return Err(Error::config(
                        "'service_account_path' is required for storage \"gcs\"",
                    ));
                }
                StorageConfig::Gcs { bucket }
            }
            "local" => StorageConfig::Local {
                bucket,
                dir: raw
                    .storage_dir
                    .ok_or_else(|| Error::config("'storage_dir' is required for storage \"local\""))?,
            },
            other => {
                return Err(Error::config(format!(
                    "unknown storage '{}' (expected \"gcs\" or \"local\")",
                    other
                )))
            }
        };

        let provider_name = non_empty(raw.llm_provider).unwrap_or_else(|| "gemini".to_string());
        let provider = ProviderType::from_str(&provider_name).ok_or_else(|| {
            Error::config(format!(
                "unknown llm_provider '{}' (expected \"gemini\" or \"echo\")",
                provider_name
            ))
        })?;

        let chat_persistence = match non_empty(raw.chat_persistence)
            .as_deref()
            .unwrap_or("ephemeral")
        {
            "ephemeral" => ChatPersistence::Ephemeral,
            "bucket" => ChatPersistence::Bucket,
            other => {
                return Err(Error::config(format!(
                    "unknown chat_persistence '{}' (expected \"ephemeral\" or \"bucket\")",
                    other
                )))
            }
        };

        let person_id = non_empty(raw.person_id).unwrap_or_else(|| DEFAULT_PERSON_ID.to_string());
        let volunteer_csv = non_empty(raw.volunteer_csv)
            .unwrap_or_else(|| format!("{}/volunteer_updates.csv", person_id));

        let project_id = non_empty(raw.project_id);
        if provider == ProviderType::Gemini && project_id.is_some() && raw.service_account_path.is_none() {
            return Err(Error::config("'service_account_path' is required for Vertex AI (project_id is set)"));
        }

        Ok(AppConfig {
            google_maps_api_key: raw.google_maps_api_key.unwrap_or_default(),
            service_account_path: raw.service_account_path,
            zone_source,
            storage,
            person_id,
            volunteer_csv,
            default_volunteer: non_empty(raw.default_volunteer)
                .unwrap_or_else(|| DEFAULT_VOLUNTEER.to_string()),
            people: raw.people.unwrap_or_default(),
            llm: LlmConfig {
                provider,
                model: non_empty(raw.llm_id).unwrap_or_else(|| DEFAULT_LLM_ID.to_string()),
                project_id,
                location: non_empty(raw.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
                api_key_env: non_empty(raw.api_key_env)
                    .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string()),
            },
            news_api_url: non_empty(raw.news_api_url)
                .unwrap_or_else(|| DEFAULT_NEWS_API_URL.to_string()),
            news_api_key: non_empty(raw.news_api_key),
            chat_persistence,
            bind: non_empty(raw.bind).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            log_path: raw.log_path,
        })
    }
}

impl StorageConfig {
    pub fn bucket(&self) -> &str {
        match self {
            Self::Gcs { bucket, .. } | Self::Local { bucket, .. } => bucket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"{
        "zones_csv_path": "data/zones.csv",
        "bucket_name": "missing_people_search",
        "service_account_path": "config/service_account.json"
    }"#;

    #[test]
    fn test_defaults() {
        let c = parse_config(MINIMAL).unwrap();
        assert_eq!(
            c.zone_source,
            ZoneSource::Csv {
                path: PathBuf::from("data/zones.csv")
            }
        );
        assert_eq!(c.storage.bucket(), "missing_people_search");
        assert_eq!(c.person_id, "person1234");
        assert_eq!(c.volunteer_csv, "person1234/volunteer_updates.csv");
        assert_eq!(c.default_volunteer, "Volunteer");
        assert_eq!(c.llm.provider, ProviderType::Gemini);
        assert_eq!(c.llm.model, "gemini-1.5-pro");
        assert_eq!(c.llm.location, "us-central1");
        assert_eq!(c.llm.project_id, None);
        assert_eq!(c.chat_persistence, ChatPersistence::Ephemeral);
        assert_eq!(c.bind, "0.0.0.0:8501");
        assert!(c.people.is_empty());
    }

    #[test]
    fn test_tessellation_and_local_storage() {
        let c = parse_config(
            r#"{
                "zone_source": "tessellation",
                "geojson_path": "data/sf.geojson",
                "tessellation_seed": 42,
                "storage": "local",
                "storage_dir": "/tmp/bucket",
                "bucket_name": "b",
                "llm_provider": "echo",
                "chat_persistence": "bucket",
                "people": ["Alice", "Bob"]
            }"#,
        )
        .unwrap();
        assert_eq!(
            c.zone_source,
            ZoneSource::Tessellation {
                geojson_path: PathBuf::from("data/sf.geojson"),
                cells: 150,
                seed: Some(42),
            }
        );
        assert!(matches!(c.storage, StorageConfig::Local { .. }));
        assert_eq!(c.llm.provider, ProviderType::Echo);
        assert_eq!(c.chat_persistence, ChatPersistence::Bucket);
        assert_eq!(c.people, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for json in [
            "not json",
            r#"{"bucket_name":"b","service_account_path":"s"}"#,
            r#"{"zones_csv_path":"z","service_account_path":"s"}"#,
            r#"{"zones_csv_path":"z","bucket_name":"b"}"#,
            r#"{"zone_source":"hexagons","bucket_name":"b","service_account_path":"s"}"#,
            r#"{"zones_csv_path":"z","bucket_name":"b","service_account_path":"s","llm_provider":"gpt"}"#,
        ] {
            assert!(matches!(parse_config(json), Err(Error::Config(_))), "{}", json);
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(MINIMAL.as_bytes()).unwrap();
        assert!(load_config(&path).is_ok());
        assert!(matches!(
            load_config(&dir.path().join("missing.json")),
            Err(Error::Config(_))
        ));
    }
}
