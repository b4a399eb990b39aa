//! News API の定型クエリ検索（ダッシュボードとは独立した CLI コマンド）

use crate::ports::outbound::{Article, NewsSource};
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use common::llm::{GenerateRequest, LlmProvider, Message};
use common::ports::outbound::{Log, LogRecord};
use std::fmt::Write as _;
use std::path::PathBuf;

pub const DEFAULT_DAYS: i64 = 7;

/// サンフランシスコの事件・事故を拾うための定型クエリ
pub const QUERIES: [&str; 43] = [
    "car crash OR accident AND 'San Francisco'",
    "fight OR assault OR violent incident AND 'San Francisco'",
    "wildlife attack OR animal attack AND 'San Francisco'",
    "natural disaster OR earthquake OR flood AND 'San Francisco'",
    "human trafficking OR smuggling OR abduction AND 'San Francisco'",
    "terrorist attack OR explosion OR bombing AND 'San Francisco'",
    "lost hiker OR missing traveler AND 'San Francisco'",
    "rescue operation OR search mission AND 'San Francisco'",
    "San Francisco AND collision",
    "fatal incident AND 'San Francisco'",
    "major incident OR emergency AND 'San Francisco'",
    "breaking news OR urgent report AND 'San Francisco'",
    "evacuation order OR emergency response AND 'San Francisco'",
    "serious injury OR fatality AND 'San Francisco'",
    "vehicle collision OR traffic accident AND 'San Francisco'",
    "hit and run OR pedestrian accident AND 'San Francisco'",
    "public transit delay OR Muni disruption AND 'San Francisco'",
    "bridge accident OR ferry mishap AND 'San Francisco'",
    "armed robbery OR theft AND 'San Francisco'",
    "shooting OR gun violence AND 'San Francisco'",
    "domestic violence OR neighborhood disturbance AND 'San Francisco'",
    "cybercrime OR online scam AND 'San Francisco'",
    "drug bust OR illegal operation AND 'San Francisco'",
    "missing child OR missing adult AND 'San Francisco'",
    "search and rescue OR missing pet AND 'San Francisco'",
    "silver alert OR amber alert AND 'San Francisco'",
    "wildfire OR forest fire AND 'San Francisco'",
    "storm damage OR landslide AND 'San Francisco'",
    "tsunami warning OR extreme weather AND 'San Francisco'",
    "power outage OR blackout AND 'San Francisco'",
    "toxic spill OR hazardous material AND 'San Francisco'",
    "disease outbreak OR quarantine AND 'San Francisco'",
    "public health emergency OR contamination AND 'San Francisco'",
    "homeless crisis OR encampment issue AND 'San Francisco'",
    "protest OR demonstration AND 'San Francisco'",
    "community rally OR strike AND 'San Francisco'",
    "rare phenomenon OR strange occurrence AND 'San Francisco'",
    "celebrity scandal OR high-profile arrest AND 'San Francisco'",
    "white-collar crime OR embezzlement AND 'San Francisco'",
    "organized crime OR gang activity AND 'San Francisco'",
    "explosion OR chemical fire AND 'San Francisco'",
    "boat accident OR ferry crash AND 'San Francisco'",
    "construction accident OR workplace injury AND 'San Francisco'",
];

const VALIDATE_PROMPT: &str = "You are tasked with analyzing a list of articles to identify the ones that might provide clues about the whereabouts of a missing adult in San Francisco.
The articles must focus on specific incidents or details that provide actionable hints about the missing person.

Guidelines:

Include Only Relevant Articles: Select articles that provide specific clues, such as sightings, found belongings, or witness accounts related to the missing person.
Focus on San Francisco: The incident must have occurred within San Francisco and reference a specific location whenever possible.
Exclude Duplicates: Ensure that each unique incident is included only once.
Incident Types to Consider:
Sightings or reports of individuals matching the missing person's description.
Found personal items such as clothing, identification, or belongings linked to the missing person.
Witness reports or unusual events that could involve the missing person.
Relevant accidents, emergencies, or violent incidents tied to specific locations.
Note: Exclude generic articles that do not provide concrete information or actionable details about the missing person.
Focus on those that offer clear, location-specific clues or connections to the case.";

/// news-search コマンドのオプション
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsSearchOptions {
    pub days: i64,
    pub output: Option<PathBuf>,
    pub validate: bool,
}

impl Default for NewsSearchOptions {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            output: None,
            validate: false,
        }
    }
}

/// 全クエリを `today - days` から `today` の範囲で検索して連結する。失敗したクエリはログに出して飛ばす
pub fn fetch_combined(
    source: &dyn NewsSource,
    today: NaiveDate,
    days: i64,
    log: &dyn Log,
) -> Vec<Article> {
    let from = today - Duration::days(days);
    let mut articles = Vec::new();
    for query in QUERIES {
        match source.search(query, from, today) {
            Ok(found) => {
                log.emit(
                    LogRecord::info("news query fetched")
                        .layer("usecase")
                        .kind("news")
                        .field("query", query)
                        .field("articles", found.len()),
                );
                articles.extend(found);
            }
            Err(e) => log.emit(
                LogRecord::warn("news query failed")
                    .layer("usecase")
                    .kind("news")
                    .field("query", query)
                    .field("error", e.to_string()),
            ),
        }
    }
    articles
}

/// 番号付きの一覧にする
pub fn format_articles(articles: &[Article]) -> String {
    if articles.is_empty() {
        return "No articles found.\n".to_string();
    }
    let mut out = format!("Found {} articles:\n\n", articles.len());
    for (i, a) in articles.iter().enumerate() {
        let _ = write!(
            out,
            "{}. {}\n   Source: {}\n   Published At: {}\n   URL: {}\n\n",
            i + 1,
            a.title,
            a.source.name,
            a.published_at,
            a.url
        );
    }
    out
}

/// 一覧をモデルに渡し、行方不明者の手がかりになりそうな記事だけを選ばせる
pub fn validate(llm: &dyn LlmProvider, listing: &str) -> Result<String> {
    let contents = [Message::user(format!("{}\n{}", VALIDATE_PROMPT, listing))];
    let reply = llm
        .generate(&GenerateRequest {
            system_instruction: None,
            contents: &contents,
            tools: &[],
        })
        .context("failed to validate articles with the model")?;
    Ok(reply.joined_text())
}

/// 検索・整形・（任意で）検証・出力までを行い、標準出力に出す文字列を返す
pub fn run(
    options: &NewsSearchOptions,
    source: &dyn NewsSource,
    llm: Option<&dyn LlmProvider>,
    today: NaiveDate,
    log: &dyn Log,
) -> Result<String> {
    let articles = fetch_combined(source, today, options.days, log);
    let listing = format_articles(&articles);
    if let Some(path) = &options.output {
        std::fs::write(path, &listing)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if !options.validate {
        return Ok(listing);
    }
    let llm = llm.context("--validate needs an LLM provider")?;
    validate(llm, &listing)
}
