mod adapter;
mod cli;
mod domain;
mod ports;
mod usecase;
mod wiring;

#[cfg(test)]
mod tests;

use std::process;
use std::sync::Arc;
use adapter::config::{load_config, AppConfig};
use adapter::http::serve;
use cli::{parse_args, print_completion, Command, ParseOutcome};
use common::error::Error;
use common::llm::LlmProvider;
use common::ports::outbound::{Log, LogRecord};
use usecase::news_search;
use wiring::{llm_provider, load_zones, news_client, open_log, token_source, wire_dashboard};

/// Command をディスパッチする Runner（match は main レイヤーに集約）
struct Runner {
    config: AppConfig,
    log: Arc<dyn Log>,
}

impl Runner {
    fn run(&self, command: Command) -> Result<i32, Error> {
        let command_name = command.name();
        self.log.emit(
            LogRecord::info("command started")
                .layer("cli")
                .kind("lifecycle")
                .field("command", command_name),
        );

        let result = match command {
            Command::Serve { bind } => self.serve(bind),
            Command::Zones => self.zones(),
            Command::NewsSearch(options) => self.news_search(&options),
        };

        let code = result.as_ref().copied().unwrap_or(0);
        self.log.emit(
            LogRecord::info("command finished")
                .layer("cli")
                .kind("lifecycle")
                .field("command", command_name)
                .field("exit_code", code),
        );
        if let Err(ref e) = result {
            self.log
                .emit(LogRecord::error(e.to_string()).layer("cli").kind("error"));
        }
        result
    }

    fn serve(&self, bind: Option<String>) -> Result<i32, Error> {
        let state = wire_dashboard(&self.config, self.log.clone())?;
        let bind = bind.unwrap_or_else(|| self.config.bind.clone());
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::io(format!("failed to start runtime: {}", e)))?;
        runtime.block_on(serve(state, &bind))?;
        Ok(0)
    }

    fn zones(&self) -> Result<i32, Error> {
        let (zones, _) = load_zones(&self.config.zone_source)?;
        let json = serde_json::to_string_pretty(&zones)
            .map_err(|e| Error::invalid_data(format!("zones could not be serialized: {}", e)))?;
        println!("{}", json);
        Ok(0)
    }

    fn news_search(&self, options: &news_search::NewsSearchOptions) -> Result<i32, Error> {
        let client = news_client(&self.config)?;
        // 検証しないときはモデルの設定が無くても動かす
        let llm: Option<Arc<dyn LlmProvider>> = if options.validate {
            Some(llm_provider(&self.config, token_source(&self.config)?)?)
        } else {
            None
        };
        let today = chrono::Local::now().date_naive();
        let output = news_search::run(options, &client, llm.as_deref(), today, self.log.as_ref())
            .map_err(|e| Error::external("news", format!("{:#}", e)))?;
        print!("{}", output);
        Ok(0)
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("searchmap: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

pub fn run() -> Result<i32, Error> {
    let config = match parse_args()? {
        ParseOutcome::Config(c) => c,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
    };
    let app_config = load_config(&config.config_path)?;
    let log = open_log(&app_config)?;
    let runner = Runner {
        config: app_config,
        log,
    };
    runner.run(config.command)
}

fn print_usage() {
    eprintln!("Usage: searchmap [-c <config.json>] [serve [--bind <addr>] | zones | news-search [--days N] [-o FILE] [--validate]]");
}
