use crate::adapter::config::DEFAULT_CONFIG_PATH;
use crate::usecase::news_search::{NewsSearchOptions, DEFAULT_DAYS};
use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;
use std::path::PathBuf;

/// 実行するコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// ダッシュボードを起動する（既定）
    Serve { bind: Option<String> },
    /// 読み込んだゾーンを JSON で出力する
    Zones,
    /// News API を検索する
    NewsSearch(NewsSearchOptions),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Serve { .. } => "serve",
            Self::Zones => "zones",
            Self::NewsSearch(_) => "news-search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub config_path: PathBuf,
    pub command: Command,
}

/// 解析結果: 通常の Config / 補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

pub fn build_clap_command() -> clap::Command {
    clap::Command::new("searchmap")
        .about("Volunteer search coordination dashboard")
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .value_name("file")
                .help("Path to config.json")
                .default_value(DEFAULT_CONFIG_PATH)
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .num_args(1),
        )
        .arg(
            clap::Arg::new("bind")
                .long("bind")
                .value_name("addr")
                .help("Listen address (overrides \"bind\" in the config)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
        .subcommand(
            clap::Command::new("serve")
                .about("Start the dashboard (default)")
                .arg(
                    clap::Arg::new("bind")
                        .long("bind")
                        .value_name("addr")
                        .help("Listen address (overrides \"bind\" in the config)")
                        .num_args(1),
                ),
        )
        .subcommand(clap::Command::new("zones").about("Print the loaded zones as JSON"))
        .subcommand(
            clap::Command::new("news-search")
                .about("Search the News API with the built-in incident queries")
                .arg(
                    clap::Arg::new("days")
                        .long("days")
                        .value_name("n")
                        .help("Number of past days to search")
                        .default_value("7")
                        .value_parser(value_parser!(i64).range(1..)),
                )
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("file")
                        .help("Also write the article list to this file")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    clap::Arg::new("validate")
                        .long("validate")
                        .help("Ask the model which articles may hold clues about the missing person")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn matches_to_config(matches: &clap::ArgMatches) -> Config {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let top_bind = matches.get_one::<String>("bind").cloned();
    let command = match matches.subcommand() {
        Some(("zones", _)) => Command::Zones,
        Some(("news-search", sub)) => Command::NewsSearch(NewsSearchOptions {
            days: sub.get_one::<i64>("days").copied().unwrap_or(DEFAULT_DAYS),
            output: sub.get_one::<PathBuf>("output").cloned(),
            validate: sub.get_flag("validate"),
        }),
        Some(("serve", sub)) => Command::Serve {
            bind: sub.get_one::<String>("bind").cloned().or(top_bind),
        },
        _ => Command::Serve { bind: top_bind },
    };
    Config {
        config_path,
        command,
    }
}

/// コマンドラインを解析する。補完生成が要求された場合は ParseOutcome::GenerateCompletion を返す。
pub fn parse_args() -> Result<ParseOutcome, Error> {
    parse_args_from(std::env::args_os())
}

pub fn parse_args_from<I, T>(args: I) -> Result<ParseOutcome, Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match build_clap_command().try_get_matches_from(args) {
        Ok(m) => m,
        Err(e) if e.use_stderr() => return Err(Error::usage(e.to_string())),
        // --help / --version は clap に表示させて正常終了
        Err(e) => {
            let _ = e.print();
            std::process::exit(0);
        }
    };
    if let Some(&shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(shell));
    }
    Ok(ParseOutcome::Config(matches_to_config(&matches)))
}

/// 補完スクリプトを標準出力に出力する。
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    clap_complete::generate(shell, &mut cmd, "searchmap", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        match parse_args_from(args.iter().copied()).unwrap() {
            ParseOutcome::Config(c) => c,
            ParseOutcome::GenerateCompletion(_) => panic!("unexpected completion"),
        }
    }

    #[test]
    fn test_default_is_serve() {
        let c = parse(&["searchmap"]);
        assert_eq!(c.config_path, PathBuf::from("config/config.json"));
        assert_eq!(c.command, Command::Serve { bind: None });
    }

    #[test]
    fn test_serve_bind_and_config() {
        let c = parse(&["searchmap", "-c", "my.json", "serve", "--bind", "127.0.0.1:9000"]);
        assert_eq!(c.config_path, PathBuf::from("my.json"));
        assert_eq!(
            c.command,
            Command::Serve {
                bind: Some("127.0.0.1:9000".to_string())
            }
        );
        let c = parse(&["searchmap", "--bind", "127.0.0.1:9001"]);
        assert_eq!(c.command.name(), "serve");
    }

    #[test]
    fn test_news_search_options() {
        let c = parse(&["searchmap", "news-search", "--days", "14", "-o", "out.txt", "--validate"]);
        assert_eq!(
            c.command,
            Command::NewsSearch(NewsSearchOptions {
                days: 14,
                output: Some(PathBuf::from("out.txt")),
                validate: true,
            })
        );
        let c = parse(&["searchmap", "news-search"]);
        assert_eq!(c.command, Command::NewsSearch(NewsSearchOptions::default()));
    }

    #[test]
    fn test_zones_with_global_config() {
        let c = parse(&["searchmap", "zones", "--config", "x.json"]);
        assert_eq!(c.command, Command::Zones);
        assert_eq!(c.config_path, PathBuf::from("x.json"));
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(
            parse_args_from(["searchmap", "news-search", "--days", "0"]),
            Err(Error::Usage(_))
        ));
        assert!(matches!(
            parse_args_from(["searchmap", "frobnicate"]),
            Err(Error::Usage(_))
        ));
    }

    #[test]
    fn test_generate_completion() {
        assert!(matches!(
            parse_args_from(["searchmap", "--generate", "bash"]),
            Ok(ParseOutcome::GenerateCompletion(Shell::Bash))
        ));
    }
}
