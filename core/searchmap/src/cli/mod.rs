//! CLI（引数解析と補完）

pub mod args;

pub use args::{parse_args, print_completion, Command, ParseOutcome};
