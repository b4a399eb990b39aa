//! RTF → プレーンテキスト
//!
//! 人物説明は RTF で置かれている。書式は捨て、本文だけを取り出す。
//! フォント表・色表などの宛先グループと `{\*...}` は中身ごと読み飛ばす。

use common::error::Error;
use regex::Regex;

const TOKEN: &str = r"\\([a-zA-Z]+)(-?\d+)? ?|\\'([0-9a-fA-F]{2})|\\([^a-zA-Z'])|([{}])|(\r?\n)|([^\\{}\r\n]+)";

/// 中身を出力しない宛先
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl", "colortbl", "stylesheet", "info", "pict", "header", "footer", "listtable",
    "listoverridetable", "generator", "xmlnstbl", "rsidtbl",
];

#[derive(Clone, Copy)]
struct GroupState {
    skip: bool,
    /// `\uN` の後に読み捨てる代替文字数（`\ucN`）
    uc: usize,
}

pub fn rtf_to_text(rtf: &str) -> Result<String, Error> {
    let re = Regex::new(TOKEN).map_err(|e| Error::invalid_data(format!("rtf tokenizer: {}", e)))?;
    let mut out = String::new();
    let mut stack: Vec<GroupState> = Vec::new();
    let mut state = GroupState { skip: false, uc: 1 };
    // `{` の直後（宛先判定に使う）
    let mut group_start = false;
    // `\uN` の後に残っている代替文字数
    let mut pending_skip = 0usize;

    for caps in re.captures_iter(rtf) {
        let at_group_start = std::mem::replace(&mut group_start, false);

        if let Some(word) = caps.get(1) {
            let word = word.as_str();
            let param = caps.get(2).and_then(|p| p.as_str().parse::<i32>().ok());
            if at_group_start && SKIPPED_DESTINATIONS.contains(&word) {
                state.skip = true;
            }
            if state.skip {
                continue;
            }
            match word {
                "par" | "line" | "sect" | "page" => out.push('\n'),
                "tab" => out.push('\t'),
                "emdash" => out.push('\u{2014}'),
                "endash" => out.push('\u{2013}'),
                "lquote" => out.push('\u{2018}'),
                "rquote" => out.push('\u{2019}'),
                "ldblquote" => out.push('\u{201C}'),
                "rdblquote" => out.push('\u{201D}'),
                "bullet" => out.push('\u{2022}'),
                "uc" => state.uc = param.map_or(1, |n| n.max(0) as usize),
                "u" => {
                    if let Some(n) = param {
                        let code = if n < 0 { n + 65536 } else { n };
                        if let Some(c) = char::from_u32(code as u32) {
                            out.push(c);
                        }
                        pending_skip = state.uc;
                    }
                }
                _ => {}
            }
        } else if let Some(hex) = caps.get(3) {
            if state.skip {
                continue;
            }
            if pending_skip > 0 {
                pending_skip -= 1;
                continue;
            }
            // \'hh は Windows-1252 とみなし、Latin-1 として解釈する
            if let Ok(b) = u8::from_str_radix(hex.as_str(), 16) {
                out.push(char::from(b));
            }
        } else if let Some(symbol) = caps.get(4) {
            let symbol = symbol.as_str();
            if symbol == "*" && at_group_start {
                state.skip = true;
            }
            if state.skip {
                continue;
            }
            match symbol {
                "\\" | "{" | "}" => out.push_str(symbol),
                "~" => out.push('\u{00A0}'),
                "_" => out.push('-'),
                "\n" | "\r" => out.push('\n'),
                _ => {}
            }
        } else if let Some(brace) = caps.get(5) {
            if brace.as_str() == "{" {
                stack.push(state);
                group_start = true;
            } else if let Some(outer) = stack.pop() {
                state = outer;
            }
            pending_skip = 0;
        } else if caps.get(6).is_some() {
            // 生の改行は RTF では意味を持たない
        } else if let Some(text) = caps.get(7) {
            if state.skip {
                continue;
            }
            let mut chars = text.as_str().chars();
            while pending_skip > 0 {
                if chars.next().is_none() {
                    break;
                }
                pending_skip -= 1;
            }
            out.push_str(chars.as_str());
        }
    }
    Ok(out.trim().to_string())
}
