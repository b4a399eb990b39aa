//! news/ フォルダのニュース項目と「新着」表示の状態

use serde::Serialize;

/// news/*.txt 1 件分
///
/// 1 行目がタイトル、2〜5 行目が `source:` `published_at:` `url:` `coordinates:`（位置で決まる）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub object_name: String,
    pub name: String,
    pub source: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
    pub coordinates: Option<String>,
}

impl NewsItem {
    pub fn parse(object_name: &str, text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let value_at = |i: usize| -> Option<String> {
            lines
                .get(i)
                .and_then(|line| line.split_once(':'))
                .map(|(_, v)| v.trim().to_string())
        };
        Self {
            object_name: object_name.to_string(),
            name: lines.first().map(|l| l.trim().to_string()).unwrap_or_default(),
            source: value_at(1),
            published_at: value_at(2),
            url: value_at(3),
            coordinates: value_at(4),
        }
    }

    /// モデルに渡す説明文
    pub fn describe(&self) -> String {
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        format!(
            "{}\nSource: {}\nPublished At: {}\nURL: {}\nCoordinates: {}",
            self.name,
            or_na(&self.source),
            or_na(&self.published_at),
            or_na(&self.url),
            or_na(&self.coordinates)
        )
    }
}

/// 最新ニュースの告知状態
///
/// Pending（最新は隠す）→ acknowledge → Highlighted（次の描画で緑の "New update"）→ 描画後 Seen。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Announcement {
    #[default]
    Pending,
    Highlighted,
    Seen,
}

impl Announcement {
    /// Pending のときだけ Highlighted に進めて true を返す
    pub fn acknowledge(&mut self) -> bool {
        if *self == Self::Pending {
            *self = Self::Highlighted;
            true
        } else {
            false
        }
    }

    /// 描画が済んだら呼ぶ。Highlighted は 1 回だけ表示される
    pub fn rendered(&mut self) {
        if *self == Self::Highlighted {
            *self = Self::Seen;
        }
    }

    /// 表示する項目（Pending 中は最新＝最後の 1 件を除く）
    pub fn visible<'a>(&self, items: &'a [NewsItem]) -> &'a [NewsItem] {
        match self {
            Self::Pending => &items[..items.len().saturating_sub(1)],
            _ => items,
        }
    }

    pub fn highlights_newest(&self) -> bool {
        *self == Self::Highlighted
    }
}
