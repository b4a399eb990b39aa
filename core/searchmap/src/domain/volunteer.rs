//! ボランティアからの更新情報（CSV の表）

use common::error::Error;
use serde::Serialize;

pub const UPDATE_ID: &str = "Update_ID";
pub const VOLUNTEER_NAME: &str = "Volunteer_Name";
pub const UPDATE_DATE: &str = "Update_Date";
pub const LOCATION_REPORTED: &str = "Location_Reported";
pub const DETAILS: &str = "Details";
pub const FOLLOW_UP_ACTION: &str = "Follow_Up_Action";

/// 空のファイルに書くときのヘッダー
pub const DEFAULT_HEADERS: [&str; 6] = [
    UPDATE_ID,
    VOLUNTEER_NAME,
    UPDATE_DATE,
    LOCATION_REPORTED,
    DETAILS,
    FOLLOW_UP_ACTION,
];

/// Update_Date の書式（日付と時刻の間は空白 2 つ）
pub const UPDATE_DATE_FORMAT: &str = "%m/%d/%Y  %I:%M:%S %p";

/// 1 件の更新
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolunteerUpdate {
    pub update_id: i64,
    pub volunteer_name: String,
    pub update_date: String,
    pub location_reported: String,
    pub details: String,
    pub follow_up_action: String,
}

impl VolunteerUpdate {
    fn value_for(&self, column: &str) -> String {
        match column {
            UPDATE_ID => self.update_id.to_string(),
            VOLUNTEER_NAME => self.volunteer_name.clone(),
            UPDATE_DATE => self.update_date.clone(),
            LOCATION_REPORTED => self.location_reported.clone(),
            DETAILS => self.details.clone(),
            FOLLOW_UP_ACTION => self.follow_up_action.clone(),
            _ => String::new(),
        }
    }
}

/// ヘッダー行付きの表。未知の列もそのまま保持して書き戻す
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl UpdateTable {
    pub fn parse_csv(text: &str) -> Result<Self, Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| Error::invalid_data(format!("volunteer updates: {}", e)))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| Error::invalid_data(format!("volunteer updates: {}", e)))?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn to_csv(&self) -> Result<String, Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| Error::invalid_data(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| Error::invalid_data(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::invalid_data(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::invalid_data(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// 行の列値（列が無い・行が短いときは空文字）
    pub fn cell<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.column(column)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// 既存の Update_ID の最大値。整数でない値があれば InvalidData
    pub fn max_update_id(&self) -> Result<Option<i64>, Error> {
        let mut max: Option<i64> = None;
        for row in &self.rows {
            let raw = self.cell(row, UPDATE_ID).trim();
            if raw.is_empty() {
                continue;
            }
            let id: i64 = raw.parse().map_err(|_| {
                Error::invalid_data(format!("Update_ID '{}' is not an integer", raw))
            })?;
            max = Some(max.map_or(id, |m| m.max(id)));
        }
        Ok(max)
    }

    /// ヘッダー名で列を合わせて 1 行追加する（ヘッダーが無ければ標準のヘッダーを使う）
    pub fn append(&mut self, update: &VolunteerUpdate) {
        if self.headers.is_empty() {
            self.headers = DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect();
        }
        let row = self.headers.iter().map(|h| update.value_for(h)).collect();
        self.rows.push(row);
    }

    /// 画面表示・プロンプト用に既知の列を取り出す（Update_ID が読めない行は 0）
    pub fn updates(&self) -> Vec<VolunteerUpdate> {
        self.rows
            .iter()
            .map(|row| VolunteerUpdate {
                update_id: self.cell(row, UPDATE_ID).trim().parse().unwrap_or(0),
                volunteer_name: self.cell(row, VOLUNTEER_NAME).to_string(),
                update_date: self.cell(row, UPDATE_DATE).to_string(),
                location_reported: self.cell(row, LOCATION_REPORTED).to_string(),
                details: self.cell(row, DETAILS).to_string(),
                follow_up_action: self.cell(row, FOLLOW_UP_ACTION).to_string(),
            })
            .collect()
    }
}
