//! オブジェクトストア Outbound ポート
//!
//! 人物フォルダ（説明 .rtf / 更新 .csv / 写真）、news/ フォルダ、アップロード画像はすべてこの trait 経由で読み書きする。
//! 書き込みは世代番号（generation）による前提条件を付けられる。CSV の読み込み→追記→全体書き戻しを
//! 楽観的並行制御で守るため。

use crate::error::Error;

/// 一覧取得で返すメタデータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub name: String,
    pub size: u64,
    pub generation: i64,
}

/// 読み込んだオブジェクト（本体と読み込み時点の世代番号）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    pub bytes: Vec<u8>,
    pub generation: i64,
}

impl StoredObject {
    /// UTF-8 として解釈する（不正なバイトは置換文字にする）
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// 書き込みの前提条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// 無条件に上書き
    None,
    /// オブジェクトが存在しないときだけ作成
    DoesNotExist,
    /// 現在の世代番号が一致するときだけ上書き
    GenerationMatch(i64),
}

/// オブジェクトストア抽象（Outbound ポート）
///
/// 実装は `common::adapter::GcsObjectStore`、`LocalObjectStore`、テスト用の `MemoryObjectStore`。
pub trait ObjectStore: Send + Sync {
    /// バケット名など、`gs://` URI の組み立てに使う識別子
    fn bucket(&self) -> &str;

    /// prefix で始まるオブジェクトを名前順で返す
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error>;

    /// オブジェクトを読む。存在しなければ `Error::ExternalService`
    fn get(&self, name: &str) -> Result<StoredObject, Error>;

    /// オブジェクトを書き、新しい世代番号を返す。前提条件が崩れていれば `Error::Conflict`
    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
        precondition: Precondition,
    ) -> Result<i64, Error>;

    /// `gs://bucket/name` 形式の URI
    fn uri(&self, name: &str) -> String {
        format!("gs://{}/{}", self.bucket(), name)
    }
}
