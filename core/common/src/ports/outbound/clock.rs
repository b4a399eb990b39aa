//! 時刻取得 Outbound ポート
//!
//! 更新行のタイムスタンプやニュース検索の期間計算に使う。テストでは固定時刻を注入する。

use chrono::{DateTime, Local};

/// 時刻取得の抽象
///
/// 実装は `common::adapter::StdClock` やテスト用の固定時刻など。
pub trait Clock: Send + Sync {
    /// 現在のローカル時刻
    fn now(&self) -> DateTime<Local>;
}
