//! 標準時刻実装（chrono::Local を委譲）

use crate::ports::outbound::Clock;
use chrono::{DateTime, Local};

/// システム時刻を使う Clock 実装
#[derive(Debug, Clone, Default)]
pub struct StdClock;

impl Clock for StdClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// 常に同じ時刻を返す Clock 実装（テスト用）
#[derive(Debug, Clone)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
