//! アダプター（Outbound ポートの標準実装）
//!
//! usecase はポートの trait 経由でのみ時刻・ID・ログ・オブジェクトストアに触れる。
//! 実装は標準実装（Std*）やテスト用のメモリ実装を注入する。

pub mod file_json_log;
pub mod gcs_object_store;
pub mod local_object_store;
pub mod memory_object_store;
pub mod service_account;
pub mod std_clock;
pub mod std_id_generator;

pub use file_json_log::{FileJsonLog, NoopLog, StderrLog};
pub use gcs_object_store::GcsObjectStore;
pub use local_object_store::LocalObjectStore;
pub use memory_object_store::MemoryObjectStore;
pub use service_account::{ServiceAccountKey, ServiceAccountTokenSource, StaticTokenSource};
pub use std_clock::{FixedClock, StdClock};
pub use std_id_generator::{SequenceIdGenerator, UuidGenerator};
