//! Outbound ポート: アプリが外界（時刻・ID・ログ・オブジェクトストア・認証）を使うための trait

pub mod access_token;
pub mod clock;
pub mod id_generator;
pub mod log;
pub mod object_store;

pub use access_token::AccessTokenSource;
pub use clock::Clock;
pub use id_generator::IdGenerator;
pub use log::{now_iso8601, Log, LogLevel, LogRecord};
pub use object_store::{ObjectMeta, ObjectStore, Precondition, StoredObject};
