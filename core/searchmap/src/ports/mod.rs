//! Ports & Adapters のポート定義（searchmap 固有）

pub mod outbound;
