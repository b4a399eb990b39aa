//! searchmap 共通ライブラリ
//!
//! ダッシュボード本体（searchmap）が使うエラー型・構造化ログ・オブジェクトストア・
//! 生成 AI プロバイダ・ツール宣言を提供します。

/// エラーハンドリング
pub mod error;

/// ドメイン型（Newtype）
pub mod domain;

/// Ports & Adapters のポート定義
pub mod ports;

/// ポートの標準実装
pub mod adapter;

/// LLMプロバイダ
pub mod llm;

/// ツール宣言と引数検証
pub mod tool;
