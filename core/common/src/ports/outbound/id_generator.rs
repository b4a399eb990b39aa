//! ID 生成 Outbound ポート
//!
//! アップロード画像のオブジェクト名・セッション ID に使う。テストでは固定 ID を返す実装を渡せる。

/// 一意な ID を生成する抽象（Outbound ポート）
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}
