//! エラーハンドリング
//!
//! 起動時の設定エラー（致命的）、外部サービスのエラー（回復可能）、
//! データ検証エラー（回復可能・操作は no-op）を 1 つの型に集約する。

/// エラー種別（表示・終了コードの判断に使う）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 設定・起動時入力の不備。起動を中止する
    Config,
    /// LLM・ストレージ等の外部サービス失敗。画面に表示して再試行を許す
    ExternalService,
    /// 入力データやツール引数の不備。状態は変えずに警告を出す
    DataValidation,
    /// CLI の使い方の誤り
    Usage,
    /// ローカル I/O
    Io,
}

/// エラー型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    /// 楽観的並行制御の前提条件が崩れた（他の書き込みが先に入った）
    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("{0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn external(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// HTTP 層の失敗（接続・ステータス）
    pub fn http(msg: impl Into<String>) -> Self {
        Self::external("http", msg)
    }

    /// 生成 AI API の失敗
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::external("llm", msg)
    }

    /// オブジェクトストアの失敗
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::external("storage", msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::ExternalService { .. } | Self::Conflict(_) => ErrorKind::ExternalService,
            Self::InvalidData(_) => ErrorKind::DataValidation,
            Self::Usage(_) => ErrorKind::Usage,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// 起動を止めるべきエラーか
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config | ErrorKind::Usage)
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// sysexits.h 準拠の終了コード
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage => 64,
            ErrorKind::DataValidation => 65,
            ErrorKind::ExternalService => 69,
            ErrorKind::Io => 74,
            ErrorKind::Config => 78,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
