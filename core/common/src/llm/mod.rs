//! LLMプロバイダの実装
//!
//! プロバイダ共通のトレイトとメッセージ型、Gemini / Echo の実装、ファクトリーを提供します。

pub mod provider;
pub mod gemini;
pub mod echo;
pub mod factory;

pub use provider::{
    Attachment, FinishReason, FunctionCall, GenerateRequest, LlmProvider, Message, ModelReply,
    Part, Role,
};
pub use factory::{create_provider, AnyProvider, ProviderSettings, ProviderType, VertexTarget};
