//! Model-call service abstraction.
//!
//! The cascade only sees [`ModelClient`]. Production uses [`OpenAiClient`]
//! against an OpenAI-compatible chat-completions endpoint; tests use
//! [`FakeModelClient`] with scripted replies.

pub mod fake;
pub mod openai;

use async_trait::async_trait;
use gene_shared::{Conversation, Message, ModelError};
use serde_json::Value;

pub use fake::{FakeModelClient, FakeModelClientBuilder, RecordedCall};
pub use openai::OpenAiClient;

/// Sampling temperature for every call. Fixed so verification is reproducible.
pub const TEMPERATURE: f32 = 0.0;

/// A reasoning engine that continues a conversation by one message.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Return the next message for `conversation`.
    ///
    /// When `tools` is given, the reply may be a tool request
    /// ([`Message::is_tool_request`]) instead of text.
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: Option<&[Value]>,
    ) -> Result<Message, ModelError>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}
