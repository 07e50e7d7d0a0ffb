//! Fake model client for deterministic testing.
//!
//! Replies come from a script (consumed in order, the last entry repeating)
//! or from a responder closure that can inspect the conversation. Every call
//! is recorded so tests can assert on exactly what the model was shown.
//!
//! ```rust,ignore
//! let fake = FakeModelClientBuilder::new()
//!     .tool_call("get_domain_for_single_gene", r#"{"gene":"TP53"}"#)
//!     .text("Report: supported")
//!     .build();
//! ```

use super::ModelClient;
use async_trait::async_trait;
use gene_shared::{Conversation, Message, ModelError, ToolCall};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = dyn Fn(&Conversation, Option<&[Value]>) -> Result<Message, ModelError> + Send + Sync;

/// One call as seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub conversation: Conversation,
    pub tools: Option<Vec<Value>>,
}

/// Scripted stand-in for the model-call service
pub struct FakeModelClient {
    script: Mutex<VecDeque<Result<Message, ModelError>>>,
    responder: Option<Box<Responder>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeModelClient {
    /// Replies consumed in order; the last one repeats.
    pub fn new(responses: Vec<Result<Message, ModelError>>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            responder: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with the same assistant text.
    pub fn always_text(text: &str) -> Self {
        Self::new(vec![Ok(Message::assistant(text))])
    }

    /// Always fail with `error`.
    pub fn always_error(error: ModelError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Compute every reply from the conversation.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&Conversation, Option<&[Value]>) -> Result<Message, ModelError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn next_scripted(&self) -> Result<Message, ModelError> {
        let mut script = self.script.lock().unwrap();
        match script.len() {
            0 => Err(ModelError::EmptyResponse),
            1 => script[0].clone(),
            _ => script.pop_front().unwrap_or(Err(ModelError::EmptyResponse)),
        }
    }
}

#[async_trait]
impl ModelClient for FakeModelClient {
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: Option<&[Value]>,
    ) -> Result<Message, ModelError> {
        self.calls.lock().unwrap().push(RecordedCall {
            conversation: conversation.clone(),
            tools: tools.map(|t| t.to_vec()),
        });

        match &self.responder {
            Some(responder) => responder(conversation, tools),
            None => self.next_scripted(),
        }
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Builder for FakeModelClient
// ============================================================================

/// Builder for scripted fakes
#[derive(Default)]
pub struct FakeModelClientBuilder {
    responses: Vec<Result<Message, ModelError>>,
}

impl FakeModelClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an assistant text reply
    pub fn text(mut self, text: &str) -> Self {
        self.responses.push(Ok(Message::assistant(text)));
        self
    }

    /// Queue a tool request
    pub fn tool_call(mut self, name: &str, arguments: &str) -> Self {
        let id = format!("call_{}", self.responses.len() + 1);
        self.responses
            .push(Ok(Message::tool_request(ToolCall::new(name, arguments).with_id(id))));
        self
    }

    /// Queue a failed call
    pub fn error(mut self, error: ModelError) -> Self {
        self.responses.push(Err(error));
        self
    }

    pub fn build(self) -> FakeModelClient {
        FakeModelClient::new(self.responses)
    }
}
