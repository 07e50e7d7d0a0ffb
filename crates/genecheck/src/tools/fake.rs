//! Fake tool for deterministic testing.

use super::Tool;
use async_trait::async_trait;
use gene_shared::ToolError;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Tool with a fixed answer that records every invocation
pub struct FakeTool {
    name: String,
    result: Result<Value, String>,
    calls: Arc<Mutex<Vec<Value>>>,
}

impl FakeTool {
    /// Always return `value`.
    pub fn returning(value: Value) -> Self {
        Self {
            name: "fake".to_string(),
            result: Ok(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with an invocation error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            name: "fake".to_string(),
            result: Err(message.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Name used in invocation errors.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_args(&self) -> Option<Value> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Tool for FakeTool {
    async fn invoke(&self, args: &Value) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(args.clone());
        self.result
            .clone()
            .map_err(|message| ToolError::invocation(&self.name, message))
    }
}
