//! OpenAI-compatible chat-completions client.
//!
//! Works against OpenAI, Azure-style gateways and local servers that speak
//! the same protocol. Tool schemas are sent as `tools` function entries;
//! replies may carry `tool_calls` or the legacy `function_call` field. Only
//! the first requested call is kept.

use super::{ModelClient, TEMPERATURE};
use crate::config::LlmConfig;
use async_trait::async_trait;
use gene_shared::{Conversation, Message, ModelError, Role, ToolCall};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body kept in a [`ModelError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// HTTP model client
pub struct OpenAiClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ModelError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            timeout_secs,
        })
    }

    /// Build a client for `model` using the endpoint and key from config.
    ///
    /// A missing key is only a warning; local servers usually need none.
    pub fn from_config(config: &LlmConfig, model: &str) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(
                "{} is not set, calling {} without authentication",
                config.api_key_env, config.endpoint
            );
        }
        Self::new(&config.endpoint, model, api_key, config.timeout_secs)
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(
        &self,
        conversation: &Conversation,
        tools: Option<&[Value]>,
    ) -> Result<Message, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: conversation.iter().map(WireMessage::from_message).collect(),
            tools: tools
                .unwrap_or_default()
                .iter()
                .map(|function| WireTool {
                    kind: "function",
                    function,
                })
                .collect(),
            temperature: TEMPERATURE,
        };

        debug!(
            model = %self.model,
            messages = conversation.len(),
            tools = request.tools.len(),
            "chat completion request"
        );

        let mut builder = self.http_client.post(self.url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout(self.timeout_secs)
            } else {
                ModelError::Http(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ModelError::EmptyResponse)?;

        let message = message.into_message()?;
        debug!(model = %self.model, tool_request = message.is_tool_request(), "chat completion reply");
        Ok(message)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing)]
    function_call: Option<WireFunction>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

impl WireMessage {
    fn from_message(message: &Message) -> Self {
        let mut wire = WireMessage {
            role: message.role.as_str().to_string(),
            content: Some(message.content.clone()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
            function_call: None,
        };

        match (message.role, &message.tool_call) {
            (Role::Assistant, Some(call)) => {
                wire.content = None;
                wire.tool_calls = Some(vec![WireToolCall {
                    id: call.id.clone(),
                    kind: function_kind(),
                    function: WireFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                }]);
            }
            (Role::Tool, Some(call)) => {
                wire.tool_call_id = call.id.clone();
                wire.name = Some(call.name.clone());
            }
            _ => {}
        }

        wire
    }

    fn into_message(self) -> Result<Message, ModelError> {
        let requested = self
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|call| (call.id, call.function))
            .or_else(|| self.function_call.map(|f| (None, f)));

        if let Some((id, function)) = requested {
            // Ids tie the tool answer to the request; legacy replies have none.
            let id = id.unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
            return Ok(Message::tool_request(
                ToolCall::new(function.name, function.arguments).with_id(id),
            ));
        }

        match self.content {
            Some(content) if !content.is_empty() => Ok(Message::assistant(content)),
            _ => Err(ModelError::EmptyResponse),
        }
    }
}
