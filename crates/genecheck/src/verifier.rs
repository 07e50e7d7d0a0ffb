//! Tool-using verification agent.
//!
//! Each claim gets its own conversation with the verifier model. The model
//! may call registered tools any number of times; the loop ends when it
//! answers with a `Report:` marker or when the pass budget runs out. Every
//! pass counts against the budget, whether it produced a tool call, text
//! without the marker, or a failed model call.

use crate::llm::ModelClient;
use crate::prompts;
use crate::tools::ToolRegistry;
use gene_shared::{Claim, Conversation, Message, ToolCall, VerificationOutcome};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Passes per claim before giving up
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Marker that introduces the final finding.
pub const REPORT_MARKER: &str = "Report:";

/// Loop limits for one verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_iterations: usize,
    /// Pause before every model call
    pub call_delay: Duration,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            call_delay: Duration::from_secs(2),
        }
    }
}

impl AgentSettings {
    /// No delay between calls, for tests.
    pub fn immediate(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            call_delay: Duration::ZERO,
        }
    }
}

// ============================================================================
// Reply decoding
// ============================================================================

/// What a model reply means to the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    ToolRequest(ToolCall),
    /// Text after the last marker, trimmed
    Report(String),
    /// Text without the marker
    Unstructured(String),
}

impl AgentReply {
    pub fn decode(message: &Message) -> Self {
        if let Some(call) = &message.tool_call {
            return Self::ToolRequest(call.clone());
        }
        match message.content.rfind(REPORT_MARKER) {
            Some(at) => {
                Self::Report(message.content[at + REPORT_MARKER.len()..].trim().to_string())
            }
            None => Self::Unstructured(message.content.clone()),
        }
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Verifies claims against a tool registry.
pub struct VerificationAgent<'a> {
    model: &'a dyn ModelClient,
    registry: &'a ToolRegistry,
    settings: AgentSettings,
}

impl<'a> VerificationAgent<'a> {
    pub fn new(model: &'a dyn ModelClient, registry: &'a ToolRegistry) -> Self {
        Self::with_settings(model, registry, AgentSettings::default())
    }

    pub fn with_settings(
        model: &'a dyn ModelClient,
        registry: &'a ToolRegistry,
        settings: AgentSettings,
    ) -> Self {
        Self {
            model,
            registry,
            settings,
        }
    }

    /// Run the loop for one claim. Never fails; running out of passes is
    /// reported as [`VerificationOutcome::Exhausted`].
    pub async fn verify(&self, claim: &Claim) -> VerificationOutcome {
        let mut conversation = Conversation::opened(
            prompts::VERIFIER_SYSTEM,
            prompts::verifier_claim(&claim.sanitized),
        );
        let schemas = self.registry.schemas();
        let tools = (!schemas.is_empty()).then_some(schemas.as_slice());

        for pass in 1..=self.settings.max_iterations {
            if !self.settings.call_delay.is_zero() {
                tokio::time::sleep(self.settings.call_delay).await;
            }

            let reply = match self.model.complete(&conversation, tools).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(pass, "Verifier call failed: {}", e);
                    conversation.push(Message::assistant(format!(
                        "Claim has been verified, but returned error: {}. Please try it again.",
                        e
                    )));
                    continue;
                }
            };

            match AgentReply::decode(&reply) {
                AgentReply::ToolRequest(call) => {
                    debug!(pass, tool = %call.name, "tool requested");
                    conversation.push(Message::tool_request(call.clone()));
                    let dispatch = self.registry.dispatch(&call).await;
                    conversation.push(Message::tool_result(call, dispatch.render()));
                }
                AgentReply::Report(report) => {
                    info!(passes = pass, "Claim verified: {}", claim);
                    return VerificationOutcome::Reported {
                        report,
                        passes: pass,
                    };
                }
                AgentReply::Unstructured(text) => {
                    debug!(pass, "reply without report marker");
                    conversation.push(Message::assistant(text));
                    conversation.push(Message::user(prompts::REPORT_REMINDER));
                }
            }
        }

        warn!(
            passes = self.settings.max_iterations,
            "Verification exhausted for claim: {}", claim
        );
        VerificationOutcome::Exhausted {
            passes: self.settings.max_iterations,
        }
    }
}
