//! Claim extraction.
//!
//! One model call turns a narrative into a list of checkable claims. The
//! reply must be a JSON list of strings and nothing else; anything else is a
//! [`ExtractionError::ClaimListParse`] and is not retried.

use crate::llm::ModelClient;
use crate::prompts;
use gene_shared::{Claim, Conversation, ExtractionError};
use tracing::{debug, info};

/// What the extracted claims should be about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimFocus {
    /// The label, stated for the whole subject set
    Label,
    /// Per-gene functional attributions in the narrative
    Narrative,
}

impl ClaimFocus {
    fn instruction(&self) -> &'static str {
        match self {
            ClaimFocus::Label => prompts::LABEL_FOCUS,
            ClaimFocus::Narrative => prompts::NARRATIVE_FOCUS,
        }
    }
}

/// A narrative-specific prompt plus a focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub prompt: String,
    pub focus: ClaimFocus,
}

impl ExtractionRequest {
    pub fn label(subjects: &str, label: &str) -> Self {
        Self {
            prompt: prompts::label_claims(subjects, label),
            focus: ClaimFocus::Label,
        }
    }

    pub fn narrative(narrative: &str) -> Self {
        Self {
            prompt: prompts::narrative_claims(narrative),
            focus: ClaimFocus::Narrative,
        }
    }

    /// The single user turn sent to the model.
    pub fn user_turn(&self) -> String {
        format!("{}{}", self.prompt, self.focus.instruction())
    }
}

/// Parse a reply that must be exactly a JSON list of strings.
pub fn parse_claim_list(text: &str) -> Result<Vec<String>, ExtractionError> {
    serde_json::from_str::<Vec<String>>(text.trim())
        .map_err(|e| ExtractionError::ClaimListParse(e.to_string()))
}

pub struct ClaimExtractor<'a> {
    model: &'a dyn ModelClient,
}

impl<'a> ClaimExtractor<'a> {
    pub fn new(model: &'a dyn ModelClient) -> Self {
        Self { model }
    }

    /// Extract sanitized claims, in reply order.
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<Claim>, ExtractionError> {
        let conversation = Conversation::opened(prompts::FACT_CHECKER_SYSTEM, request.user_turn());
        let reply = self.model.complete(&conversation, None).await?;
        debug!(focus = ?request.focus, "claim list reply: {}", reply.content);

        let claims: Vec<Claim> = parse_claim_list(&reply.content)?
            .into_iter()
            .map(Claim::new)
            .collect();

        let rewritten = claims.iter().filter(|c| c.was_rewritten()).count();
        info!(
            focus = ?request.focus,
            "Extracted {} claims ({} sanitized)",
            claims.len(),
            rewritten
        );
        Ok(claims)
    }
}
