//! Five-stage fact-checking cascade for one work item.
//!
//! Generate → VerifyLabel → Revise → VerifyNarrative → Finalize.
//!
//! The generation, revision and finalization turns share one running
//! conversation; each stage's reply is appended as an assistant turn before
//! the next stage starts. Extraction and verification run in their own
//! isolated conversations. Any stage failure stops the remaining stages for
//! that item only.

use crate::extractor::{ClaimExtractor, ExtractionRequest};
use crate::llm::ModelClient;
use crate::prompts;
use crate::sink::{ArtifactSink, SinkRecord};
use crate::tools::ToolRegistry;
use crate::verifier::{AgentSettings, VerificationAgent};
use gene_shared::{
    flatten_for_prompt, CascadeError, Claim, Conversation, Message, Transcript,
    VerificationReport, WorkItem,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    VerifyLabel,
    Revise,
    VerifyNarrative,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Generate => "generate",
            Stage::VerifyLabel => "verify-label",
            Stage::Revise => "revise",
            Stage::VerifyNarrative => "verify-narrative",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// A stage failure, tagged with its item.
#[derive(Error, Debug)]
#[error("item {item_id} failed at {stage}: {error}")]
pub struct ItemFailure {
    pub item_id: String,
    pub stage: Stage,
    #[source]
    pub error: CascadeError,
}

/// Everything a completed item produced.
#[derive(Debug, Clone)]
pub struct FinalArtifact {
    pub item_id: String,
    pub baseline: String,
    pub label: String,
    pub revised: String,
    pub final_text: String,
    /// Label of the final text, when it still carries a label line
    pub final_label: Option<String>,
    pub label_round: Transcript,
    pub narrative_round: Transcript,
    /// The running generation/revision conversation
    pub conversation: Conversation,
}

#[derive(Debug)]
pub enum ItemOutcome {
    Completed(Box<FinalArtifact>),
    Failed(ItemFailure),
}

impl ItemOutcome {
    pub fn item_id(&self) -> &str {
        match self {
            ItemOutcome::Completed(artifact) => &artifact.item_id,
            ItemOutcome::Failed(failure) => &failure.item_id,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ItemOutcome::Completed(_))
    }
}

/// Label after `Process: ` on the first line of a narrative.
pub fn parse_label(narrative: &str) -> Result<String, CascadeError> {
    let first_line = narrative.trim_start().lines().next().unwrap_or_default();
    match first_line.find(prompts::LABEL_PREFIX) {
        Some(at) => Ok(first_line[at + prompts::LABEL_PREFIX.len()..].trim().to_string()),
        None => Err(CascadeError::LabelMissing {
            first_line: first_line.to_string(),
        }),
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct CascadeController {
    generator: Arc<dyn ModelClient>,
    verifier_model: Arc<dyn ModelClient>,
    registry: Arc<ToolRegistry>,
    sink: Arc<dyn ArtifactSink>,
    settings: AgentSettings,
}

impl CascadeController {
    pub fn new(
        generator: Arc<dyn ModelClient>,
        verifier_model: Arc<dyn ModelClient>,
        registry: Arc<ToolRegistry>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            generator,
            verifier_model,
            registry,
            sink,
            settings: AgentSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Process one item, recording a failure to the final log.
    pub async fn run_item(&self, item: &WorkItem) -> ItemOutcome {
        match self.process(item).await {
            Ok(artifact) => ItemOutcome::Completed(Box::new(artifact)),
            Err(failure) => {
                error!("{}", failure);
                let record = SinkRecord::Failure {
                    item_id: failure.item_id.clone(),
                    message: format!("{}: {}", failure.stage, failure.error),
                };
                if let Err(e) = self.sink.append(&record) {
                    error!("Failed to record failure of item {}: {}", failure.item_id, e);
                }
                ItemOutcome::Failed(failure)
            }
        }
    }

    /// Run all five stages for `item`.
    pub async fn process(&self, item: &WorkItem) -> Result<FinalArtifact, ItemFailure> {
        let fail = |stage: Stage| {
            move |error: CascadeError| ItemFailure {
                item_id: item.id.clone(),
                stage,
                error,
            }
        };
        let subjects = item.joined();
        if item.is_empty() {
            warn!("Item {} has no subjects", item.id);
        }

        // Generate
        info!(stage = %Stage::Generate, "Generating baseline for {}", subjects);
        let mut conversation = Conversation::new();
        conversation.push(Message::system(prompts::ANALYST_SYSTEM));
        let baseline = self
            .converse(&mut conversation, prompts::baseline(&subjects))
            .await
            .map_err(fail(Stage::Generate))?;
        self.sink
            .append(&SinkRecord::Baseline {
                text: baseline.clone(),
            })
            .map_err(|e| fail(Stage::Generate)(e.into()))?;
        let label = parse_label(&baseline).map_err(fail(Stage::Generate))?;
        info!(stage = %Stage::Generate, "Baseline label: {}", label);

        // VerifyLabel
        let label_round = self
            .verify_round(&ExtractionRequest::label(&subjects, &label))
            .await
            .map_err(fail(Stage::VerifyLabel))?;

        // Revise
        info!(stage = %Stage::Revise, "Revising with {} label reports", label_round.len());
        let revision = format!(
            "{}{}",
            prompts::revision(&label_round.render()),
            prompts::REVISION_INSTRUCTION
        );
        let revised = self
            .converse(&mut conversation, revision)
            .await
            .map_err(fail(Stage::Revise))?;

        // VerifyNarrative
        let narrative_round = self
            .verify_round(&ExtractionRequest::narrative(&flatten_for_prompt(&revised)))
            .await
            .map_err(fail(Stage::VerifyNarrative))?;

        // Finalize
        info!(stage = %Stage::Finalize, "Finalizing with {} narrative reports", narrative_round.len());
        let finalize = format!(
            "{}{}",
            prompts::finalize(&narrative_round.render()),
            prompts::FINALIZE_INSTRUCTION
        );
        let final_text = self
            .converse(&mut conversation, finalize)
            .await
            .map_err(fail(Stage::Finalize))?;
        self.sink
            .append(&SinkRecord::Final {
                text: final_text.clone(),
            })
            .map_err(|e| fail(Stage::Finalize)(e.into()))?;
        // The final record is committed; the item is complete from here on
        if let Err(e) = self.sink.append(&SinkRecord::ItemEnd) {
            warn!("Failed to close verification block of item {}: {}", item.id, e);
        }

        let final_label = parse_label(&final_text).ok();
        match &final_label {
            Some(final_label) if *final_label != label => {
                info!("Item {} relabelled: {} -> {}", item.id, label, final_label)
            }
            Some(_) => info!("Item {} kept label {}", item.id, label),
            None => debug!("Final text of item {} has no label line", item.id),
        }

        Ok(FinalArtifact {
            item_id: item.id.clone(),
            baseline,
            label,
            revised,
            final_text,
            final_label,
            label_round,
            narrative_round,
            conversation,
        })
    }

    /// Append a user turn to the running conversation and the reply after it.
    async fn converse(
        &self,
        conversation: &mut Conversation,
        user_turn: String,
    ) -> Result<String, CascadeError> {
        conversation.push(Message::user(user_turn));
        let reply = self.generator.complete(conversation, None).await?;
        debug!("{} reply: {}", self.generator.model_name(), reply.content);
        conversation.push(Message::assistant(reply.content.clone()));
        Ok(reply.content)
    }

    /// Extract claims, then verify each in order.
    async fn verify_round(&self, request: &ExtractionRequest) -> Result<Transcript, CascadeError> {
        let claims = ClaimExtractor::new(self.generator.as_ref())
            .extract(request)
            .await?;
        self.sink.append(&SinkRecord::ClaimList {
            claims: claims.iter().map(|c| c.raw.clone()).collect(),
        })?;
        self.verify_all(&claims).await
    }

    async fn verify_all(&self, claims: &[Claim]) -> Result<Transcript, CascadeError> {
        let agent = VerificationAgent::with_settings(
            self.verifier_model.as_ref(),
            &self.registry,
            self.settings,
        );

        let mut transcript = Transcript::new();
        for (n, claim) in claims.iter().enumerate() {
            debug!("Verifying claim {}/{}: {}", n + 1, claims.len(), claim);
            let outcome = agent.verify(claim).await;
            self.sink.append(&SinkRecord::ClaimCheck {
                claim: claim.sanitized.clone(),
                report: outcome.report_text().to_string(),
            })?;
            transcript.push(VerificationReport {
                claim: claim.clone(),
                outcome,
            });
        }

        if transcript.exhausted() > 0 {
            warn!(
                "{} of {} claims ran out of verification passes",
                transcript.exhausted(),
                transcript.len()
            );
        }
        Ok(transcript)
    }
}
