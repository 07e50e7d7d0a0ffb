//! genecheck - fact-checking cascade for gene-set hypotheses
//!
//! A model drafts a labelled narrative for a gene set; claims about the
//! label are extracted and verified by a tool-using agent; the narrative is
//! revised, its per-gene claims verified in turn, and a final version
//! produced. Every stage is logged to append-only audit files.

pub mod batch;
pub mod cascade;
pub mod config;
pub mod extractor;
pub mod llm;
pub mod prompts;
pub mod sink;
pub mod tools;
pub mod verifier;

pub use batch::{load_csv, BatchDriver, BatchSummary};
pub use cascade::{CascadeController, FinalArtifact, ItemFailure, ItemOutcome, Stage};
pub use config::Config;
pub use extractor::{ClaimExtractor, ClaimFocus, ExtractionRequest};
pub use llm::{ModelClient, OpenAiClient};
pub use sink::{ArtifactSink, FileSink, MemorySink, SinkRecord};
pub use tools::ToolRegistry;
pub use verifier::{AgentSettings, VerificationAgent};
