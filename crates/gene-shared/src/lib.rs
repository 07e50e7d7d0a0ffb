//! Shared types for the genecheck cascade.
//!
//! Conversation model, work items, claims and verification bundles used by
//! both the engine and its tests.

pub mod claim;
pub mod error;
pub mod message;
pub mod report;
pub mod work_item;

pub use claim::{flatten_for_prompt, is_allowed, sanitize, Claim, PLACEHOLDER};
pub use error::{CascadeError, ExtractionError, ModelError, ToolError};
pub use message::{Conversation, Message, Role, ToolCall};
pub use report::{Transcript, VerificationOutcome, VerificationReport, SENTINEL_FAILURE};
pub use work_item::{normalize_subjects, WorkItem};
