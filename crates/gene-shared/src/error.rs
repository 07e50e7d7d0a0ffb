//! Error types for the cascade.

use thiserror::Error;

/// Failures of the model-call service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("API key variable {0} is not set")]
    MissingApiKey(String),

    #[error("request timeout after {0} seconds")]
    Timeout(u64),
}

/// Failures while decoding, validating or invoking a tool.
///
/// These never leave the verification loop; they are rendered into the
/// conversation so the model can retry with corrected arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("arguments for {tool} are not a JSON object: {reason}")]
    MalformedArguments { tool: String, reason: String },

    #[error("arguments for {tool} do not match its schema: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("{tool} failed: {message}")]
    Invocation { tool: String, message: String },
}

impl ToolError {
    pub fn invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Failures of the single claim-extraction call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("claim extraction call failed: {0}")]
    Model(#[from] ModelError),

    /// Reply was not a JSON list of strings. Not retried.
    #[error("claim list is not a JSON list of strings: {0}")]
    ClaimListParse(String),
}

/// Item-scoped failure of one cascade stage.
#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("narrative does not start with a \"Process: \" label line (first line: {first_line:?})")]
    LabelMissing { first_line: String },

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("artifact sink write failed: {0}")]
    Sink(#[from] std::io::Error),
}
