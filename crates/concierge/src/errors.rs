use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Classification of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolErrorKind {
    /// The tool, or an entity it references, does not exist
    NotFound,
    /// A parameter is missing, malformed, or rejected by validation
    InvalidArgument,
    /// A network collaborator failed or timed out
    UpstreamFailure,
    /// An unexpected fault inside the handler
    ExecutionFailure,
    /// The operation is blocked by dependent records
    Conflict,
}

/// Error produced while resolving, validating or executing a tool call.
///
/// These never reach the orchestrator as structured errors; the invoker turns
/// them into text with [`ToolError::render`].
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new<S: Into<String>>(kind: ToolErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::new(ToolErrorKind::InvalidArgument, message)
    }

    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::new(ToolErrorKind::UpstreamFailure, message)
    }

    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::new(ToolErrorKind::ExecutionFailure, message)
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::new(ToolErrorKind::Conflict, message)
    }

    /// Prefix the message with what was being attempted
    pub fn with_context<S: AsRef<str>>(mut self, context: S) -> Self {
        self.message = format!("{}: {}", context.as_ref(), self.message);
        self
    }

    /// Text shown to the calling model in place of a tool result
    pub fn render(&self) -> String {
        match self.kind {
            ToolErrorKind::UpstreamFailure => {
                format!("The upstream service failed: {}", self.message)
            }
            ToolErrorKind::ExecutionFailure => {
                format!("The tool failed unexpectedly: {}", self.message)
            }
            _ => self.message.clone(),
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    DuplicateName(String),

    #[error("Tool {tool} declares parameter {parameter} more than once")]
    DuplicateParameter { tool: String, parameter: String },
}

/// Failures reported by the directory store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => ToolError::not_found(message),
            StoreError::Invalid(message) => ToolError::invalid_argument(message),
            StoreError::Conflict(message) => ToolError::conflict(message),
            StoreError::Unavailable(message) => ToolError::upstream(message),
        }
    }
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Failed to render prompt: {0}")]
    Prompt(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
