use cue_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The store could not be brought up; the orchestrator cannot start.
    #[error("Store initialization failed: {0}")]
    StoreInit(#[source] StoreError),

    /// A session-dependent operation was called before `start`.
    #[error("No open session: start the orchestrator first")]
    NoSession,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Errors that must reach the caller even when raised inside a
    /// transition hook. Everything else only vetoes the transition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreInit(_) | Self::NoSession)
    }
}

/// Failure reported by an input or output adapter.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Channel closed")]
    Closed,
}

impl PluginError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid arguments for '{command}': {reason}")]
    InvalidArguments { command: String, reason: String },

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn invalid(command: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
pub type PluginResult<T> = std::result::Result<T, PluginError>;
