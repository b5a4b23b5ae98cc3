//! # Cue Orchestrator
//!
//! Walks a live show through its cue list. Inputs feed commands through a
//! filtering pipeline, every transition is checked against the state
//! machine and persisted through the store, and outputs receive the
//! resulting broadcasts.
//!
//! ```rust,ignore
//! use cue_core::{Cue, Definition};
//! use cue_orchestrator::Orchestrator;
//!
//! let definition = Definition::new("show", vec![Cue::new("Q1").stateful()]);
//! let orchestrator = Orchestrator::in_memory(definition);
//!
//! orchestrator.start().await?;
//! orchestrator.cue("Q1", None).await?;
//! ```

pub mod adapters;
pub mod command;
pub mod config;
pub mod error;
pub mod events;
mod fanout;
pub mod orchestrator;
pub mod plugin;
mod timer;

// Re-exports
pub use adapters::{ChannelInput, LineInput, LogOutput};
pub use command::{
    CommandFuture, CommandHandler, CommandRegistry, PipelineOutcome, RegistryError, Rejection,
};
pub use config::{
    CommandTransformer, CommandValidator, InteractionScope, OrchestratorConfig, Transform,
    DEFAULT_COMMANDS,
};
pub use error::{OrchestratorError, PipelineError, PluginError, PluginResult, Result};
pub use events::OrchestratorEvent;
pub use orchestrator::{ActiveCue, Orchestrator, Snapshot};
pub use plugin::{Command, CommandSender, Input, Output, Plugin};
