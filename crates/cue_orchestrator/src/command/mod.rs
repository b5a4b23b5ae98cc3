//! Command registry and the input pipeline

mod args;
pub(crate) mod builtin;
pub(crate) mod pipeline;
pub mod registry;

pub use pipeline::{PipelineOutcome, Rejection};
pub use registry::{CommandFuture, CommandHandler, CommandRegistry, RegistryError};
