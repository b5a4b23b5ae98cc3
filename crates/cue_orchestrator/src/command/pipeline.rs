//! Command pipeline
//!
//! transform → allow-list → validator → registry → dispatch. Every stage
//! is isolated: a rejected, failing or panicking command is logged and
//! reported as an outcome, never propagated.

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::Transform;
use crate::orchestrator::Orchestrator;
use crate::plugin::Command;

/// Why a command was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The transformer dropped it.
    Dropped,
    /// Not in the configured allow-list.
    NotAllowed,
    /// The validator refused it.
    Invalid,
    /// No handler under that name.
    Unregistered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Dispatched { command: String, result: Value },
    Rejected { command: String, reason: Rejection },
    Failed { command: String, error: String },
}

impl PipelineOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }

    pub fn command(&self) -> &str {
        match self {
            Self::Dispatched { command, .. }
            | Self::Rejected { command, .. }
            | Self::Failed { command, .. } => command,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub(crate) async fn run(orchestrator: &Orchestrator, command: Command) -> Vec<PipelineOutcome> {
    let config = orchestrator.config();
    let original = command.name.clone();

    let transformed = catch_unwind(AssertUnwindSafe(|| {
        config.transform(&command.name, &command.args)
    }));

    let commands = match transformed {
        Ok(Transform::Keep) => vec![command],
        Ok(Transform::Drop) => {
            tracing::debug!(command = %original, "Command dropped by transform");
            return vec![PipelineOutcome::Rejected {
                command: original,
                reason: Rejection::Dropped,
            }];
        }
        Ok(Transform::Replace(commands)) => {
            if commands.is_empty() {
                tracing::debug!(command = %original, "Command transformed into nothing");
            }
            commands
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            tracing::warn!(command = %original, error = %error, "Command transform panicked");
            return vec![PipelineOutcome::Failed {
                command: original,
                error,
            }];
        }
    };

    let mut outcomes = Vec::with_capacity(commands.len());
    for command in commands {
        outcomes.push(dispatch(orchestrator, &original, command).await);
    }
    outcomes
}

async fn dispatch(
    orchestrator: &Orchestrator,
    original: &str,
    command: Command,
) -> PipelineOutcome {
    let config = orchestrator.config();
    let Command { name, args } = command;

    if !config.is_allowed(&name) {
        tracing::debug!(command = %name, original, "Command not in allow-list");
        return PipelineOutcome::Rejected {
            command: name,
            reason: Rejection::NotAllowed,
        };
    }

    match catch_unwind(AssertUnwindSafe(|| config.is_valid(&name, &args))) {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(command = %name, original, "Command rejected by validator");
            return PipelineOutcome::Rejected {
                command: name,
                reason: Rejection::Invalid,
            };
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            tracing::warn!(command = %name, original, error = %error, "Command validator panicked");
            return PipelineOutcome::Failed {
                command: name,
                error,
            };
        }
    }

    let Some(handler) = orchestrator.registry().get(&name) else {
        tracing::debug!(command = %name, original, "No handler registered for command");
        return PipelineOutcome::Rejected {
            command: name,
            reason: Rejection::Unregistered,
        };
    };

    tracing::debug!(command = %name, original, args = args.len(), "Dispatching command");

    match AssertUnwindSafe(handler(orchestrator.clone(), args))
        .catch_unwind()
        .await
    {
        Ok(Ok(result)) => PipelineOutcome::Dispatched {
            command: name,
            result,
        },
        Ok(Err(error)) => {
            tracing::warn!(command = %name, original, error = %error, "Command failed");
            PipelineOutcome::Failed {
                command: name,
                error: error.to_string(),
            }
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            tracing::warn!(command = %name, original, error = %error, "Command handler panicked");
            PipelineOutcome::Failed {
                command: name,
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = PipelineOutcome::Rejected {
            command: "interact".to_string(),
            reason: Rejection::NotAllowed,
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "outcome": "rejected", "command": "interact", "reason": "not_allowed" })
        );
        assert_eq!(outcome.command(), "interact");
        assert!(!outcome.is_dispatched());
    }
}
