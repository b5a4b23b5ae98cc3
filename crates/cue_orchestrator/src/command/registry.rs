use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::error::PipelineError;
use crate::orchestrator::Orchestrator;

pub type CommandFuture = BoxFuture<'static, Result<Value, PipelineError>>;

/// Handler bound to a command name. Receives a handle to the orchestrator
/// and the decoded command arguments.
pub type CommandHandler = Arc<dyn Fn(Orchestrator, Vec<Value>) -> CommandFuture + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command '{0}' already registered")]
    DuplicateCommand(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

pub struct CommandRegistry {
    handlers: DashMap<String, CommandHandler>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register<F>(&self, name: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(Orchestrator, Vec<Value>) -> CommandFuture + Send + Sync + 'static,
    {
        self.register_shared(name, Arc::new(handler))
    }

    pub fn register_shared(
        &self,
        name: &str,
        handler: CommandHandler,
    ) -> Result<(), RegistryError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(RegistryError::InvalidCommand(
                "command name cannot be empty".to_string(),
            ));
        }

        match self.handlers.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateCommand(name.to_string())),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<CommandHandler> {
        self.handlers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .handlers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
