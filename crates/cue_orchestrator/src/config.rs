//! Orchestrator configuration

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::plugin::Command;

/// Commands accepted by the default validator.
pub const DEFAULT_COMMANDS: &[&str] = &[
    "start",
    "stop",
    "end",
    "cue",
    "uncue",
    "define",
    "interact",
    "uninteract",
    "reset",
    "restart",
    "kill",
];

pub type CommandValidator = Arc<dyn Fn(&str, &[Value]) -> bool + Send + Sync>;
pub type CommandTransformer = Arc<dyn Fn(&str, &[Value]) -> Transform + Send + Sync>;

/// Result of the command transformer.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Dispatch the command as received.
    Keep,
    /// Drop the command.
    Drop,
    /// Dispatch these commands instead, in order.
    Replace(Vec<Command>),
}

impl Transform {
    pub fn rename(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Replace(vec![Command::new(name, args)])
    }
}

/// Upsert key used for interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionScope {
    /// One record per `(sessionId, externalId)`.
    #[default]
    Interaction,
    /// One record per `(sessionId, cueId, userId)`. Interactions without a
    /// user fall back to the interaction key.
    CueUser,
}

#[derive(Clone)]
pub struct OrchestratorConfig {
    /// Accepts or rejects a command after the allow-list. `None` accepts
    /// [`DEFAULT_COMMANDS`].
    pub validate_command: Option<CommandValidator>,
    /// Allow-list applied before validation. `None` disables it.
    pub input_commands: Option<Vec<String>>,
    pub transform_command: Option<CommandTransformer>,
    pub interaction_scope: InteractionScope,
    /// Buffer of the lifecycle event channel.
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            validate_command: None,
            input_commands: None,
            transform_command: None,
            interaction_scope: InteractionScope::default(),
            event_capacity: 64,
        }
    }
}

impl fmt::Debug for OrchestratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorConfig")
            .field("validate_command", &self.validate_command.is_some())
            .field("input_commands", &self.input_commands)
            .field("transform_command", &self.transform_command.is_some())
            .field("interaction_scope", &self.interaction_scope)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl OrchestratorConfig {
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.validate_command = Some(Arc::new(validator));
        self
    }

    pub fn with_input_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_commands = Some(commands.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Transform + Send + Sync + 'static,
    {
        self.transform_command = Some(Arc::new(transform));
        self
    }

    pub fn with_interaction_scope(mut self, scope: InteractionScope) -> Self {
        self.interaction_scope = scope;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    pub(crate) fn is_allowed(&self, name: &str) -> bool {
        match &self.input_commands {
            Some(commands) => commands.iter().any(|c| c == name),
            None => true,
        }
    }

    pub(crate) fn is_valid(&self, name: &str, args: &[Value]) -> bool {
        match &self.validate_command {
            Some(validate) => validate(name, args),
            None => DEFAULT_COMMANDS.contains(&name),
        }
    }

    pub(crate) fn transform(&self, name: &str, args: &[Value]) -> Transform {
        match &self.transform_command {
            Some(transform) => transform(name, args),
            None => Transform::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.event_capacity, 64);
        assert_eq!(config.interaction_scope, InteractionScope::Interaction);
        assert!(config.is_allowed("anything"));
        assert!(config.is_valid("cue", &[]));
        assert!(!config.is_valid("init", &[]));
        assert!(!config.is_valid("destroy", &[]));
        assert_eq!(config.transform("cue", &[]), Transform::Keep);
    }

    #[test]
    fn test_allow_list() {
        let config = OrchestratorConfig::default().with_input_commands(["cue"]);
        assert!(config.is_allowed("cue"));
        assert!(!config.is_allowed("interact"));
    }

    #[test]
    fn test_custom_validator_sees_args() {
        let config = OrchestratorConfig::default()
            .with_validator(|name, args| name == "cue" && !args.is_empty());
        assert!(config.is_valid("cue", &[json!("Q1")]));
        assert!(!config.is_valid("cue", &[]));
        assert!(!config.is_valid("start", &[]));
    }

    #[test]
    fn test_transform_rename() {
        let config = OrchestratorConfig::default().with_transform(|name, args| match name {
            "go" => Transform::rename("cue", args.to_vec()),
            "noise" => Transform::Drop,
            _ => Transform::Keep,
        });

        assert_eq!(
            config.transform("go", &[json!("Q1")]),
            Transform::Replace(vec![Command::new("cue", vec![json!("Q1")])])
        );
        assert_eq!(config.transform("noise", &[]), Transform::Drop);
    }
}
