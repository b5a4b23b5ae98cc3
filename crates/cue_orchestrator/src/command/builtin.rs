//! Built-in command table

use serde_json::Value;
use std::future::Future;

use super::args;
use super::registry::{CommandFuture, CommandRegistry, RegistryError};
use crate::error::PipelineError;

fn boxed<F>(future: F) -> CommandFuture
where
    F: Future<Output = Result<Value, PipelineError>> + Send + 'static,
{
    Box::pin(future)
}

/// Register every public orchestrator operation under its command name.
/// `kill` is an alias of `destroy`.
pub(crate) fn register(registry: &CommandRegistry) -> Result<(), RegistryError> {
    registry.register("init", |o, _| boxed(async move { Ok(Value::Bool(o.init().await?)) }))?;
    registry.register("destroy", |o, _| {
        boxed(async move { Ok(Value::Bool(o.destroy().await?)) })
    })?;
    registry.register("kill", |o, _| {
        boxed(async move { Ok(Value::Bool(o.destroy().await?)) })
    })?;
    registry.register("start", |o, _| boxed(async move { Ok(Value::Bool(o.start().await?)) }))?;
    registry.register("stop", |o, _| boxed(async move { Ok(Value::Bool(o.stop().await?)) }))?;
    registry.register("uncue", |o, _| boxed(async move { Ok(Value::Bool(o.uncue().await?)) }))?;
    registry.register("end", |o, _| boxed(async move { Ok(Value::Bool(o.end().await?)) }))?;
    registry.register("reset", |o, _| boxed(async move { Ok(Value::Bool(o.reset().await?)) }))?;
    registry.register("restart", |o, _| {
        boxed(async move { Ok(Value::Bool(o.restart().await?)) })
    })?;

    registry.register("cue", |o, argv| {
        boxed(async move {
            let (id, data) = args::cue(&argv)?;
            Ok(Value::Bool(o.cue(&id, data).await?))
        })
    })?;

    registry.register("interact", |o, argv| {
        boxed(async move {
            let (data, id, user_id) = args::interact(&argv)?;
            let interaction = o.interact_as(data, id, user_id).await?;
            Ok(serde_json::to_value(interaction)?)
        })
    })?;

    registry.register("uninteract", |o, argv| {
        boxed(async move {
            let id = args::uninteract(&argv)?;
            Ok(Value::Bool(o.uninteract(&id).await?))
        })
    })?;

    registry.register("define", |o, argv| {
        boxed(async move {
            let cues = args::define(&argv)?;
            let merged = o.define(cues).await?;
            Ok(serde_json::to_value(merged)?)
        })
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_COMMANDS;

    #[test]
    fn test_builtin_table() {
        let registry = CommandRegistry::new();
        register(&registry).unwrap();

        assert_eq!(
            registry.names(),
            vec![
                "cue", "define", "destroy", "end", "init", "interact", "kill", "reset", "restart",
                "start", "stop", "uncue", "uninteract"
            ]
        );
    }

    #[test]
    fn test_default_commands_are_registered() {
        let registry = CommandRegistry::new();
        register(&registry).unwrap();

        for name in DEFAULT_COMMANDS {
            assert!(registry.contains(name), "{} is not registered", name);
        }
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = CommandRegistry::new();
        register(&registry).unwrap();
        assert!(register(&registry).is_err());
    }
}
