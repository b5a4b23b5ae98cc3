//! Lifecycle events published by the orchestrator

use cue_core::{Cue, Interaction, Session};
use cue_state::{State, StateTransition, TransitionKind};
use serde::Serialize;
use serde_json::Value;

/// Events sent to [`crate::Orchestrator::subscribe`] receivers once the
/// corresponding step has committed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    Initialized,
    Started {
        session: Session,
    },
    Cued {
        cue: Cue,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Uncued,
    Ended,
    Stopped,
    Destroyed,
    Interaction {
        interaction: Interaction,
    },
    Uninteraction {
        id: String,
    },
    Reset {
        session: Session,
    },
    CuesDefined {
        cues: Vec<Cue>,
    },
    Transition {
        transition: TransitionKind,
        from: State,
        to: State,
    },
}

impl From<StateTransition> for OrchestratorEvent {
    fn from(transition: StateTransition) -> Self {
        Self::Transition {
            transition: transition.kind,
            from: transition.from,
            to: transition.to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cue_state::StateMachine;
    use serde_json::json;

    #[test]
    fn test_transition_event_serialization() {
        let sm = StateMachine::new();
        let event = OrchestratorEvent::from(sm.lookup(TransitionKind::Init).unwrap());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({ "type": "transition", "transition": "init", "from": "none", "to": "initialized" })
        );
    }

    #[test]
    fn test_unit_event_serialization() {
        let json = serde_json::to_value(OrchestratorEvent::Uncued).unwrap();
        assert_eq!(json, json!({ "type": "uncued" }));
    }
}
