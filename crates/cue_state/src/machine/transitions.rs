//! State transitions - FSM transition logic
//!
//! Resolves requested transitions against the table and commits them.
//! Hooks run outside of this type: resolve with [`StateMachine::lookup`],
//! run the before hook, then [`StateMachine::commit`].

use serde::Serialize;
use thiserror::Error;

use super::events::TransitionKind;
use super::states::State;

/// Error type for invalid state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition '{kind}' from state '{from}'")]
    Invalid { kind: TransitionKind, from: State },
}

/// Represents a transition resolved against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    /// The transition name.
    #[serde(rename = "transition")]
    pub kind: TransitionKind,
    /// The state before the transition.
    pub from: State,
    /// The state after the transition.
    pub to: State,
}

/// State machine for the orchestrator lifecycle.
#[derive(Debug, Clone)]
pub struct StateMachine {
    /// Current state.
    current_state: State,
    /// Committed transitions (limited).
    history: Vec<StateTransition>,
    /// Max history entries to keep.
    max_history: usize,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine in the `None` state.
    pub fn new() -> Self {
        Self::with_state(State::None)
    }

    /// Create a state machine with a specific initial state.
    pub fn with_state(state: State) -> Self {
        Self {
            current_state: state,
            history: Vec::new(),
            max_history: 50,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> State {
        self.current_state
    }

    pub fn is(&self, state: State) -> bool {
        self.current_state == state
    }

    /// Get the transition history.
    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Resolve a transition from the current state without committing it.
    pub fn lookup(&self, kind: TransitionKind) -> Result<StateTransition, TransitionError> {
        let from = self.current_state;
        if !kind.from_states().contains(from) {
            return Err(TransitionError::Invalid { kind, from });
        }

        Ok(StateTransition {
            kind,
            from,
            to: kind.target(),
        })
    }

    /// Check if a transition is legal without resolving it.
    pub fn can(&self, kind: TransitionKind) -> bool {
        self.lookup(kind).is_ok()
    }

    /// Whether the machine already sits at the target of `kind` and the
    /// transition is no longer legal, i.e. an identical transition settled first.
    pub fn is_settled_at(&self, kind: TransitionKind) -> bool {
        self.current_state == kind.target() && !self.can(kind)
    }

    /// Commit a transition obtained from [`StateMachine::lookup`].
    ///
    /// Returns `false` and leaves the state untouched when the machine moved
    /// since the lookup.
    pub fn commit(&mut self, transition: StateTransition) -> bool {
        if transition.from != self.current_state {
            tracing::warn!(
                transition = %transition.kind,
                expected = %transition.from,
                actual = %self.current_state,
                "Refusing stale transition commit"
            );
            return false;
        }

        self.current_state = transition.to;

        self.history.push(transition);
        if self.history.len() > self.max_history {
            self.history.remove(0);
        }

        true
    }

    /// Reset to the `None` state.
    pub fn reset(&mut self) {
        self.current_state = State::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(sm: &mut StateMachine, kind: TransitionKind) -> StateTransition {
        let transition = sm.lookup(kind).unwrap();
        assert!(sm.commit(transition));
        transition
    }

    #[test]
    fn test_basic_flow() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.state(), State::None);

        drive(&mut sm, TransitionKind::Init);
        assert_eq!(sm.state(), State::Initialized);

        drive(&mut sm, TransitionKind::Start);
        assert_eq!(sm.state(), State::Idle);

        let t = drive(&mut sm, TransitionKind::Cue);
        assert_eq!(t.from, State::Idle);
        assert_eq!(t.to, State::Cued);

        drive(&mut sm, TransitionKind::Cue);
        assert_eq!(sm.state(), State::Cued);

        drive(&mut sm, TransitionKind::Uncue);
        assert_eq!(sm.state(), State::Idle);

        drive(&mut sm, TransitionKind::End);
        assert_eq!(sm.state(), State::Ended);

        drive(&mut sm, TransitionKind::Start);
        assert_eq!(sm.state(), State::Idle);
    }

    #[test]
    fn test_invalid_transition_is_a_sentinel() {
        let sm = StateMachine::new();
        let err = sm.lookup(TransitionKind::Cue).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                kind: TransitionKind::Cue,
                from: State::None,
            }
        );
        assert_eq!(sm.state(), State::None);
    }

    #[test]
    fn test_stop_and_restart() {
        let mut sm = StateMachine::with_state(State::Cued);
        drive(&mut sm, TransitionKind::Stop);
        assert!(!sm.can(TransitionKind::Cue));
        assert!(!sm.can(TransitionKind::Stop));
        drive(&mut sm, TransitionKind::Start);
        assert_eq!(sm.state(), State::Idle);
    }

    #[test]
    fn test_destroy_from_none() {
        let mut sm = StateMachine::new();
        let t = drive(&mut sm, TransitionKind::Destroy);
        assert_eq!(t.from, State::None);
        assert_eq!(sm.state(), State::None);
    }

    #[test]
    fn test_stale_commit_is_refused() {
        let mut sm = StateMachine::new();
        let init = sm.lookup(TransitionKind::Init).unwrap();
        drive(&mut sm, TransitionKind::Init);

        assert!(!sm.commit(init));
        assert_eq!(sm.history().len(), 1);
    }

    #[test]
    fn test_settled_init() {
        let mut sm = StateMachine::new();
        assert!(!sm.is_settled_at(TransitionKind::Init));
        drive(&mut sm, TransitionKind::Init);
        assert!(sm.is_settled_at(TransitionKind::Init));
        // `cue` from cued is still legal, so it is never "settled".
        let sm = StateMachine::with_state(State::Cued);
        assert!(!sm.is_settled_at(TransitionKind::Cue));
    }

    #[test]
    fn test_history_tracking() {
        let mut sm = StateMachine::new();
        drive(&mut sm, TransitionKind::Init);
        drive(&mut sm, TransitionKind::Start);

        assert_eq!(sm.history().len(), 2);
        assert_eq!(sm.history()[1].kind, TransitionKind::Start);
    }

    #[test]
    fn test_transition_serializes_with_names() {
        let mut sm = StateMachine::with_state(State::Idle);
        let t = drive(&mut sm, TransitionKind::Cue);
        let json = serde_json::to_value(t).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"transition": "cue", "from": "idle", "to": "cued"})
        );
    }
}
