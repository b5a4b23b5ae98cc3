//! cue_state - State machine for the cue orchestrator lifecycle
//!
//! This crate holds the transition table and the committed state only.
//! Async before/after hooks are run by the orchestrator around
//! [`StateMachine::lookup`] and [`StateMachine::commit`].

pub mod machine;

// Re-export commonly used types
pub use machine::{
    FromStates, State, StateMachine, StateTransition, TransitionError, TransitionKind,
};
