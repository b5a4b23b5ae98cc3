//! # Cue Core
//!
//! The persisted model of a show (definitions, cues, sessions and
//! interactions) and the store contract the orchestrator writes through.

pub mod error;
pub mod model;
pub mod store;

// Re-exports
pub use error::{Result, StoreError};
pub use model::{
    default_handle, merge_cues, next_cue, AfterDuration, Cue, Definition, HandleGenerator,
    Interaction, Session,
};
pub use store::{
    from_record, parse_input_id, parse_output_id, record_id, to_record, Collection, FileStore,
    Filter, MemoryStore, Record, Store,
};
