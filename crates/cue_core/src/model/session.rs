use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::store::{from_record, Filter, Record};

/// One run-through of a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Store-assigned identity.
    pub id: String,

    pub handle: String,

    /// Id of the definition this session runs.
    pub definition: String,

    #[serde(default)]
    pub started: bool,

    #[serde(default)]
    pub ended: bool,

    /// Id of the active stateful cue.
    #[serde(default)]
    pub cue: Option<String>,

    /// Payload the active cue was fired with.
    #[serde(default)]
    pub data: Option<Value>,
}

impl Session {
    pub fn from_record(record: Record) -> Result<Self> {
        from_record(record)
    }

    /// Record for a fresh, not yet started session.
    pub fn new_record(definition: &str, handle: &str) -> Record {
        Record::from_iter([
            ("definition".to_string(), json!(definition)),
            ("handle".to_string(), json!(handle)),
            ("started".to_string(), json!(false)),
            ("ended".to_string(), json!(false)),
            ("cue".to_string(), Value::Null),
            ("data".to_string(), Value::Null),
        ])
    }

    /// Filter matching the open session of a definition.
    pub fn open_filter(definition: &str) -> Filter {
        Filter::new()
            .eq("definition", definition)
            .eq("started", true)
            .eq("ended", false)
    }

    pub fn handle_filter(definition: &str, handle: &str) -> Filter {
        Filter::new()
            .eq("definition", definition)
            .eq("handle", handle)
    }

    pub fn started_patch() -> Record {
        Record::from_iter([("started".to_string(), json!(true))])
    }

    pub fn cue_patch(cue: Option<&str>, data: Option<&Value>) -> Record {
        Record::from_iter([
            ("cue".to_string(), json!(cue)),
            ("data".to_string(), data.cloned().unwrap_or(Value::Null)),
        ])
    }

    pub fn ended_patch() -> Record {
        Record::from_iter([
            ("started".to_string(), json!(false)),
            ("ended".to_string(), json!(true)),
            ("cue".to_string(), Value::Null),
            ("data".to_string(), Value::Null),
        ])
    }

    /// Back to a started session with no active cue.
    pub fn reset_patch() -> Record {
        Record::from_iter([
            ("started".to_string(), json!(true)),
            ("ended".to_string(), json!(false)),
            ("cue".to_string(), Value::Null),
            ("data".to_string(), Value::Null),
        ])
    }

    pub fn is_open(&self) -> bool {
        !self.ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_record() {
        let mut record = Session::new_record("show", "show_2024_01_01");
        record.insert("id".to_string(), json!("s-1"));

        let session = Session::from_record(record).unwrap();

        assert_eq!(session.id, "s-1");
        assert_eq!(session.definition, "show");
        assert!(!session.started);
        assert!(session.is_open());
        assert!(session.cue.is_none());
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let record = Session::new_record("show", "handle");
        assert!(Session::from_record(record).is_err());
    }

    #[test]
    fn test_open_filter_matches_only_open_started_sessions() {
        let filter = Session::open_filter("show");

        let mut record = Session::new_record("show", "h");
        assert!(!filter.matches(&record));

        record.extend(Session::started_patch());
        assert!(filter.matches(&record));

        record.extend(Session::ended_patch());
        assert!(!filter.matches(&record));
    }
}
