use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::store::{from_record, Filter, Record};

/// A participant's response, scoped to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    /// Store-assigned identity.
    pub id: String,

    /// Correlation id supplied by the caller (or generated on receipt).
    pub external_id: String,

    pub session_id: String,

    #[serde(default)]
    pub cue_id: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub data: Value,
}

impl Interaction {
    pub fn from_record(record: Record) -> Result<Self> {
        from_record(record)
    }

    pub fn new_record(
        session_id: &str,
        external_id: &str,
        cue_id: Option<&str>,
        user_id: Option<&str>,
        data: Value,
    ) -> Record {
        Record::from_iter([
            ("externalId".to_string(), json!(external_id)),
            ("sessionId".to_string(), json!(session_id)),
            ("cueId".to_string(), json!(cue_id)),
            ("userId".to_string(), json!(user_id)),
            ("data".to_string(), data),
        ])
    }

    pub fn session_filter(session_id: &str) -> Filter {
        Filter::new().eq("sessionId", session_id)
    }

    /// Upsert key of an interaction identified by its correlation id.
    pub fn external_filter(session_id: &str, external_id: &str) -> Filter {
        Self::session_filter(session_id).eq("externalId", external_id)
    }

    /// Upsert key of an interaction scoped to a cue and a user.
    pub fn cue_user_filter(session_id: &str, cue_id: Option<&str>, user_id: &str) -> Filter {
        Self::session_filter(session_id)
            .eq("cueId", cue_id)
            .eq("userId", user_id)
    }
}
