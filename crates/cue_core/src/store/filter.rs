use serde_json::Value;

use super::Record;

/// Exact-match conjunction over named fields.
///
/// A field missing from a record compares equal to `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Record,
}

impl Filter {
    /// An empty filter, matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(field).unwrap_or(&Value::Null) == expected)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::new().matches(&record(json!({ "a": 1 }))));
        assert!(Filter::new().matches(&Record::new()));
    }

    #[test]
    fn test_all_fields_must_match() {
        let filter = Filter::new().eq("a", 1).eq("b", "x");
        assert!(filter.matches(&record(json!({ "a": 1, "b": "x", "c": true }))));
        assert!(!filter.matches(&record(json!({ "a": 1, "b": "y" }))));
        assert!(!filter.matches(&record(json!({ "a": 1 }))));
    }

    #[test]
    fn test_missing_field_equals_null() {
        let filter = Filter::new().eq("cue", Value::Null);
        assert!(filter.matches(&record(json!({ "a": 1 }))));
        assert!(!filter.matches(&record(json!({ "cue": "Q1" }))));
    }
}
