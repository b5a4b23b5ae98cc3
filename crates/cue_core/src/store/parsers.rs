//! Id parsers for records crossing the store boundary
//!
//! Foreign records carry their own `id`. Before they are stored that id is
//! moved to `externalId` so the store can own `id`; on the way out it is
//! moved back.

use serde_json::Value;

fn rename_field(value: Value, from: &str, to: &str) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_field(item, from, to))
                .collect(),
        ),
        Value::Object(mut record) => {
            if let Some(id) = record.remove(from) {
                record.remove(to);
                if !id.is_null() {
                    record.insert(to.to_string(), id);
                }
            }
            Value::Object(record)
        }
        other => other,
    }
}

/// Move `id` to `externalId` on an object or on every object of an array.
pub fn parse_input_id(value: Value) -> Value {
    rename_field(value, "id", "externalId")
}

/// Move `externalId` back to `id` on an object or on every object of an array.
pub fn parse_output_id(value: Value) -> Value {
    rename_field(value, "externalId", "id")
}
