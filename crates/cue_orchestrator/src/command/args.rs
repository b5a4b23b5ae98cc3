//! Argument decoding for built-in commands

use cue_core::Cue;
use serde_json::Value;

use crate::error::PipelineError;

/// Ids arrive as strings or numbers depending on the transport.
fn id_arg(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn payload_arg(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

/// `cue [id, data?]`
pub(crate) fn cue(args: &[Value]) -> Result<(String, Option<Value>), PipelineError> {
    let id = args
        .first()
        .and_then(id_arg)
        .ok_or_else(|| PipelineError::invalid("cue", "expected a cue id"))?;
    Ok((id, payload_arg(args.get(1))))
}

/// `interact [data, id?, userId?]`
pub(crate) fn interact(
    args: &[Value],
) -> Result<(Value, Option<String>, Option<String>), PipelineError> {
    let data = args.first().cloned().unwrap_or(Value::Null);
    let id = optional_id(args.get(1), "interaction id")?;
    let user_id = optional_id(args.get(2), "user id")?;
    Ok((data, id, user_id))
}

/// `uninteract [id]`
pub(crate) fn uninteract(args: &[Value]) -> Result<String, PipelineError> {
    args.first()
        .and_then(id_arg)
        .ok_or_else(|| PipelineError::invalid("uninteract", "expected an interaction id"))
}

/// `define [cue | [cue...]...]`
pub(crate) fn define(args: &[Value]) -> Result<Vec<Cue>, PipelineError> {
    let mut cues = Vec::new();

    for arg in args {
        match arg {
            Value::Array(items) => {
                for item in items {
                    cues.push(decode_cue(item)?);
                }
            }
            other => cues.push(decode_cue(other)?),
        }
    }

    if cues.is_empty() {
        return Err(PipelineError::invalid("define", "expected at least one cue"));
    }

    Ok(cues)
}

fn decode_cue(value: &Value) -> Result<Cue, PipelineError> {
    serde_json::from_value(value.clone())
        .map_err(|e| PipelineError::invalid("define", format!("invalid cue: {}", e)))
}

fn optional_id(value: Option<&Value>, what: &str) -> Result<Option<String>, PipelineError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => id_arg(value)
            .map(Some)
            .ok_or_else(|| PipelineError::invalid("interact", format!("invalid {}", what))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cue_args() {
        assert_eq!(cue(&[json!("Q1")]).unwrap(), ("Q1".to_string(), None));
        assert_eq!(
            cue(&[json!(3), json!({ "x": 1 })]).unwrap(),
            ("3".to_string(), Some(json!({ "x": 1 })))
        );
        assert_eq!(cue(&[json!("Q1"), json!(null)]).unwrap().1, None);
        assert!(cue(&[]).is_err());
        assert!(cue(&[json!({ "id": "Q1" })]).is_err());
    }

    #[test]
    fn test_interact_args() {
        let (data, id, user) = interact(&[json!({ "v": 1 }), json!("uid-1"), json!("u1")]).unwrap();
        assert_eq!(data, json!({ "v": 1 }));
        assert_eq!(id.as_deref(), Some("uid-1"));
        assert_eq!(user.as_deref(), Some("u1"));

        let (_, id, user) = interact(&[json!(1), json!(null)]).unwrap();
        assert!(id.is_none() && user.is_none());

        assert!(interact(&[json!(1), json!([1])]).is_err());
    }

    #[test]
    fn test_define_flattens_arrays() {
        let cues = define(&[
            json!({ "id": "A" }),
            json!([{ "id": "B", "duration": 2.0 }, { "id": "C" }]),
        ])
        .unwrap();

        let ids: Vec<&str> = cues.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(cues[1].duration, Some(2.0));
    }

    #[test]
    fn test_define_rejects_garbage() {
        assert!(define(&[]).is_err());
        assert!(define(&[json!("not a cue")]).is_err());
    }
}
