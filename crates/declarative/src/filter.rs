//! Collection filtering with the list operation's `jqFilter`.

use crate::error::Result;
use crate::jq::JqProgram;
use crate::metadata::OperationMetadata;
use serde_json::Value;

/// Run the operation's filter over the item list.
///
/// The filter sees the whole list as one array. Emitted arrays are
/// flattened, `null` outputs dropped, anything else kept as an item.
pub fn apply(op: Option<&OperationMetadata>, items: Vec<Value>) -> Result<Vec<Value>> {
    let Some(expression) = op.map(|op| op.jq_filter.trim()).filter(|f| !f.is_empty()) else {
        return Ok(items);
    };
    let program = JqProgram::compile(expression)?;
    let mut filtered = Vec::new();
    for output in program.run(Value::Array(items))? {
        match output {
            Value::Null => {}
            Value::Array(values) => filtered.extend(values.into_iter().filter(|v| !v.is_null())),
            other => filtered.push(other),
        }
    }
    log::debug!("filter {expression:?} kept {} item(s)", filtered.len());
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn op(filter: &str) -> OperationMetadata {
        OperationMetadata {
            jq_filter: filter.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_select_keeps_matching_items() {
        let items = vec![json!({"kind": "keep"}), json!({"kind": "skip"})];
        let out = apply(Some(&op(r#"[.[] | select(.kind=="keep")]"#)), items).unwrap();
        assert_eq!(out, vec![json!({"kind": "keep"})]);
    }

    #[test]
    fn test_streamed_outputs_and_nulls() {
        let items = vec![json!({"n": 1}), json!({"n": 2}), json!({})];
        let out = apply(Some(&op(".[] | .n")), items).unwrap();
        assert_eq!(out, vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_no_filter_is_identity() {
        let items = vec![json!({"a": 1})];
        assert_eq!(apply(None, items.clone()).unwrap(), items);
        assert_eq!(apply(Some(&op("  ")), items.clone()).unwrap(), items);
    }

    #[test]
    fn test_bad_filter_is_validation_error() {
        let err = apply(Some(&op("[.[] |")), vec![json!({})]).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression { .. }));
    }
}
