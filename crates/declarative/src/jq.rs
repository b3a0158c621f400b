//! jq expression evaluation backed by jaq.

use crate::error::{Error, Result};
use jaq_interpret::{Ctx, FilterT, ParseCtx, RcIter, Val};
use serde_json::Value;

/// A compiled jq program.
pub struct JqProgram {
    source: String,
    filter: jaq_interpret::Filter,
}

impl JqProgram {
    /// Compile an expression with the jq standard library available.
    pub fn compile(expression: &str) -> Result<Self> {
        let mut defs = ParseCtx::new(Vec::new());
        defs.insert_natives(jaq_core::core());
        defs.insert_defs(jaq_std::std());

        let (main, errs) = jaq_parse::parse(expression, jaq_parse::main());
        if let Some(first) = errs.first() {
            return Err(Error::expression(expression, format!("{first:?}")));
        }
        let Some(main) = main else {
            return Err(Error::expression(expression, "empty expression"));
        };

        let filter = defs.compile(main);
        if !defs.errs.is_empty() {
            return Err(Error::expression(
                expression,
                format!("{} undefined reference(s)", defs.errs.len()),
            ));
        }

        Ok(Self {
            source: expression.to_string(),
            filter,
        })
    }

    /// Source text of the program.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run the program on one input and collect every emitted value.
    pub fn run(&self, input: Value) -> Result<Vec<Value>> {
        let inputs = RcIter::new(core::iter::empty());
        let mut outputs = Vec::new();
        for item in self.filter.run((Ctx::new([], &inputs), Val::from(input))) {
            let value = item.map_err(|e| Error::expression(&self.source, e.to_string()))?;
            outputs.push(Value::from(value));
        }
        Ok(outputs)
    }
}

/// Evaluate a projection: zero outputs give `null`, one output gives that
/// value, several outputs give an array.
pub fn project(expression: &str, input: Value) -> Result<Value> {
    let mut outputs = JqProgram::compile(expression)?.run(input)?;
    Ok(match outputs.len() {
        0 => Value::Null,
        1 => outputs.remove(0),
        _ => Value::Array(outputs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_identity() {
        let program = JqProgram::compile(".").unwrap();
        let out = program.run(json!({"a": 1})).unwrap();
        assert_eq!(out, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_run_multiple_outputs() {
        let program = JqProgram::compile(".[] | .name").unwrap();
        let out = program
            .run(json!([{"name": "a"}, {"name": "b"}]))
            .unwrap();
        assert_eq!(out, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_compile_error_is_validation() {
        let err = JqProgram::compile(".[").err().unwrap();
        assert_eq!(err.category(), crate::ErrorCategory::Validation);
    }

    #[test]
    fn test_runtime_error() {
        let program = JqProgram::compile(".a.b").unwrap();
        assert!(program.run(json!({"a": 5})).is_err());
    }

    #[test]
    fn test_project_cardinality() {
        assert_eq!(project("empty", json!(1)).unwrap(), Value::Null);
        assert_eq!(project(".x", json!({"x": 2})).unwrap(), json!(2));
        assert_eq!(project(".[]", json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_std_functions_available() {
        let out = project("map(select(.ok))", json!([{"ok": true}, {"ok": false}])).unwrap();
        assert_eq!(out, json!([{"ok": true}]));
    }
}
