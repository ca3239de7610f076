//! Typed model of story arguments.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Printed value used for every function placeholder.
pub const FUNCTION_PLACEHOLDER: &str = "() => {}";

/// Ordered map from argument name to value. Later inserts win.
pub type ArgumentMap = IndexMap<String, ArgumentValue>;

/// A statically extracted argument value.
///
/// Nothing here is ever evaluated: functions collapse to a placeholder,
/// unsupported expressions keep their printed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ArgumentValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Null,
    /// Function, method or placeholder helper such as `fn()`.
    Function,
    /// Object or array literal, serialized as JSON.
    Object(String),
    /// JSX markup, as written.
    Jsx(String),
    /// Identifier or member access. `spread_of` is set for `{...path}`
    /// entries that still have to be replaced by the referenced arguments.
    Reference {
        path: Option<String>,
        #[serde(rename = "spreadOf", skip_serializing_if = "Option::is_none")]
        spread_of: Option<String>,
    },
    /// Anything else, as printed source.
    Unknown(String),
}

impl ArgumentValue {
    pub fn reference(path: impl Into<String>) -> Self {
        ArgumentValue::Reference {
            path: Some(path.into()),
            spread_of: None,
        }
    }

    pub fn spread_of(path: impl Into<String>) -> Self {
        ArgumentValue::Reference {
            path: None,
            spread_of: Some(path.into()),
        }
    }

    /// The spread target of an unresolved `{...path}` entry.
    pub fn spread_target(&self) -> Option<&str> {
        match self {
            ArgumentValue::Reference {
                spread_of: Some(target),
                ..
            } => Some(target),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ArgumentValue::Boolean(_) => "boolean",
            ArgumentValue::Number(_) => "number",
            ArgumentValue::String(_) => "string",
            ArgumentValue::Null => "null",
            ArgumentValue::Function => "function",
            ArgumentValue::Object(_) => "object",
            ArgumentValue::Jsx(_) => "jsx",
            ArgumentValue::Reference { .. } => "reference",
            ArgumentValue::Unknown(_) => "unknown",
        }
    }

    /// Value equality against a plain property value.
    ///
    /// Primitives compare by value. Kinds that carry printed text compare
    /// against a string; serialized objects compare structurally.
    pub fn matches(&self, expected: &Value) -> bool {
        match (self, expected) {
            (ArgumentValue::Boolean(a), Value::Bool(b)) => a == b,
            (ArgumentValue::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
            (ArgumentValue::String(a), Value::String(b)) => a == b,
            (ArgumentValue::Null, Value::Null) => true,
            (ArgumentValue::Function, Value::String(b)) => b == FUNCTION_PLACEHOLDER,
            (ArgumentValue::Object(json), Value::Object(_) | Value::Array(_)) => {
                serde_json::from_str::<Value>(json).is_ok_and(|parsed| &parsed == expected)
            }
            (
                ArgumentValue::Object(a) | ArgumentValue::Jsx(a) | ArgumentValue::Unknown(a),
                Value::String(b),
            ) => a == b,
            (
                ArgumentValue::Reference {
                    path: Some(path), ..
                },
                Value::String(b),
            ) => path == b,
            _ => false,
        }
    }

    /// Plain JSON view, used when an argument map is nested inside an object value.
    pub fn to_json(&self) -> Value {
        match self {
            ArgumentValue::Boolean(b) => Value::Bool(*b),
            ArgumentValue::Number(n) => number_to_json(*n),
            ArgumentValue::String(s) => Value::String(s.clone()),
            ArgumentValue::Null => Value::Null,
            ArgumentValue::Function => Value::String(FUNCTION_PLACEHOLDER.to_string()),
            ArgumentValue::Object(json) => {
                serde_json::from_str(json).unwrap_or_else(|_| Value::String(json.clone()))
            }
            ArgumentValue::Jsx(s) | ArgumentValue::Unknown(s) => Value::String(s.clone()),
            ArgumentValue::Reference { path, spread_of } => {
                Value::String(path.clone().or_else(|| spread_of.clone()).unwrap_or_default())
            }
        }
    }
}

/// Integral values become JSON integers, so `1` prints as `1` and not `1.0`.
pub fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// JSON object view of an argument map.
pub fn arguments_to_json(args: &ArgumentMap) -> Value {
    Value::Object(
        args.iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

/// Whether every property in `props` is present in `args` with an equal value.
///
/// An empty property set matches everything.
pub fn arguments_match(args: &ArgumentMap, props: &serde_json::Map<String, Value>) -> bool {
    props
        .iter()
        .all(|(key, expected)| args.get(key).is_some_and(|value| value.matches(expected)))
}
