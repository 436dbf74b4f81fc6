use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::number;
use crate::template::{Accessor, KeyPath};
use crate::RenderError;

type LazyFn = dyn Fn() -> Value + Send + Sync;

/// A render argument.
///
/// Objects keep their entries in insertion order so `%j` output is stable.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
    /// A zero-argument callable, invoked at render time by every conversion except `T` and `v`.
    Lazy(Arc<LazyFn>),
}

impl Value {
    pub fn lazy(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Value::Lazy(Arc::new(f))
    }

    /// Build an object from `(key, value)` pairs, keeping their order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Runtime type tag, as printed by `%T`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Lazy(_) => "function",
        }
    }

    /// JavaScript `Number(value)`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => number::string_to_number(s),
            Value::Array(_) => number::string_to_number(&self.to_js_string()),
            Value::Object(_) | Value::Lazy(_) => f64::NAN,
        }
    }

    /// JavaScript `String(value)`.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number::to_js_string(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Lazy(_) => "[function]".to_string(),
        }
    }

    /// JavaScript truthiness (`!!value`).
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Lazy(_) => true,
        }
    }

    /// Walk a key path, failing on the first accessor that names no own property.
    pub fn get(&self, path: &KeyPath) -> Result<Value, RenderError> {
        let mut current = self.clone();
        for accessor in path.accessors() {
            current = current.member(accessor).ok_or_else(|| RenderError::MissingProperty {
                key: accessor.to_string(),
            })?;
        }
        Ok(current)
    }

    fn member(&self, accessor: &Accessor) -> Option<Value> {
        match (self, accessor) {
            (Value::Object(entries), accessor) => {
                let key = accessor.to_string();
                entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
            }
            (Value::Array(items), Accessor::Index(i)) => items.get(*i).cloned(),
            (Value::Array(items), Accessor::Key(k)) if k == "length" => {
                Some(Value::Number(items.len() as f64))
            }
            (Value::String(s), Accessor::Index(i)) => {
                s.chars().nth(*i).map(|c| Value::String(c.to_string()))
            }
            (Value::String(s), Accessor::Key(k)) if k == "length" => {
                Some(Value::Number(s.chars().count() as f64))
            }
            _ => None,
        }
    }

    pub(crate) fn to_json(&self, indent: usize) -> Result<String, RenderError> {
        let json_err = |e: serde_json::Error| RenderError::Json { message: e.to_string() };
        if indent == 0 {
            return serde_json::to_string(self).map_err(json_err);
        }
        let pad = " ".repeat(indent.min(10));
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(pad.as_bytes());
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(json_err)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Lazy(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => {
                if !n.is_finite() {
                    serializer.serialize_unit()
                } else if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(entries) => {
                let mut map = serializer.serialize_map(None)?;
                for (k, v) in entries {
                    if matches!(v, Value::Lazy(_)) {
                        continue;
                    }
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(entries) => f.debug_tuple("Object").field(entries).finish(),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Lazy(a), Value::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

macro_rules! from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

from_number!(f64, f32, i64, i32, u32, u64, usize);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
