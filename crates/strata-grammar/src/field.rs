//! Field kinds and the conversions between Rust field types and values.

use std::fmt;
use std::sync::Arc;

use strata_core::{Error, Handle, Result, Value};

/// The kind of value a schema field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// An integer literal.
    Int,
    /// A boolean literal.
    Bool,
    /// A string or symbol atom.
    Str,
    /// A reference to another node.
    Node,
    /// Any value.
    Any,
}

impl FieldKind {
    /// Returns true if `value` is acceptable for this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldKind::Any, _)
                | (FieldKind::Int, Value::Int(_))
                | (FieldKind::Bool, Value::Bool(_))
                | (FieldKind::Str, Value::Str(_))
                | (FieldKind::Node, Value::Node(_))
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Str => "str",
            FieldKind::Node => "node",
            FieldKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// A Rust type usable as a rule field.
pub trait FieldValue: Sized {
    /// The schema kind of this type.
    const KIND: FieldKind;

    /// Converts into a storable value.
    fn into_value(self) -> Value;

    /// Converts back, or `None` if the value has the wrong kind.
    fn from_value(value: &Value) -> Option<Self>;
}

impl FieldValue for i64 {
    const KIND: FieldKind = FieldKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }
}

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Str;

    fn into_value(self) -> Value {
        Value::from(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FieldValue for Arc<str> {
    const KIND: FieldKind = FieldKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FieldValue for Handle {
    const KIND: FieldKind = FieldKind::Node;

    fn into_value(self) -> Value {
        Value::Node(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_node()
    }
}

impl FieldValue for Value {
    const KIND: FieldKind = FieldKind::Any;

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

/// Decodes one field of a record, reporting the schema on failure.
///
/// # Errors
///
/// [`Error::SchemaMismatch`] if the value is missing or has the wrong kind.
#[doc(hidden)]
pub fn decode<T: FieldValue>(schema: &str, field: &str, value: Option<&Value>) -> Result<T> {
    let value = value.ok_or_else(|| Error::schema_mismatch(schema, format!("missing field `{field}`")))?;
    T::from_value(value).ok_or_else(|| {
        Error::schema_mismatch(
            schema,
            format!("field `{field}` expects {}, got {value}", T::KIND),
        )
    })
}
