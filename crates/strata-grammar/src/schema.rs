//! Node schemas and typed rules.

use strata_core::{Error, Expr, Handle, Result, Store, Value};

use crate::field::FieldKind;

/// A named field of a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    vararg: bool,
}

impl Field {
    /// A single-valued field.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            vararg: false,
        }
    }

    /// A variable-length field, flattened into the trailing arguments.
    #[must_use]
    pub fn vararg(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            vararg: true,
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of each value in this field.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns true for a vararg field.
    #[must_use]
    pub fn is_vararg(&self) -> bool {
        self.vararg
    }
}

/// Values of one field of a matched node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldData {
    /// A single-valued field.
    One(Value),
    /// A vararg field.
    Many(Vec<Value>),
}

impl FieldData {
    /// The value of a single-valued field.
    #[must_use]
    pub fn as_one(&self) -> Option<&Value> {
        match self {
            FieldData::One(v) => Some(v),
            FieldData::Many(_) => None,
        }
    }

    /// The values of a vararg field.
    #[must_use]
    pub fn as_many(&self) -> Option<&[Value]> {
        match self {
            FieldData::Many(vs) => Some(vs),
            FieldData::One(_) => None,
        }
    }
}

/// The declared shape of a node kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if a vararg field is not last, or two
    /// fields share a name.
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Result<Self> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            if field.vararg && i + 1 != fields.len() {
                return Err(Error::schema_mismatch(
                    name,
                    format!("vararg field `{}` must be the last field", field.name),
                ));
            }
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::schema_mismatch(
                    name,
                    format!("field `{}` declared twice", field.name),
                ));
            }
        }
        Ok(Self { name, fields })
    }

    /// Creates a schema that is valid by construction.
    #[doc(hidden)]
    #[must_use]
    pub fn new_unchecked(name: &str, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    /// Schema name, which is also the head of its nodes.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// The trailing vararg field, if any.
    #[must_use]
    pub fn vararg(&self) -> Option<&Field> {
        self.fields.last().filter(|f| f.vararg)
    }

    /// Number of single-valued fields.
    #[must_use]
    pub fn fixed_arity(&self) -> usize {
        self.fields.len() - usize::from(self.vararg().is_some())
    }

    /// Checks argument count and kinds against this schema.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] on any disagreement.
    pub fn check_args(&self, args: &[Value]) -> Result<()> {
        let fixed = self.fixed_arity();
        let arity_ok = match self.vararg() {
            Some(_) => args.len() >= fixed,
            None => args.len() == fixed,
        };
        if !arity_ok {
            let expected = if self.vararg().is_some() {
                format!("at least {fixed}")
            } else {
                fixed.to_string()
            };
            return Err(Error::schema_mismatch(
                &self.name,
                format!("expected {expected} arguments, got {}", args.len()),
            ));
        }

        for (i, arg) in args.iter().enumerate() {
            let field = &self.fields[i.min(self.fields.len() - 1)];
            if !field.kind.accepts(arg) {
                return Err(Error::schema_mismatch(
                    &self.name,
                    format!("field `{}` expects {}, got {arg}", field.name, field.kind),
                ));
            }
        }
        Ok(())
    }

    /// Splits a record's arguments into per-field data.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the arguments do not fit.
    pub fn split(&self, args: &[Value]) -> Result<Vec<FieldData>> {
        self.check_args(args)?;
        let fixed = self.fixed_arity();
        let mut out: Vec<FieldData> = args[..fixed].iter().cloned().map(FieldData::One).collect();
        if self.vararg().is_some() {
            out.push(FieldData::Many(args[fixed..].to_vec()));
        }
        Ok(out)
    }
}

/// A typed node kind, usually generated by [`define_family!`](crate::define_family).
pub trait Rule: Sized {
    /// Schema name and node head.
    const NAME: &'static str;

    /// The schema for this rule.
    fn schema() -> Schema;

    /// Flattens the fields into arguments, vararg last.
    fn into_args(self) -> Vec<Value>;

    /// Rebuilds the rule from arguments.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the arguments do not fit.
    fn from_args(args: &[Value]) -> Result<Self>;

    /// Destructures `expr`, or `None` if its head names another rule.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the head matches but the arguments do not.
    fn match_expr(expr: &Expr) -> Result<Option<Self>> {
        if expr.head() == Self::NAME {
            Self::from_args(expr.args()).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads `node` as this rule.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the node has another head or shape.
    fn read(store: &Store, node: Handle) -> Result<Self> {
        let expr = store.read(node)?;
        Self::match_expr(&expr)?.ok_or_else(|| {
            Error::schema_mismatch(
                Self::NAME,
                format!("node {node} has head `{}`", expr.head()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grouped() -> Schema {
        Schema::new(
            "Grouped",
            vec![
                Field::new("head", FieldKind::Str),
                Field::vararg("vargs", FieldKind::Any),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_vararg_must_be_last() {
        let err = Schema::new(
            "Bad",
            vec![
                Field::vararg("items", FieldKind::Node),
                Field::new("tail", FieldKind::Int),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = Schema::new(
            "Pair",
            vec![Field::new("x", FieldKind::Int), Field::new("x", FieldKind::Int)],
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_split_vararg_suffix() {
        let schema = grouped();
        assert_eq!(schema.fixed_arity(), 1);

        let args = [Value::from("h"), Value::Int(1), Value::Int(2)];
        let fields = schema.split(&args).unwrap();
        assert_eq!(fields[0], FieldData::One(Value::from("h")));
        assert_eq!(fields[1].as_many(), Some(&args[1..]));

        let empty = schema.split(&args[..1]).unwrap();
        assert_eq!(empty[1], FieldData::Many(Vec::new()));
    }

    #[test]
    fn test_check_args_arity_and_kind() {
        let schema = Schema::new(
            "Num",
            vec![Field::new("value", FieldKind::Int)],
        )
        .unwrap();
        assert!(schema.check_args(&[Value::Int(1)]).is_ok());
        assert!(schema.check_args(&[]).is_err());
        assert!(schema.check_args(&[Value::Int(1), Value::Int(2)]).is_err());
        assert!(schema.check_args(&[Value::Bool(true)]).is_err());

        assert!(grouped().check_args(&[]).is_err());
        assert!(grouped().check_args(&[Value::Int(3)]).is_err());
    }
}
