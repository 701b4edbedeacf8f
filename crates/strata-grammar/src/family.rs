//! Schema families and the macro that declares them.
//!
//! A family is one namespace of rules. Each rule becomes a struct with named
//! public fields; the family becomes an enum with one variant per rule, so a
//! node read back through the family can be destructured with `match`.
//!
//! ```
//! use strata_core::{Handle, Store};
//! use strata_grammar::{define_family, dialect, Family};
//!
//! define_family! {
//!     /// A tiny calculator.
//!     pub enum Calc {
//!         Num { value: i64 },
//!         Add { lhs: Handle, rhs: Handle },
//!         Tuple { ..items: Handle },
//!     }
//! }
//!
//! let grammar = dialect![Calc].unwrap();
//! let mut store = Store::new();
//! let mut b = grammar.bind(&mut store);
//! let one = b.write(Num { value: 1 }).unwrap();
//! let sum = b.write(Add { lhs: one, rhs: one }).unwrap();
//!
//! match Calc::read(&store, sum).unwrap() {
//!     Calc::Add(Add { lhs, rhs }) => assert_eq!(lhs, rhs),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

use strata_core::{Expr, Handle, Result, Store};

use crate::schema::Schema;

/// A family of rules sharing one name-to-schema namespace.
pub trait Family: Sized {
    /// Family name, used in dialect listings.
    const NAME: &'static str;

    /// Schemas of every rule, in declaration order.
    fn schemas() -> Vec<Schema>;

    /// Destructures `expr` as one of this family's rules.
    ///
    /// # Errors
    ///
    /// [`strata_core::Error::UnknownNodeKind`] if the head is not a rule of
    /// this family, [`strata_core::Error::SchemaMismatch`] if the shape is
    /// wrong.
    fn from_expr(expr: &Expr) -> Result<Self>;

    /// Reads `node` as one of this family's rules.
    ///
    /// # Errors
    ///
    /// See [`Family::from_expr`].
    fn read(store: &Store, node: Handle) -> Result<Self> {
        Self::from_expr(&store.read(node)?)
    }
}

/// Declares a family of rules.
///
/// Every rule lists its fields as `name: Type`, where `Type` implements
/// [`FieldValue`](crate::FieldValue). The last field may be written
/// `..name: Type` to make it a vararg field holding a `Vec<Type>`.
#[macro_export]
macro_rules! define_family {
    (
        $(#[$fmeta:meta])*
        $vis:vis enum $family:ident {
            $(
                $(#[$rmeta:meta])*
                $rule:ident { $($body:tt)* }
            ),* $(,)?
        }
    ) => {
        $(
            $crate::__define_rule!($(#[$rmeta])* $vis $rule { $($body)* });
        )*

        $(#[$fmeta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        $vis enum $family {
            $(
                #[allow(missing_docs)]
                $rule($rule),
            )*
        }

        impl $crate::Family for $family {
            const NAME: &'static str = stringify!($family);

            fn schemas() -> ::std::vec::Vec<$crate::Schema> {
                ::std::vec![$(<$rule as $crate::Rule>::schema()),*]
            }

            fn from_expr(
                expr: &$crate::__core::Expr,
            ) -> $crate::__core::Result<Self> {
                match expr.head() {
                    $(
                        stringify!($rule) => {
                            <$rule as $crate::Rule>::from_args(expr.args()).map($family::$rule)
                        }
                    )*
                    other => ::std::result::Result::Err(
                        $crate::__core::Error::UnknownNodeKind(other.to_string()),
                    ),
                }
            }
        }

        $(
            impl ::std::convert::From<$rule> for $family {
                fn from(rule: $rule) -> Self {
                    $family::$rule(rule)
                }
            }
        )*
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __define_rule {
    (
        $(#[$meta:meta])*
        $vis:vis $rule:ident { $($field:ident : $ty:ty),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        $vis struct $rule {
            $(
                #[allow(missing_docs)]
                pub $field: $ty,
            )*
        }

        impl $crate::Rule for $rule {
            const NAME: &'static str = stringify!($rule);

            fn schema() -> $crate::Schema {
                $crate::Schema::new_unchecked(
                    stringify!($rule),
                    ::std::vec![$(
                        $crate::Field::new(stringify!($field), <$ty as $crate::FieldValue>::KIND)
                    ),*],
                )
            }

            fn into_args(self) -> ::std::vec::Vec<$crate::__core::Value> {
                ::std::vec![$($crate::FieldValue::into_value(self.$field)),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn from_args(
                args: &[$crate::__core::Value],
            ) -> $crate::__core::Result<Self> {
                let names: &[&str] = &[$(stringify!($field)),*];
                if args.len() != names.len() {
                    return ::std::result::Result::Err($crate::__core::Error::schema_mismatch(
                        stringify!($rule),
                        ::std::format!("expected {} arguments, got {}", names.len(), args.len()),
                    ));
                }
                let mut it = args.iter();
                ::std::result::Result::Ok(Self {
                    $(
                        $field: $crate::field::decode(stringify!($rule), stringify!($field), it.next())?,
                    )*
                })
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis $rule:ident { $($field:ident : $ty:ty ,)* .. $var:ident : $vty:ty $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq)]
        $vis struct $rule {
            $(
                #[allow(missing_docs)]
                pub $field: $ty,
            )*
            #[allow(missing_docs)]
            pub $var: ::std::vec::Vec<$vty>,
        }

        impl $crate::Rule for $rule {
            const NAME: &'static str = stringify!($rule);

            fn schema() -> $crate::Schema {
                $crate::Schema::new_unchecked(
                    stringify!($rule),
                    ::std::vec![
                        $($crate::Field::new(stringify!($field), <$ty as $crate::FieldValue>::KIND),)*
                        $crate::Field::vararg(stringify!($var), <$vty as $crate::FieldValue>::KIND),
                    ],
                )
            }

            fn into_args(self) -> ::std::vec::Vec<$crate::__core::Value> {
                let mut args: ::std::vec::Vec<$crate::__core::Value> =
                    ::std::vec![$($crate::FieldValue::into_value(self.$field)),*];
                args.extend(self.$var.into_iter().map($crate::FieldValue::into_value));
                args
            }

            #[allow(unused_mut, unused_variables)]
            fn from_args(
                args: &[$crate::__core::Value],
            ) -> $crate::__core::Result<Self> {
                let names: &[&str] = &[$(stringify!($field)),*];
                if args.len() < names.len() {
                    return ::std::result::Result::Err($crate::__core::Error::schema_mismatch(
                        stringify!($rule),
                        ::std::format!("expected at least {} arguments, got {}", names.len(), args.len()),
                    ));
                }
                let (fixed, rest) = args.split_at(names.len());
                let mut it = fixed.iter();
                ::std::result::Result::Ok(Self {
                    $(
                        $field: $crate::field::decode(stringify!($rule), stringify!($field), it.next())?,
                    )*
                    $var: rest
                        .iter()
                        .map(|v| $crate::field::decode(stringify!($rule), stringify!($var), ::std::option::Option::Some(v)))
                        .collect::<$crate::__core::Result<::std::vec::Vec<$vty>>>()?,
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use strata_core::{Error, Handle, Store, Value};

    use crate::{Family, Rule};

    define_family! {
        /// Calculator values.
        pub enum Val {
            Num { value: i64 },
            Add { lhs: Handle, rhs: Handle },
            Sub { lhs: Handle, rhs: Handle },
        }
    }

    define_family! {
        enum Varargs {
            Grouped { head: String, ..vargs: Value },
            Tuple { ..args: Handle },
        }
    }

    #[test]
    fn test_generated_schemas() {
        let names: Vec<String> = Val::schemas().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, ["Num", "Add", "Sub"]);

        let add = Add::schema();
        let fields: Vec<&str> = add.fields().iter().map(|f| f.name()).collect();
        assert_eq!(fields, ["lhs", "rhs"]);
        assert_eq!(Val::NAME, "Val");

        let grouped = Grouped::schema();
        assert_eq!(grouped.vararg().map(|f| f.name()), Some("vargs"));
        assert_eq!(Tuple::schema().fixed_arity(), 0);
    }

    #[test]
    fn test_round_trip_through_store() {
        let mut store = Store::new();
        let n = store.append("Num", Num { value: 123 }.into_args()).unwrap();
        let g = store
            .append(
                "Grouped",
                Grouped {
                    head: "heading".to_string(),
                    vargs: vec![Value::Node(n), Value::Int(1321)],
                }
                .into_args(),
            )
            .unwrap();

        assert_eq!(
            store.read(g).unwrap().args(),
            [Value::from("heading"), Value::Node(n), Value::Int(1321)]
        );

        let back = Grouped::read(&store, g).unwrap();
        assert_eq!(back.head, "heading");
        assert_eq!(back.vargs, [Value::Node(n), Value::Int(1321)]);

        match Varargs::read(&store, g).unwrap() {
            Varargs::Grouped(Grouped { head, vargs }) => {
                assert_eq!(head, "heading");
                assert_eq!(vargs.len(), 2);
            }
            Varargs::Tuple(_) => panic!("read as the wrong rule"),
        }
    }

    #[test]
    fn test_read_errors() {
        let mut store = Store::new();
        let n = store.append("Num", [1]).unwrap();
        let bad = store.append("Num", ["one"]).unwrap();
        let other = store.append("Mul", [n, n]).unwrap();

        assert!(matches!(Add::read(&store, n), Err(Error::SchemaMismatch { .. })));
        assert!(matches!(Num::read(&store, bad), Err(Error::SchemaMismatch { .. })));
        assert_eq!(
            Val::read(&store, other).unwrap_err(),
            Error::UnknownNodeKind("Mul".to_string())
        );
        assert_eq!(Num::match_expr(&store.read(other).unwrap()).unwrap(), None);
    }
}
