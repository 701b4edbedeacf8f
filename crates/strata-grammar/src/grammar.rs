//! Dialects: unified registries of one or more families.

use indexmap::IndexMap;
use strata_core::{Error, Handle, Result, Store, Value};
use tracing::debug;

use crate::family::Family;
use crate::schema::{FieldData, Rule, Schema};

/// A closed node-kind vocabulary made of one or more families.
///
/// Schema names are unique across the whole dialect.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    registry: IndexMap<String, Schema>,
    owners: IndexMap<String, String>,
    families: Vec<String>,
}

/// Builds a [`Grammar`] from a list of families.
///
/// Evaluates to `Result<Grammar>`; a name declared by two families is an
/// [`Error::SchemaConflict`](strata_core::Error::SchemaConflict).
#[macro_export]
macro_rules! dialect {
    ($($family:ty),+ $(,)?) => {
        (|| -> $crate::__core::Result<$crate::Grammar> {
            let mut grammar = $crate::Grammar::new();
            $( grammar.add_family::<$family>()?; )+
            ::std::result::Result::Ok(grammar)
        })()
    };
}

impl Grammar {
    /// Creates an empty dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a family, builder style.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaConflict`] if a rule name is already registered.
    pub fn with_family<F: Family>(mut self) -> Result<Self> {
        self.add_family::<F>()?;
        Ok(self)
    }

    /// Adds a family.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaConflict`] if a rule name is already registered. The
    /// dialect is left unchanged on error.
    pub fn add_family<F: Family>(&mut self) -> Result<()> {
        self.add_schemas(F::NAME, F::schemas())
    }

    /// Adds a family described at runtime.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaConflict`] if a schema name is already registered or
    /// repeated within `schemas`. The dialect is left unchanged on error.
    pub fn add_schemas<I>(&mut self, family: &str, schemas: I) -> Result<()>
    where
        I: IntoIterator<Item = Schema>,
    {
        let schemas: Vec<Schema> = schemas.into_iter().collect();
        for (i, schema) in schemas.iter().enumerate() {
            let repeated = schemas[..i].iter().any(|s| s.name() == schema.name());
            if repeated || self.registry.contains_key(schema.name()) {
                return Err(Error::SchemaConflict(schema.name().to_string()));
            }
        }

        debug!(family, rules = schemas.len(), "family registered");
        for schema in schemas {
            self.owners.insert(schema.name().to_string(), family.to_string());
            self.registry.insert(schema.name().to_string(), schema);
        }
        self.families.push(family.to_string());
        Ok(())
    }

    /// Family names, in the order they were added.
    #[must_use]
    pub fn families(&self) -> Vec<&str> {
        self.families.iter().map(String::as_str).collect()
    }

    /// Looks up a schema by name.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.registry.get(name)
    }

    /// The family that declared `name`.
    #[must_use]
    pub fn family_of(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(String::as_str)
    }

    /// Every schema, in registration order.
    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.registry.values()
    }

    /// Looks up a schema, failing for names outside the dialect.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNodeKind`].
    pub fn resolve(&self, name: &str) -> Result<&Schema> {
        self.schema(name)
            .ok_or_else(|| Error::UnknownNodeKind(name.to_string()))
    }

    /// Binds this dialect to a store for writing.
    ///
    /// The builder holds the store exclusively until it is dropped.
    pub fn bind<'g, 's>(&'g self, store: &'s mut Store) -> Builder<'g, 's> {
        Builder {
            grammar: self,
            store,
        }
    }

    /// Matches `node` against its schema, giving named-field access.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNodeKind`] if the head is not in the dialect,
    /// [`Error::SchemaMismatch`] if the arguments do not fit.
    pub fn match_node(&self, store: &Store, node: Handle) -> Result<Match<'_>> {
        let expr = store.read(node)?;
        let schema = self.resolve(expr.head())?;
        let fields = schema.split(expr.args())?;
        Ok(Match {
            schema,
            node,
            fields,
        })
    }
}

/// Writes schema-checked nodes into one store.
#[derive(Debug)]
pub struct Builder<'g, 's> {
    grammar: &'g Grammar,
    store: &'s mut Store,
}

impl Builder<'_, '_> {
    /// Appends a typed rule.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownNodeKind`] if the rule is not in the dialect,
    /// [`Error::SchemaMismatch`] if its arguments disagree with the
    /// registered schema, or a store error.
    pub fn write<R: Rule>(&mut self, rule: R) -> Result<Handle> {
        self.write_fields(R::NAME, rule.into_args())
    }

    /// Appends a node by schema name.
    ///
    /// # Errors
    ///
    /// As [`Builder::write`].
    pub fn write_fields<I>(&mut self, name: &str, args: I) -> Result<Handle>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        self.grammar.resolve(name)?.check_args(&args)?;
        self.store.append(name, args)
    }

    /// Reads a node back as a typed rule.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the node is another rule.
    pub fn read<R: Rule>(&self, node: Handle) -> Result<R> {
        R::read(self.store, node)
    }

    /// The bound dialect.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        self.grammar
    }

    /// The bound store.
    #[must_use]
    pub fn store(&self) -> &Store {
        self.store
    }

    /// The bound store, for unchecked appends.
    pub fn store_mut(&mut self) -> &mut Store {
        self.store
    }
}

/// A node matched against its schema.
#[derive(Clone, Debug)]
pub struct Match<'g> {
    schema: &'g Schema,
    node: Handle,
    fields: Vec<FieldData>,
}

impl<'g> Match<'g> {
    /// The matched schema.
    #[must_use]
    pub fn schema(&self) -> &'g Schema {
        self.schema
    }

    /// The schema name.
    #[must_use]
    pub fn name(&self) -> &'g str {
        self.schema.name()
    }

    /// The matched node.
    #[must_use]
    pub fn node(&self) -> Handle {
        self.node
    }

    /// A field by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldData> {
        self.schema
            .fields()
            .iter()
            .position(|f| f.name() == field)
            .map(|i| &self.fields[i])
    }

    /// `(name, data)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'g str, &FieldData)> + '_ {
        self.schema
            .fields()
            .iter()
            .map(crate::schema::Field::name)
            .zip(self.fields.iter())
    }
}
