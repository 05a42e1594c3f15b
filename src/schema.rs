//! Ordered, name-keyed collection of setting definitions.

use std::{collections::HashMap, sync::Arc};

use crate::{
    SchemaCompiler,
    definition::SettingDefinition,
    error::{Error, Result},
};

/// The declared shape of a configuration.
///
/// Definitions keep their declaration order. Names are unique: declaring a
/// name that already exists replaces the old definition in place.
///
/// Cloning a schema is shallow. Both copies point at the same immutable
/// [`SettingDefinition`]s but own independent definition lists.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    definitions: Vec<Arc<SettingDefinition>>,
    index: HashMap<String, usize>,
    frozen: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles a declaration script into a fresh schema.
    ///
    /// ```rust
    /// use next_settings::{Schema, Setting};
    ///
    /// let schema = Schema::compile(|s| {
    ///     s.setting("dsn", Setting::new().default("sqlite"))?;
    ///     s.nested("database", |db| {
    ///         db.setting("host", Setting::new().default("localhost"))?;
    ///         Ok(())
    ///     })?;
    ///     Ok(())
    /// })?;
    ///
    /// assert_eq!(schema.names().collect::<Vec<_>>(), ["dsn", "database"]);
    /// # Ok::<(), next_settings::Error>(())
    /// ```
    pub fn compile<F>(script: F) -> Result<Self>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<()>,
    {
        let mut schema = Schema::new();
        script(&mut SchemaCompiler::new(&mut schema))?;
        Ok(schema)
    }

    /// Adds a definition, replacing any existing one with the same name.
    pub fn declare(&mut self, definition: SettingDefinition) -> Result<Arc<SettingDefinition>> {
        if self.frozen {
            return Err(Error::FrozenSchema(definition.name().to_string()));
        }

        let definition = Arc::new(definition);
        self.insert(Arc::clone(&definition));
        Ok(definition)
    }

    fn insert(&mut self, definition: Arc<SettingDefinition>) {
        match self.index.get(definition.name()) {
            Some(&position) => self.definitions[position] = definition,
            None => {
                self.index
                    .insert(definition.name().to_string(), self.definitions.len());
                self.definitions.push(definition);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<SettingDefinition>> {
        self.index.get(name).map(|&position| &self.definitions[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|definition| definition.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SettingDefinition>> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// An unfrozen schema holding the same definitions.
    pub fn duplicate(&self) -> Self {
        Self {
            definitions: self.definitions.clone(),
            index: self.index.clone(),
            frozen: false,
        }
    }

    /// Combines two schemas into a new one, leaving both untouched.
    ///
    /// On a name collision the definition from `other` wins, except when
    /// both definitions are nested groups: then the result carries the
    /// recursive merge of the two nested schemas, so it holds the union of
    /// their fields.
    pub fn merge(&self, other: &Schema) -> Schema {
        let mut merged = self.duplicate();

        for theirs in &other.definitions {
            let ours = merged.lookup(theirs.name()).and_then(|d| d.nested());
            let definition = match (ours, theirs.nested()) {
                (Some(ours), Some(nested)) => {
                    Arc::new(theirs.with_nested(Arc::new(ours.merge(nested))))
                }
                _ => Arc::clone(theirs),
            };
            merged.insert(definition);
        }

        merged
    }

    /// Copies every definition of `other` into this schema.
    ///
    /// Unlike [`merge`](Schema::merge), nested groups are not merged field by
    /// field: a colliding nested definition replaces ours wholesale.
    pub fn merge_in_place(&mut self, other: &Schema) -> Result<()> {
        if let Some(first) = other.definitions.first().filter(|_| self.frozen) {
            return Err(Error::FrozenSchema(first.name().to_string()));
        }

        for definition in &other.definitions {
            self.insert(Arc::clone(definition));
        }

        Ok(())
    }

    /// Makes the schema read-only. Later declarations fail with
    /// [`Error::FrozenSchema`].
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
