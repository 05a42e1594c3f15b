//! Copy-on-write sharing of schemas and configuration between an owner and
//! the owners derived from it.
//!
//! A derived owner starts out pointing at its parent's [`Schema`] and holding
//! a snapshot copy of the parent's configuration. The schema stays shared
//! until the child declares a setting of its own; only then is it forked.
//! Configuration snapshots are never shared, so writes on either side stay
//! invisible to the other.

use std::sync::Arc;

use tracing::debug;

use crate::{
    Config, Configurable, Schema, SchemaCompiler,
    error::{Error, Result},
};

/// What an owner inherited from its parent at derivation time.
#[derive(Debug, Default)]
pub(crate) struct Lineage {
    pub(crate) ancestor_schema: Option<Arc<Schema>>,
    pub(crate) inherited: Option<Config>,
}

pub struct InheritanceCoordinator;

impl InheritanceCoordinator {
    /// Creates a child of `parent` sharing its schema and holding a writable
    /// copy of whatever configuration the parent currently has.
    pub fn on_derive(parent: &Configurable, name: impl Into<String>) -> Configurable {
        let name = name.into();
        let schema = Arc::clone(parent.schema());
        let inherited = parent.current_config().map(Config::duplicate);

        debug!(
            parent = parent.name(),
            child = %name,
            with_config = inherited.is_some(),
            "deriving configurable"
        );

        let lineage = Lineage {
            ancestor_schema: Some(Arc::clone(&schema)),
            inherited,
        };
        Configurable::from_parts(name, schema, lineage, parent.readers.clone())
    }

    /// Whether `owner` still points at the very schema object it inherited.
    pub fn shares_ancestor_schema(owner: &Configurable) -> bool {
        owner
            .lineage
            .ancestor_schema
            .as_ref()
            .is_some_and(|ancestor| Arc::ptr_eq(ancestor, &owner.schema))
    }

    /// Runs a declaration script against the owner's schema.
    ///
    /// The script runs against a working copy of the schema, which replaces
    /// the owner's schema only when the script succeeds. A rejected
    /// declaration leaves the owner still sharing its ancestor's schema.
    /// The inherited configuration snapshot is rebound to the new shape
    /// afterwards. `label` names the declaration in errors.
    pub(crate) fn declare<F, T>(owner: &mut Configurable, label: &str, script: F) -> Result<T>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<T>,
    {
        if owner.config.get().is_some() {
            return Err(Error::AlreadyDefinedConfig(label.to_string()));
        }
        if owner.schema.is_frozen() {
            return Err(Error::FrozenSchema(label.to_string()));
        }

        let mut next = Schema::clone(&owner.schema);
        let output = script(&mut SchemaCompiler::new(&mut next))?;

        if Self::shares_ancestor_schema(owner) {
            debug!(owner = %owner.name, setting = label, "forking schema from ancestor");
        }
        owner.schema = Arc::new(next);

        if let Some(inherited) = owner.lineage.inherited.take() {
            owner.lineage.inherited = Some(inherited.rebind(Arc::clone(&owner.schema)));
        }
        for definition in owner.schema.iter().filter(|d| d.is_reader()) {
            owner.readers.insert(definition.name().to_string());
        }

        Ok(output)
    }
}
