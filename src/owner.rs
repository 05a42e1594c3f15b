//! Owners: the things settings are declared on and configuration is read from.

use std::{
    collections::BTreeSet,
    sync::{Arc, OnceLock},
};

use tracing::debug;

use crate::{
    Config, InheritanceCoordinator, Schema, SchemaCompiler, Setting, SettingDefinition,
    error::{Error, Result},
    inherit::Lineage,
    value::Value,
};

/// An owner of a settings schema and of the configuration built from it.
///
/// Settings are declared up front. The configuration is built lazily on the
/// first call to [`config`](Configurable::config), exactly once even when
/// several threads race for it, and from then on the schema is locked.
///
/// ```rust
/// use next_settings::{Configurable, IntoValue, Setting};
///
/// let mut app = Configurable::new("App");
/// app.setting("db", Setting::new().default("sqlite").reader())?;
///
/// let mut worker = app.derive("Worker");
/// worker.config_mut().set("db", "postgres")?;
///
/// assert_eq!(app.read("db")?, "sqlite".into_value());
/// assert_eq!(worker.read("db")?, "postgres".into_value());
/// # Ok::<(), next_settings::Error>(())
/// ```
#[derive(Debug)]
pub struct Configurable {
    pub(crate) name: String,
    pub(crate) schema: Arc<Schema>,
    pub(crate) lineage: Lineage,
    pub(crate) config: OnceLock<Config>,
    pub(crate) readers: BTreeSet<String>,
}

impl Configurable {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_parts(
            name.into(),
            Arc::new(Schema::new()),
            Lineage::default(),
            BTreeSet::new(),
        )
    }

    pub(crate) fn from_parts(
        name: String,
        schema: Arc<Schema>,
        lineage: Lineage,
        readers: BTreeSet<String>,
    ) -> Self {
        Self {
            name,
            schema,
            lineage,
            config: OnceLock::new(),
            readers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Declared setting names in declaration order.
    pub fn settings(&self) -> impl Iterator<Item = &str> {
        self.schema.names()
    }

    pub fn setting(&mut self, name: &str, setting: Setting) -> Result<Arc<SettingDefinition>> {
        InheritanceCoordinator::declare(self, name, |s| s.setting(name, setting))
    }

    pub fn nested<F>(&mut self, name: &str, block: F) -> Result<Arc<SettingDefinition>>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<()>,
    {
        InheritanceCoordinator::declare(self, name, |s| s.nested(name, block))
    }

    pub fn nested_with<F>(
        &mut self,
        name: &str,
        setting: Setting,
        block: F,
    ) -> Result<Arc<SettingDefinition>>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<()>,
    {
        InheritanceCoordinator::declare(self, name, |s| s.nested_with(name, setting, block))
    }

    /// Copies the definitions of another schema into this owner's schema.
    pub fn include(&mut self, other: &Schema) -> Result<()> {
        let label = other.names().next().unwrap_or_default().to_string();
        InheritanceCoordinator::declare(self, &label, |s| s.include(other))
    }

    /// Includes a registered [`SettingGroup`](crate::SettingGroup).
    pub fn include_group(&mut self, group: &str) -> Result<()> {
        InheritanceCoordinator::declare(self, group, |s| s.include_group(group))
    }

    /// Creates a child owner. See [`InheritanceCoordinator::on_derive`].
    pub fn derive(&self, name: impl Into<String>) -> Configurable {
        InheritanceCoordinator::on_derive(self, name)
    }

    /// Whether this owner still shares its parent's schema object.
    pub fn shares_parent_schema(&self) -> bool {
        InheritanceCoordinator::shares_ancestor_schema(self)
    }

    /// The configuration, built on first access.
    pub fn config(&self) -> &Config {
        self.config.get_or_init(|| self.build_config())
    }

    pub fn config_mut(&mut self) -> &mut Config {
        if self.config.get().is_none() {
            self.config = OnceLock::from(self.build_config());
        }
        self.config
            .get_mut()
            .expect("configuration was initialized above")
    }

    fn build_config(&self) -> Config {
        debug!(owner = %self.name, settings = self.schema.len(), "building configuration");
        match &self.lineage.inherited {
            Some(inherited) => inherited.rebind(Arc::clone(&self.schema)),
            None => Config::new(Arc::clone(&self.schema)),
        }
    }

    /// The built configuration, or the snapshot inherited from the parent
    /// when nothing has been built yet.
    pub(crate) fn current_config(&self) -> Option<&Config> {
        self.config.get().or(self.lineage.inherited.as_ref())
    }

    pub fn is_configured(&self) -> bool {
        self.config.get().is_some()
    }

    /// Runs `f` against the configuration, then finalizes it.
    pub fn configure<F>(&mut self, f: F) -> Result<&Config>
    where
        F: FnOnce(&mut Config) -> Result<()>,
    {
        let config = self.config_mut();
        f(config)?;
        Ok(&*config.finalize())
    }

    pub fn finalize(&mut self) -> &Config {
        self.config_mut().finalize()
    }

    /// Reads a setting through its reader shortcut.
    pub fn read(&self, name: &str) -> Result<Value> {
        read_through(&self.readers, self.config(), name)
    }

    pub fn readers(&self) -> impl Iterator<Item = &str> {
        self.readers.iter().map(String::as_str)
    }

    /// Creates an instance carrying a writable copy of this owner's
    /// configuration and its reader shortcuts.
    pub fn instance(&self) -> Instance {
        Instance {
            owner: self.name.clone(),
            config: self.config().duplicate(),
            readers: self.readers.clone(),
        }
    }
}

fn read_through(readers: &BTreeSet<String>, config: &Config, name: &str) -> Result<Value> {
    match readers.contains(name) {
        true => config.value(name),
        false => Err(Error::UndefinedReader(name.to_string())),
    }
}

/// An object created from a [`Configurable`], with its own configuration.
#[derive(Debug)]
pub struct Instance {
    owner: String,
    config: Config,
    readers: BTreeSet<String>,
}

impl Instance {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn configure<F>(&mut self, f: F) -> Result<&Config>
    where
        F: FnOnce(&mut Config) -> Result<()>,
    {
        f(&mut self.config)?;
        Ok(&*self.config.finalize())
    }

    pub fn finalize(&mut self) -> &Config {
        self.config.finalize()
    }

    pub fn read(&self, name: &str) -> Result<Value> {
        read_through(&self.readers, &self.config, name)
    }
}
