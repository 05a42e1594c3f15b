//! Runtime configuration values bound to a [`Schema`].
//!
//! A [`Config`] mirrors the tree of schemas it was built from: every nested
//! setting group is backed by a child `Config`. Only explicitly assigned
//! values are stored; everything else resolves from the definition's default
//! each time it is read.
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::{Serialize, Serializer, de::DeserializeOwned, ser::SerializeMap};
use tracing::{debug, trace};

use crate::{
    Schema, StagedConfig,
    definition::SettingDefinition,
    error::{Error, Result},
    value::{self, IntoValue, Value},
};

#[derive(Clone, Debug)]
enum Entry {
    Value(Value),
    Nested(Config),
}

/// The resolved value of one setting.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
    Value(Value),
    Nested(&'a Config),
}

impl<'a> Resolved<'a> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            Resolved::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&'a Config> {
        match self {
            Resolved::Nested(config) => Some(*config),
            Resolved::Value(_) => None,
        }
    }

    /// Flattens a nested group into a map value.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Resolved::Value(value) => Ok(value),
            Resolved::Nested(config) => config.to_value(),
        }
    }
}

/// A mutable, freezable configuration value.
///
/// `Clone` produces an exact copy, frozen state included. Use
/// [`duplicate`](Config::duplicate) for a writable deep copy.
///
/// Two configurations compare equal when their resolved trees are equal,
/// regardless of which schema objects they are bound to.
#[derive(Clone, Debug)]
pub struct Config {
    schema: Arc<Schema>,
    values: HashMap<String, Entry>,
    frozen: bool,
}

impl Config {
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = schema
            .iter()
            .filter_map(|definition| {
                let nested = definition.nested()?;
                Some((
                    definition.name().to_string(),
                    Entry::Nested(Config::new(Arc::clone(nested))),
                ))
            })
            .collect();

        Self {
            schema,
            values,
            frozen: false,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub(crate) fn definition(&self, name: &str) -> Result<&Arc<SettingDefinition>> {
        self.schema
            .lookup(name)
            .ok_or_else(|| Error::UnknownSetting(name.to_string()))
    }

    /// Resolves a setting.
    ///
    /// Assigned values were already passed through the constructor when they
    /// were written. Unassigned settings run the constructor over the default
    /// on every read, so the result is never cached.
    pub fn get(&self, name: &str) -> Result<Resolved<'_>> {
        let definition = self.definition(name)?;

        match self.values.get(name) {
            Some(Entry::Nested(config)) => Ok(Resolved::Nested(config)),
            Some(Entry::Value(value)) => Ok(Resolved::Value(value.clone())),
            None => definition.resolve(None).map(Resolved::Value),
        }
    }

    /// Resolves a setting, flattening nested groups into map values.
    pub fn value(&self, name: &str) -> Result<Value> {
        self.get(name)?.into_value()
    }

    /// Resolves a setting and deserializes it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        Ok(T::deserialize(self.value(name)?)?)
    }

    /// Resolves a dotted path such as `database.host`.
    pub fn get_path(&self, path: &str) -> Result<Value> {
        let (parents, leaf) = split_path(path);
        let mut config = self;
        for segment in parents {
            config = config.nested(segment)?;
        }
        config.value(leaf)
    }

    pub fn nested(&self, name: &str) -> Result<&Config> {
        self.definition(name)?;
        match self.values.get(name) {
            Some(Entry::Nested(config)) => Ok(config),
            _ => Err(Error::NotNested(name.to_string())),
        }
    }

    pub fn nested_mut(&mut self, name: &str) -> Result<&mut Config> {
        self.definition(name)?;
        match self.values.get_mut(name) {
            Some(Entry::Nested(config)) => Ok(config),
            _ => Err(Error::NotNested(name.to_string())),
        }
    }

    /// Assigns a setting.
    ///
    /// The constructor runs immediately and its output is what gets stored.
    /// Assigning a map to a nested group updates the group's fields.
    pub fn set(&mut self, name: &str, raw: impl IntoValue) -> Result<()> {
        if self.frozen {
            return Err(Error::FrozenConfig(name.to_string()));
        }

        let definition = Arc::clone(self.definition(name)?);
        let raw = raw.into_value();

        if definition.is_nested() {
            return match raw {
                values @ Value::Map(_) => self.nested_mut(name)?.update(values),
                _ => Err(Error::InvalidUpdateValue(name.to_string())),
            };
        }

        let resolved = definition.resolve(Some(raw))?;
        trace!(setting = name, "setting assigned");
        self.values
            .insert(name.to_string(), Entry::Value(resolved));
        Ok(())
    }

    /// Serializes `raw` into a [`Value`] and assigns it.
    pub fn set_as<T: Serialize>(&mut self, name: &str, raw: &T) -> Result<()> {
        self.set(name, serde_value::to_value(raw)?)
    }

    /// Assigns the setting at a dotted path such as `database.host`.
    pub fn set_path(&mut self, path: &str, raw: impl IntoValue) -> Result<()> {
        let (parents, leaf) = split_path(path);
        let mut config = self;
        for segment in parents {
            config = config.nested_mut(segment)?;
        }
        config.set(leaf, raw)
    }

    /// Applies a map of `name => value` assignments, descending into nested
    /// groups for map values.
    ///
    /// A batch is a [`Value::Map`], so names are applied in sorted order,
    /// not in the order they were written. Not transactional: when an
    /// assignment fails, the ones sorted before it stay applied. Use
    /// [`stage`](Config::stage) for all-or-nothing batches.
    pub fn update(&mut self, values: Value) -> Result<()> {
        for (name, value) in into_entries(values)? {
            self.set(&name, value)?;
        }
        Ok(())
    }

    /// Resolved settings in declaration order. Nested groups become map values.
    pub fn to_map(&self) -> Result<Vec<(String, Value)>> {
        self.schema
            .names()
            .map(|name| Ok((name.to_string(), self.value(name)?)))
            .collect()
    }

    pub fn to_value(&self) -> Result<Value> {
        let map = self
            .to_map()?
            .into_iter()
            .map(|(name, value)| (Value::String(name), value))
            .collect::<BTreeMap<_, _>>();
        Ok(Value::Map(map))
    }

    /// Deserializes the whole resolved tree into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(self.to_value()?)?)
    }

    /// A writable deep copy bound to the same schema.
    pub fn duplicate(&self) -> Config {
        let values = self
            .values
            .iter()
            .map(|(name, entry)| {
                let entry = match entry {
                    Entry::Nested(config) => Entry::Nested(config.duplicate()),
                    Entry::Value(value) => Entry::Value(value.clone()),
                };
                (name.clone(), entry)
            })
            .collect();

        Config {
            schema: Arc::clone(&self.schema),
            values,
            frozen: false,
        }
    }

    /// Carries the stored values over to another schema snapshot.
    ///
    /// Stored values are already constructed, so a value is kept only while
    /// its setting is backed by the very same definition. A redeclared
    /// setting falls back to its new default and constructor. Values for
    /// names the new schema no longer declares are dropped, and nested
    /// groups the new schema adds start out empty.
    pub fn rebind(&self, schema: Arc<Schema>) -> Config {
        let mut values = HashMap::new();

        for definition in schema.iter() {
            let name = definition.name();
            let unchanged = self
                .schema
                .lookup(name)
                .is_some_and(|old| Arc::ptr_eq(old, definition));

            let entry = match (definition.nested(), self.values.get(name)) {
                (Some(nested), Some(Entry::Nested(old))) => {
                    Entry::Nested(old.rebind(Arc::clone(nested)))
                }
                (Some(nested), _) => Entry::Nested(Config::new(Arc::clone(nested))),
                (None, Some(Entry::Value(value))) if unchanged => Entry::Value(value.clone()),
                (None, _) => continue,
            };
            values.insert(name.to_string(), entry);
        }

        Config {
            schema,
            values,
            frozen: self.frozen,
        }
    }

    /// Freezes this configuration and every nested group. Calling it again
    /// is a no-op.
    pub fn finalize(&mut self) -> &mut Self {
        if self.frozen {
            return self;
        }

        for entry in self.values.values_mut() {
            if let Entry::Nested(config) = entry {
                config.finalize();
            }
        }
        self.frozen = true;
        debug!(settings = self.schema.len(), "configuration finalized");
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Starts a staged batch of changes on top of this configuration.
    pub fn stage(&self) -> StagedConfig<'_> {
        StagedConfig::new(self)
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        match (self.to_value(), other.to_value()) {
            (Ok(ours), Ok(theirs)) => ours == theirs,
            _ => false,
        }
    }
}

/// Scalar settings are emitted first and nested groups last, each in
/// declaration order, so the output is valid TOML. Settings that resolve to
/// null are skipped.
impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let mut groups = Vec::new();

        for name in self.schema.names() {
            match self
                .get(name)
                .map_err(<S::Error as serde::ser::Error>::custom)?
            {
                Resolved::Nested(config) => groups.push((name, config)),
                Resolved::Value(value) if value::is_null(&value) => {}
                Resolved::Value(value) => map.serialize_entry(name, &value)?,
            }
        }
        for (name, config) in groups {
            map.serialize_entry(name, config)?;
        }

        map.end()
    }
}

fn split_path(path: &str) -> (Vec<&str>, &str) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or(path);
    (segments, leaf)
}

/// Splits a batch into `(name, value)` pairs.
pub(crate) fn into_entries(values: Value) -> Result<Vec<(String, Value)>> {
    let map = match values {
        Value::Map(map) => map,
        other => {
            return Err(Error::Argument(format!(
                "expected a map of settings, got {other:?}"
            )));
        }
    };

    map.into_iter()
        .map(|(key, value)| match key {
            Value::String(name) => Ok((name, value)),
            other => Err(Error::Argument(format!(
                "setting names must be strings, got {other:?}"
            ))),
        })
        .collect()
}
