//! Staged updates committed as a new [`Config`] snapshot.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    Config,
    config::into_entries,
    error::{Error, Result},
    value::{IntoValue, Value},
};

/// Buffers writes against a target configuration without touching it.
///
/// Reads fall through to the target for settings that have not been staged.
/// [`commit`](StagedConfig::commit) produces a brand-new, writable
/// configuration equal to the target with every staged write applied. The
/// target itself is never modified, even when it is frozen.
///
/// ```rust
/// use next_settings::{Config, Schema, Setting};
/// use std::sync::Arc;
///
/// let schema = Schema::compile(|s| {
///     s.setting("retries", Setting::new().default(3))?;
///     Ok(())
/// })?;
/// let live = Config::new(Arc::new(schema));
///
/// let mut staged = live.stage();
/// staged.set("retries", 5)?;
/// let next = staged.commit()?;
///
/// assert_eq!(live.get_as::<i32>("retries")?, 3);
/// assert_eq!(next.get_as::<i32>("retries")?, 5);
/// # Ok::<(), next_settings::Error>(())
/// ```
#[derive(Debug)]
pub struct StagedConfig<'a> {
    target: &'a Config,
    writes: BTreeMap<String, Value>,
    nested: BTreeMap<String, StagedConfig<'a>>,
}

impl<'a> StagedConfig<'a> {
    pub(crate) fn new(target: &'a Config) -> Self {
        Self {
            target,
            writes: BTreeMap::new(),
            nested: BTreeMap::new(),
        }
    }

    pub fn target(&self) -> &'a Config {
        self.target
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.nested.values().all(StagedConfig::is_empty)
    }

    /// Resolves a setting as it will read after commit.
    pub fn get(&self, name: &str) -> Result<Value> {
        if let Some(staged) = self.nested.get(name) {
            return staged.to_value();
        }

        match self.writes.get(name) {
            Some(raw) => self.target.definition(name)?.resolve(Some(raw.clone())),
            None => self.target.value(name),
        }
    }

    /// Stages an assignment. Unknown names are rejected right away;
    /// constructors only run on read and on commit.
    pub fn set(&mut self, name: &str, raw: impl IntoValue) -> Result<&mut Self> {
        let definition = self.target.definition(name)?;
        let raw = raw.into_value();

        if definition.is_nested() {
            match raw {
                values @ Value::Map(_) => self.nested(name)?.update(values)?,
                _ => return Err(Error::InvalidUpdateValue(name.to_string())),
            }
        } else {
            self.writes.insert(name.to_string(), raw);
        }

        Ok(self)
    }

    /// The staging scope of a nested group.
    pub fn nested(&mut self, name: &str) -> Result<&mut StagedConfig<'a>> {
        let target = self.target.nested(name)?;
        Ok(self
            .nested
            .entry(name.to_string())
            .or_insert_with(|| StagedConfig::new(target)))
    }

    pub fn update(&mut self, values: Value) -> Result<()> {
        for (name, value) in into_entries(values)? {
            self.set(&name, value)?;
        }
        Ok(())
    }

    pub fn to_value(&self) -> Result<Value> {
        let map = self
            .target
            .schema()
            .names()
            .map(|name| Ok((Value::String(name.to_string()), self.get(name)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Value::Map(map))
    }

    /// Applies the staged writes to a copy of the target. Nested scopes are
    /// committed first and swapped into the copy. Nothing is applied
    /// anywhere if a constructor fails.
    pub fn commit(self) -> Result<Config> {
        let mut config = self.target.duplicate();

        for (name, staged) in self.nested {
            let committed = staged.commit()?;
            *config.nested_mut(&name)? = committed;
        }

        debug!(writes = self.writes.len(), "committing staged configuration");
        for (name, raw) in self.writes {
            config.set(&name, raw)?;
        }

        Ok(config)
    }
}
