//! Immutable description of a single named setting.

use std::{fmt, sync::Arc};

use derive_builder::Builder;

use crate::{
    Schema,
    error::{BoxError, Error, Result},
    value::{self, Value},
};

type ConstructorFn = dyn Fn(Option<Value>) -> Result<Value, BoxError> + Send + Sync;

/// A caller-supplied `value -> value` transform applied whenever a setting
/// is resolved.
///
/// The constructor receives `None` when the setting has neither an explicit
/// value nor a default, which lets it compute a fallback.
#[derive(Clone)]
pub struct Constructor {
    f: Arc<ConstructorFn>,
    identity: bool,
}

impl Constructor {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            identity: false,
        }
    }

    /// Returns its input unchanged, mapping "undefined" to [`value::null`].
    pub fn identity() -> Self {
        Self {
            f: Arc::new(|input| Ok(input.unwrap_or_else(value::null))),
            identity: true,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    pub fn call(&self, input: Option<Value>) -> Result<Value, BoxError> {
        (self.f)(input)
    }
}

impl Default for Constructor {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.identity {
            true => f.write_str("Constructor(identity)"),
            false => f.write_str("Constructor(custom)"),
        }
    }
}

/// One named setting: its default, constructor, reader flag and, for
/// block-form declarations, the nested schema.
///
/// Definitions are never mutated once built. Changing a setting means
/// declaring a replacement definition under the same name.
#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct SettingDefinition {
    #[builder(setter(into))]
    name: String,

    #[builder(default, setter(strip_option))]
    default_value: Option<Value>,

    #[builder(default)]
    constructor: Constructor,

    #[builder(default)]
    reader: bool,

    #[builder(default, setter(strip_option))]
    nested: Option<Arc<Schema>>,
}

impl SettingDefinitionBuilder {
    fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) if !is_identifier(name) => Err(name.clone()),
            _ => Ok(()),
        }
    }
}

impl From<SettingDefinitionBuilderError> for Error {
    fn from(err: SettingDefinitionBuilderError) -> Self {
        match err {
            SettingDefinitionBuilderError::ValidationError(name) => Error::InvalidSettingName(name),
            SettingDefinitionBuilderError::UninitializedField(field) => {
                Error::Argument(format!("setting definition is missing `{field}`"))
            }
        }
    }
}

/// Matches `[A-Za-z_]\w*` over ASCII.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl SettingDefinition {
    pub fn builder() -> SettingDefinitionBuilder {
        SettingDefinitionBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    pub fn is_reader(&self) -> bool {
        self.reader
    }

    pub fn nested(&self) -> Option<&Arc<Schema>> {
        self.nested.as_ref()
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Runs the constructor over the explicit value, falling back to the
    /// default and then to "undefined". The constructor is always invoked.
    pub fn resolve(&self, explicit: Option<Value>) -> Result<Value> {
        let input = explicit.or_else(|| self.default_value.clone());
        self.constructor
            .call(input)
            .map_err(|source| Error::Constructor {
                setting: self.name.clone(),
                source,
            })
    }

    /// A copy of this definition carrying a different nested schema.
    pub(crate) fn with_nested(&self, nested: Arc<Schema>) -> Self {
        Self {
            nested: Some(nested),
            ..self.clone()
        }
    }
}
