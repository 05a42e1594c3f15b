//! Declaration scripts that build a [`Schema`].

use std::sync::Arc;

use crate::{
    Schema, SettingGroup,
    definition::{Constructor, SettingDefinition, is_identifier},
    error::{BoxError, Error, Result},
    value::{IntoValue, Value},
};

/// Options of one `setting` statement.
///
/// A statement carries no default and no constructor, a default, a
/// constructor, or both. Nested groups are declared with
/// [`SchemaCompiler::nested`] instead and accept only the reader flag.
#[derive(Clone, Debug)]
pub struct Setting {
    default: Option<Value>,
    constructor: Option<Constructor>,
    reader: bool,
}

impl Setting {
    pub fn new() -> Self {
        Self {
            default: None,
            constructor: None,
            reader: false,
        }
    }

    pub fn default(mut self, value: impl IntoValue) -> Self {
        self.default = Some(value.into_value());
        self
    }

    /// Sets the transform applied whenever the setting is resolved.
    ///
    /// ```rust
    /// use next_settings::{Setting, Value};
    ///
    /// let dsn = Setting::new()
    ///     .default("sqlite")
    ///     .constructor(|raw| match raw {
    ///         Some(Value::String(driver)) => Ok(Value::String(format!("jdbc:{driver}"))),
    ///         _ => Err("dsn must be a string".into()),
    ///     });
    /// # let _ = dsn;
    /// ```
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<Value>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor::new(f));
        self
    }

    /// Registers a reader shortcut for the setting on its owner.
    pub fn reader(mut self) -> Self {
        self.reader = true;
        self
    }

    pub fn is_reader(&self) -> bool {
        self.reader
    }
}

fn build_definition(
    name: &str,
    setting: Setting,
    nested: Option<Arc<Schema>>,
) -> Result<SettingDefinition> {
    let mut builder = SettingDefinition::builder()
        .name(name)
        .reader(setting.reader);
    if let Some(default) = setting.default {
        builder = builder.default_value(default);
    }
    if let Some(constructor) = setting.constructor {
        builder = builder.constructor(constructor);
    }
    if let Some(nested) = nested {
        builder = builder.nested(nested);
    }

    Ok(builder.build()?)
}

/// A compiler scope writing declarations into one schema.
///
/// Nested blocks open a fresh scope over a fresh child schema, which is fully
/// built before the enclosing definition is declared.
pub struct SchemaCompiler<'a> {
    schema: &'a mut Schema,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(schema: &'a mut Schema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn setting(&mut self, name: &str, setting: Setting) -> Result<Arc<SettingDefinition>> {
        let definition = build_definition(name, setting, None)?;
        self.schema.declare(definition)
    }

    /// Declares a nested setting group whose fields are declared by `block`.
    pub fn nested<F>(&mut self, name: &str, block: F) -> Result<Arc<SettingDefinition>>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<()>,
    {
        self.nested_with(name, Setting::new(), block)
    }

    /// Like [`nested`](SchemaCompiler::nested), with statement options.
    /// Only the reader flag is accepted.
    pub fn nested_with<F>(
        &mut self,
        name: &str,
        setting: Setting,
        block: F,
    ) -> Result<Arc<SettingDefinition>>
    where
        F: FnOnce(&mut SchemaCompiler<'_>) -> Result<()>,
    {
        if !is_identifier(name) {
            return Err(Error::InvalidSettingName(name.to_string()));
        }
        if setting.default.is_some() || setting.constructor.is_some() {
            return Err(Error::Argument(format!(
                "nested setting `{name}` cannot take a default or constructor"
            )));
        }

        let nested = Schema::compile(block)?;
        let definition = build_definition(name, setting, Some(Arc::new(nested)))?;
        self.schema.declare(definition)
    }

    /// Copies every definition of `other` into this scope, replacing
    /// colliding names wholesale.
    pub fn include(&mut self, other: &Schema) -> Result<()> {
        self.schema.merge_in_place(other)
    }

    /// Compiles a registered setting group and includes it in this scope.
    pub fn include_group(&mut self, name: &str) -> Result<()> {
        let group =
            SettingGroup::find(name).ok_or_else(|| Error::UnknownSettingGroup(name.to_string()))?;
        let schema = group.compile()?;
        self.include(&schema)
    }
}
