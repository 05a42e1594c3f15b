use thiserror::Error;

/// Boxed error returned by setting constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization: {0}")]
    Serialization(#[from] serde_value::SerializerError),

    #[error("Deserialization: {0}")]
    Deserialization(#[from] serde_value::DeserializerError),

    #[error("TOML Serialization: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    #[error("TOML Deserialization: {0}")]
    TomlDeserialization(#[from] toml::de::Error),

    /// A setting name does not match `[A-Za-z_]\w*`.
    #[error("invalid setting name: {0:?}")]
    InvalidSettingName(String),

    /// A read, write or update referenced a name the schema does not declare.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// A write was attempted on a finalized configuration.
    #[error("cannot modify setting `{0}`: configuration is frozen")]
    FrozenConfig(String),

    /// A setting was declared after the owner already built its configuration.
    ///
    /// Declaring settings once [`Configurable::config`](crate::Configurable::config)
    /// has been called would let the declared shape drift away from the
    /// configuration values that were already resolved against it.
    #[error("cannot declare setting `{0}`: configuration is already defined")]
    AlreadyDefinedConfig(String),

    /// A setting was declared on a schema that has been frozen.
    #[error("cannot declare setting `{0}`: schema is frozen")]
    FrozenSchema(String),

    /// A nested setting group received a value that is not a map.
    #[error("invalid value for nested setting `{0}`: expected a map")]
    InvalidUpdateValue(String),

    /// A nested accessor was used on a scalar setting.
    #[error("setting `{0}` is not a nested setting group")]
    NotNested(String),

    /// An operand had the wrong shape for the requested operation.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// A setting constructor rejected its input.
    #[error("constructor for setting `{setting}` failed: {source}")]
    Constructor {
        setting: String,
        #[source]
        source: BoxError,
    },

    /// A reader shortcut was requested for a setting declared without `reader`.
    #[error("no reader defined for setting `{0}`")]
    UndefinedReader(String),

    /// Attempted to include a setting group that was never registered.
    ///
    /// Groups are registered with [`submit_setting_group!`](crate::submit_setting_group).
    #[error("setting group not registered: {0}")]
    UnknownSettingGroup(String),
}
