//! Hierarchical, copy-on-write settings for owners.
//!
//! An owner ([`Configurable`]) declares a typed, nested settings [`Schema`]
//! and lazily builds a [`Config`] from it. Owners derived from another share
//! its schema until they declare settings of their own, and always get a
//! private copy of its configuration.

pub mod compiler;
pub mod config;
pub mod definition;
pub mod error;
mod file;
pub mod group;
pub mod inherit;
pub mod owner;
pub mod schema;
pub mod stage;
pub mod value;

pub use compiler::{SchemaCompiler, Setting};
pub use config::{Config, Resolved};
pub use definition::{Constructor, SettingDefinition, SettingDefinitionBuilder};
pub use error::{BoxError, Error, Result};
pub use group::SettingGroup;
pub use inherit::InheritanceCoordinator;
pub use owner::{Configurable, Instance};
pub use schema::Schema;
pub use stage::StagedConfig;
pub use value::{IntoValue, Value};

#[doc(hidden)]
pub use inventory;
