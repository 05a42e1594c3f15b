//! Reusable setting groups registered at link time.
//!
//! A group is a named declaration script. Any schema can pull a group in with
//! [`SchemaCompiler::include_group`], which is how shared blocks of settings
//! (database, logging, ...) are composed into several owners without
//! repeating their declarations.
//!
//! ```rust
//! use next_settings::{Result, Schema, SchemaCompiler, Setting, submit_setting_group};
//!
//! fn logging(s: &mut SchemaCompiler<'_>) -> Result<()> {
//!     s.setting("level", Setting::new().default("info"))?;
//!     Ok(())
//! }
//!
//! submit_setting_group!("logging", logging);
//!
//! fn main() -> Result<()> {
//!     let schema = Schema::compile(|s| s.include_group("logging"))?;
//!     assert!(schema.contains("level"));
//!     Ok(())
//! }
//! ```

use crate::{Result, Schema, SchemaCompiler};

pub type DeclareFn = fn(&mut SchemaCompiler<'_>) -> Result<()>;

pub struct SettingGroup {
    pub name: &'static str,
    pub declare: DeclareFn,
}

impl SettingGroup {
    pub const fn new(name: &'static str, declare: DeclareFn) -> Self {
        Self { name, declare }
    }

    /// Finds a registered group by name. Registering two groups under the
    /// same name leaves it unspecified which one is found.
    pub fn find(name: &str) -> Option<&'static SettingGroup> {
        inventory::iter::<SettingGroup>
            .into_iter()
            .find(|group| group.name == name)
    }

    pub fn compile(&self) -> Result<Schema> {
        Schema::compile(self.declare)
    }
}

inventory::collect!(SettingGroup);

#[macro_export]
macro_rules! submit_setting_group {
    ($name:expr, $declare:path) => {
        $crate::inventory::submit! {
            $crate::SettingGroup::new($name, $declare)
        }
    };
}
