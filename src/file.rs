//! Loading and saving configurations as TOML.

use std::path::Path;

use tracing::debug;

use crate::{Config, error::Result, value::Value};

impl Config {
    /// Parses a TOML document and applies it with [`update`](Config::update).
    pub fn update_from_toml_str(&mut self, contents: &str) -> Result<()> {
        let value: Value = toml::from_str(contents)?;
        self.update(value)
    }

    pub fn update_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading configuration file");
        self.update_from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Writes the resolved configuration to `path`. The document goes to a
    /// sibling temporary file first and is then renamed over the destination.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let destination = path.as_ref();
        let toml_string = self.to_toml_string()?;

        let temp_path = destination.with_extension("tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, destination)?;

        debug!(path = %destination.display(), "configuration saved");
        Ok(())
    }
}
