//! Configuration file handling
//!
//! Engine settings are stored as TOML or RON; the file extension picks the
//! format. Section types live in [`crate::core::config`].

pub use serde::{Deserialize, Serialize};

/// Format of a configuration document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format implied by a file name
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            Ok(Self::Toml)
        } else if path.ends_with(".ron") {
            Ok(Self::Ron)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
}

/// A configuration that can be stored on disk
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and parse a configuration file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_str_with_format(&contents, path)
    }

    /// Parse configuration text in the format implied by `path`
    fn from_str_with_format(contents: &str, path: &str) -> Result<Self, ConfigError> {
        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Serialize in the format implied by `path` and write it there
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document does not match the schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Neither `.toml` nor `.ron`
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its permitted range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{EngineConfig, RenderConfig};

    #[test]
    fn test_save_and_reload_both_formats() {
        let config = EngineConfig::default().with_render(RenderConfig::default().with_max_recursion_depth(4));
        let dir = std::env::temp_dir();

        for name in ["portal_engine_config_test.toml", "portal_engine_config_test.ron"] {
            let path = dir.join(name);
            let path = path.to_string_lossy();
            config.save_to_file(&path).unwrap();
            let reloaded = EngineConfig::load_from_file(&path).unwrap();
            assert_eq!(reloaded, config);
            std::fs::remove_file(&*path).unwrap();
        }
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path("engine.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("worlds/engine.ron").unwrap(), ConfigFormat::Ron);
        assert!(matches!(ConfigFormat::from_path("engine.json"), Err(ConfigError::UnsupportedFormat(_))));
    }
}
