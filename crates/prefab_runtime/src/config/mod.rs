//! Configuration system
//!
//! Serializable configuration for the prefab subsystem. Files are read as
//! TOML or RON depending on their extension.

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// # Prefab Configuration
///
/// Settings for library lookup, spawn safety limits and the procedural
/// spawn pass that runs once a level finished loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefabConfig {
    /// Directory libraries are loaded from when requested by declared name
    pub library_directory: String,
    /// File extension of library files, without the dot
    pub library_extension: String,
    /// Seed handed to procedural spawn callbacks
    pub session_seed: i32,
    /// Entity class scanned for on level load completion
    pub procedural_marker_class: String,
    /// Script callback invoked on each procedural marker
    pub spawn_callback: String,
    /// Edge length of the bounds published when a spawn produced none
    pub fallback_bounds_size: f32,
    /// Deepest nested prefab chain that is expanded
    pub max_nesting_depth: usize,
}

impl Default for PrefabConfig {
    fn default() -> Self {
        Self {
            library_directory: "Prefabs".to_string(),
            library_extension: "ron".to_string(),
            session_seed: 0,
            procedural_marker_class: "ProceduralObject".to_string(),
            spawn_callback: "Spawn".to_string(),
            fallback_bounds_size: 1.0,
            max_nesting_depth: 16,
        }
    }
}

impl Config for PrefabConfig {}

impl PrefabConfig {
    /// Builder pattern: set the session seed
    pub fn with_session_seed(mut self, seed: i32) -> Self {
        self.session_seed = seed;
        self
    }

    /// Builder pattern: set the library directory
    pub fn with_library_directory(mut self, directory: impl Into<String>) -> Self {
        self.library_directory = directory.into();
        self
    }

    /// Builder pattern: set the nesting cap
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Path of the library file with the given declared name
    pub fn library_path(&self, library_name: &str) -> String {
        if self.library_directory.is_empty() {
            format!("{}.{}", library_name, self.library_extension)
        } else {
            format!(
                "{}/{}.{}",
                self.library_directory.trim_end_matches('/'),
                library_name,
                self.library_extension
            )
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library_extension.is_empty() {
            return Err(ConfigError::Invalid {
                field: "library_extension",
                reason: "must not be empty".to_string(),
            });
        }
        if self.procedural_marker_class.is_empty() {
            return Err(ConfigError::Invalid {
                field: "procedural_marker_class",
                reason: "must not be empty".to_string(),
            });
        }
        if self.spawn_callback.is_empty() {
            return Err(ConfigError::Invalid {
                field: "spawn_callback",
                reason: "must not be empty".to_string(),
            });
        }
        if !(self.fallback_bounds_size > 0.0) {
            return Err(ConfigError::Invalid {
                field: "fallback_bounds_size",
                reason: format!("{} is not positive", self.fallback_bounds_size),
            });
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_nesting_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PrefabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_library_path() {
        let config = PrefabConfig::default().with_library_directory("Levels/Prefabs/");
        assert_eq!(config.library_path("Props"), "Levels/Prefabs/Props.ron");

        let flat = PrefabConfig::default().with_library_directory("");
        assert_eq!(flat.library_path("Props"), "Props.ron");
    }

    #[test]
    fn test_validation_rejects_zero_depth() {
        let config = PrefabConfig::default().with_max_nesting_depth(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "max_nesting_depth", .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PrefabConfig = toml::from_str("session_seed = 42\nspawn_callback = \"Populate\"\n")
            .expect("parse");
        assert_eq!(config.session_seed, 42);
        assert_eq!(config.spawn_callback, "Populate");
        assert_eq!(config.max_nesting_depth, 16);
    }

    #[test]
    fn test_ron_round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("prefab_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        let config = PrefabConfig::default().with_session_seed(7);

        config.save_to_file(&path).expect("save");
        let loaded = PrefabConfig::load_from_file(&path).expect("load");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.session_seed, 7);
        assert_eq!(loaded.library_directory, config.library_directory);
    }
}
