//! # Unified Configuration System
//!
//! Configuration for the engine core, asset loading and scene construction.
//! Loadable from TOML or RON through the [`Config`] trait.
//!
//! ```toml
//! [engine]
//! log_level = "debug"
//! debug_mode = true
//!
//! [assets]
//! assets_dir = "resources"
//! search_paths = ["resources", "."]
//!
//! [scene]
//! manifest_path = "scene-manifest.ron"
//! scene_path = "scene.ron"
//! load_saved_scene = false
//! max_lights = 8
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core engine behavior: logging and debug features.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
    /// Whether to enable debug features
    pub debug_mode: bool,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_mode: cfg!(debug_assertions),
        }
    }

    /// Set log level
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable debug mode
    #[must_use]
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_mode = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Asset Configuration
///
/// Where the file-backed asset store looks for source files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for assets
    pub assets_dir: PathBuf,
    /// Additional directories searched, in order, after `assets_dir`
    pub search_paths: Vec<PathBuf>,
}

impl AssetConfig {
    /// Create a new asset configuration
    pub fn new() -> Self {
        Self {
            assets_dir: PathBuf::from("resources"),
            search_paths: vec![PathBuf::from(".")],
        }
    }

    /// Set assets directory
    #[must_use]
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Append a search path
    #[must_use]
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// All roots in lookup order
    pub fn roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.assets_dir.clone())
            .chain(self.search_paths.iter().cloned())
            .collect()
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Scene Configuration
///
/// Output files of a scene build and the switch between rebuilding and
/// loading a previously saved scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Where the asset manifest is written
    pub manifest_path: PathBuf,
    /// Where the serialized scene is written
    pub scene_path: PathBuf,
    /// Load `scene_path` instead of rebuilding when it exists
    pub load_saved_scene: bool,
    /// Upper bound on scene lights
    pub max_lights: usize,
}

impl SceneConfig {
    /// Create a new scene configuration
    pub fn new() -> Self {
        Self {
            manifest_path: PathBuf::from("scene-manifest.ron"),
            scene_path: PathBuf::from("scene.ron"),
            load_saved_scene: false,
            max_lights: 8,
        }
    }

    /// Set output paths
    #[must_use]
    pub fn with_paths(mut self, manifest: impl Into<PathBuf>, scene: impl Into<PathBuf>) -> Self {
        self.manifest_path = manifest.into();
        self.scene_path = scene.into();
        self
    }

    /// Prefer loading the saved scene
    #[must_use]
    pub fn with_load_saved_scene(mut self, enabled: bool) -> Self {
        self.load_saved_scene = enabled;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
    /// Scene construction configuration
    pub scene: SceneConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "Unknown log level: {}",
                self.engine.log_level
            )));
        }
        if self.scene.max_lights == 0 {
            return Err(ConfigError::Invalid("max_lights must be at least 1".to_string()));
        }
        if self.scene.manifest_path == self.scene.scene_path {
            return Err(ConfigError::Invalid(
                "manifest_path and scene_path must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(ApplicationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let mut config = ApplicationConfig::default();
        config.engine = config.engine.with_log_level("loud");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_shared_output_path() {
        let mut config = ApplicationConfig::default();
        config.scene = config.scene.with_paths("out.ron", "out.ron");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ApplicationConfig = toml::from_str("[scene]\nload_saved_scene = true\n").unwrap();
        assert!(config.scene.load_saved_scene);
        assert_eq!(config.scene.max_lights, 8);
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_asset_roots_order() {
        let config = AssetConfig::new().with_assets_dir("data").with_search_path("extra");
        assert_eq!(
            config.roots(),
            vec![PathBuf::from("data"), PathBuf::from("."), PathBuf::from("extra")]
        );
    }
}
