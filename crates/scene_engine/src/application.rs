//! Application host and layer lifecycle

use crate::assets::{AssetRegistry, AssetResolver, CachedAssetRegistry, FileStore, Manifest, ManifestError};
use crate::builder::{BuildError, SceneBuilder};
use crate::config::ConfigError;
use crate::core::config::ApplicationConfig;
use crate::scene::{Scene, SceneError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Receiver of finished scenes
pub trait SceneHost {
    /// Make a built scene the active one
    fn load_scene(&mut self, scene: Scene);

    /// Load a saved scene, resolving references through the configured manifest
    fn load_scene_file(&mut self, path: &Path) -> Result<(), AppError>;
}

/// Unit of application setup
///
/// Layers run in registration order when the application loads.
pub trait ApplicationLayer {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Called once while the application loads
    fn on_app_load(&mut self, app: &mut Application) -> Result<(), AppError>;
}

/// Owns configuration, the shared asset registry and the active scene
pub struct Application {
    config: ApplicationConfig,
    registry: Arc<dyn AssetRegistry>,
    layers: Vec<Box<dyn ApplicationLayer>>,
    scene: Option<Scene>,
    manifest: Option<Manifest>,
}

impl Application {
    /// Create an application over an existing registry
    pub fn new(config: ApplicationConfig, registry: Arc<dyn AssetRegistry>) -> Self {
        Self {
            config,
            registry,
            layers: Vec::new(),
            scene: None,
            manifest: None,
        }
    }

    /// Create an application reading assets from the configured directories
    pub fn with_file_store(config: ApplicationConfig) -> Self {
        let store = FileStore::from_config(&config.assets);
        log::info!("Asset search roots: {:?}", store.roots());
        Self::new(config, Arc::new(CachedAssetRegistry::new(store)))
    }

    /// Register a layer
    pub fn add_layer(&mut self, layer: impl ApplicationLayer + 'static) -> &mut Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Run every layer's load hook
    ///
    /// Stops at the first failing layer and clears any scene registered so
    /// far, so a failed load never leaves a partial scene behind.
    pub fn load(&mut self) -> Result<(), AppError> {
        let mut layers = std::mem::take(&mut self.layers);
        let result = layers.iter_mut().try_for_each(|layer| {
            log::info!("Loading layer {}", layer.name());
            layer.on_app_load(self)
        });
        layers.append(&mut self.layers);
        self.layers = layers;

        if let Err(error) = &result {
            log::error!("Application load failed: {}", error);
            self.scene = None;
            self.manifest = None;
        }
        result
    }

    /// Configuration
    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Shared asset registry
    pub fn registry(&self) -> &Arc<dyn AssetRegistry> {
        &self.registry
    }

    /// Active scene
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Mutable active scene
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Manifest of the active scene, when known
    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    /// Whether the configuration asks for a saved scene and one exists
    pub fn saved_scene_available(&self) -> bool {
        self.config.scene.load_saved_scene && self.config.scene.scene_path.is_file()
    }

    /// Build a scene, write its manifest and scene files, and activate it
    pub fn build_scene<F>(&mut self, recipe: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut SceneBuilder) -> Result<(), BuildError>,
    {
        let mut builder = SceneBuilder::with_config(Arc::clone(&self.registry), &self.config.scene);
        recipe(&mut builder)?;
        let (scene, manifest) = builder.into_parts();

        manifest.save(&self.config.scene.manifest_path)?;
        scene.save(&self.config.scene.scene_path)?;

        self.manifest = Some(manifest);
        self.load_scene(scene);
        Ok(())
    }

    /// Advance the active scene
    pub fn update(&mut self, dt: f32) {
        if let Some(scene) = &mut self.scene {
            scene.update(dt);
        }
    }
}

impl SceneHost for Application {
    fn load_scene(&mut self, scene: Scene) {
        log::info!("Scene loaded with {} objects", scene.object_count());
        self.scene = Some(scene);
    }

    fn load_scene_file(&mut self, path: &Path) -> Result<(), AppError> {
        let manifest = self.registry.load_manifest(&self.config.scene.manifest_path)?;
        let scene = {
            let mut resolver = AssetResolver::new(self.registry.as_ref(), &manifest);
            Scene::load(path, &mut resolver)?
        };
        self.manifest = Some(manifest);
        self.load_scene(scene);
        Ok(())
    }
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Scene construction failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Scene save or load failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Manifest save or load failed
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
