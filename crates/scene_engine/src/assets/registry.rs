//! Asset Registry - shared cache mapping `(type, source)` to loaded assets
//!
//! **SEPARATION OF CONCERNS**:
//! - AssetRegistry: deduplication, type bookkeeping, manifest snapshots
//! - AssetStore: where bytes come from (disk, memory)
//! - SceneBuilder: what a level needs; never reads files itself
//!
//! The registry is process-wide shared state. `CachedAssetRegistry` guards
//! its maps with an `RwLock`, so concurrent requests for the same key
//! serialize on the write lock and all receive the one loaded handle.

use super::handle::{Asset, AssetData, AssetHandle, AssetKey, ShaderProgram};
use super::manifest::{Manifest, ManifestError};
use super::shader_interface::ShaderInterface;
use super::store::{AssetStore, FileStore};
use super::{AssetError, AssetSource, AssetType};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared loader/cache contract consumed by scene construction
pub trait AssetRegistry: Send + Sync {
    /// Load an asset, or return the existing handle for the same request
    ///
    /// # Errors
    /// * `NotFound` - a source path cannot be read
    /// * `TypeConflict` - a source path is already loaded as another type
    /// * `InvalidSource` - the source shape does not fit the asset type
    fn create_asset(&self, asset_type: AssetType, source: &AssetSource) -> Result<AssetHandle, AssetError>;

    /// Look up a loaded asset by key
    fn get(&self, key: &AssetKey) -> Option<AssetHandle>;

    /// Number of loaded assets
    fn len(&self) -> usize;

    /// Whether nothing is loaded
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every loaded asset
    fn manifest(&self) -> Manifest;

    /// Write the snapshot of every loaded asset
    fn save_manifest(&self, path: &Path) -> Result<(), ManifestError> {
        self.manifest().save(path)
    }

    /// Read a manifest and load every asset it lists
    fn load_manifest(&self, path: &Path) -> Result<Manifest, ManifestError> {
        let manifest = Manifest::load(path)?;
        manifest.acquire_all(self)?;
        log::info!("Loaded {} assets from manifest {}", manifest.len(), path.display());
        Ok(manifest)
    }
}

#[derive(Default)]
struct RegistryState {
    assets: BTreeMap<AssetKey, AssetHandle>,
    path_types: HashMap<String, AssetType>,
}

/// Registry caching loaded assets in memory, reading through an [`AssetStore`]
pub struct CachedAssetRegistry<S: AssetStore = FileStore> {
    store: S,
    state: RwLock<RegistryState>,
}

impl<S: AssetStore> CachedAssetRegistry<S> {
    /// Create a registry over a store
    pub fn new(store: S) -> Self {
        log::info!("Creating asset registry");
        Self {
            store,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop every cached asset; live handles stay valid
    pub fn clear(&self) {
        let mut state = self.write();
        state.assets.clear();
        state.path_types.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self, asset_type: AssetType, source: &AssetSource) -> Result<AssetData, AssetError> {
        match source {
            AssetSource::Path(path) => Ok(AssetData::Binary(self.store.read(path)?)),
            AssetSource::Stages(stages) => {
                let mut sources = BTreeMap::new();
                for (stage, path) in stages {
                    let bytes = self.store.read(path)?;
                    let text = String::from_utf8(bytes).map_err(|_| {
                        AssetError::InvalidData(format!("{path} is not UTF-8 shader source"))
                    })?;
                    sources.insert(*stage, text);
                }
                let interface = ShaderInterface::from_sources(sources.values().map(String::as_str));
                log::debug!(
                    "Shader {} declares {} material parameters",
                    source,
                    interface.len()
                );
                debug_assert_eq!(asset_type, AssetType::Shader);
                Ok(AssetData::Shader(ShaderProgram { sources, interface }))
            }
        }
    }
}

impl<S: AssetStore> AssetRegistry for CachedAssetRegistry<S> {
    fn create_asset(&self, asset_type: AssetType, source: &AssetSource) -> Result<AssetHandle, AssetError> {
        source.validate_for(asset_type)?;
        let source = source.normalized();
        let key = AssetKey::new(asset_type, &source);

        if let Some(handle) = self.read().assets.get(&key) {
            log::trace!("Asset cache hit: {}", key);
            return Ok(handle.clone());
        }

        let mut state = self.write();
        // Another caller may have finished loading while we waited for the lock
        if let Some(handle) = state.assets.get(&key) {
            return Ok(handle.clone());
        }

        for path in source.paths() {
            if let Some(&existing) = state.path_types.get(path) {
                if existing != asset_type {
                    return Err(AssetError::TypeConflict {
                        path: path.to_string(),
                        existing,
                        requested: asset_type,
                    });
                }
            }
        }

        let data = self.load(asset_type, &source)?;
        for path in source.paths() {
            state.path_types.insert(path.to_string(), asset_type);
        }
        let handle = AssetHandle::new(Asset::new(asset_type, source, data));
        state.assets.insert(key.clone(), handle.clone());
        log::debug!("Loaded asset {}", key);
        Ok(handle)
    }

    fn get(&self, key: &AssetKey) -> Option<AssetHandle> {
        self.read().assets.get(key).cloned()
    }

    fn len(&self) -> usize {
        self.read().assets.len()
    }

    fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        for handle in self.read().assets.values() {
            manifest.record_asset(handle);
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MagFilter, MemoryStore, ShaderStage, WrapMode};
    use std::sync::Arc;

    fn registry() -> CachedAssetRegistry<MemoryStore> {
        CachedAssetRegistry::new(
            MemoryStore::new()
                .with_file("a.png", vec![0u8; 4])
                .with_file("cube.obj", "v 0 0 0\n")
                .with_file("basic.glsl", "uniform mat4 u_Model;")
                .with_file("lit.glsl", "uniform sampler2D s_Albedo;")
                .with_file("sky.glsl", "uniform samplerCube s_Sky;"),
        )
    }

    #[test]
    fn test_same_request_returns_same_handle() {
        let registry = registry();
        let first = registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        let second = registry.create_asset(AssetType::Texture2D, &"./a.png".into()).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let registry = registry();
        let result = registry.create_asset(AssetType::Mesh, &"missing.obj".into());
        assert!(matches!(result, Err(AssetError::NotFound(path)) if path == "missing.obj"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_type_conflict() {
        let registry = registry();
        registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        let result = registry.create_asset(AssetType::TextureCube, &"a.png".into());
        assert!(matches!(
            result,
            Err(AssetError::TypeConflict { existing: AssetType::Texture2D, requested: AssetType::TextureCube, .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shaders_share_stage_files() {
        let registry = registry();
        let lit = registry
            .create_asset(
                AssetType::Shader,
                &AssetSource::stages([(ShaderStage::Vertex, "basic.glsl"), (ShaderStage::Fragment, "lit.glsl")]),
            )
            .unwrap();
        let sky = registry
            .create_asset(
                AssetType::Shader,
                &AssetSource::stages([(ShaderStage::Vertex, "basic.glsl"), (ShaderStage::Fragment, "sky.glsl")]),
            )
            .unwrap();

        assert!(!lit.ptr_eq(&sky));
        let interface = lit.shader_interface().unwrap();
        assert!(interface.contains("u_Model"));
        assert!(interface.contains("s_Albedo"));
        assert!(!interface.contains("s_Sky"));

        let conflict = registry.create_asset(AssetType::Texture2D, &"basic.glsl".into());
        assert!(matches!(conflict, Err(AssetError::TypeConflict { .. })));
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.create_asset(AssetType::Mesh, &"cube.obj".into()).unwrap())
            })
            .collect();
        let loaded: Vec<AssetHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(loaded.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_manifest_round_trip_restores_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.ron");

        let registry = registry();
        registry
            .create_asset(AssetType::Texture2D, &"a.png".into())
            .unwrap()
            .set_mag_filter(MagFilter::Nearest)
            .set_wrap(WrapMode::ClampToEdge);
        registry.create_asset(AssetType::Mesh, &"cube.obj".into()).unwrap();
        registry.save_manifest(&path).unwrap();

        let fresh = self::registry();
        let manifest = fresh.load_manifest(&path).unwrap();
        assert_eq!(manifest, registry.manifest());
        assert_eq!(fresh.len(), 2);

        let key = AssetKey::new(AssetType::Texture2D, &"a.png".into());
        let texture = fresh.get(&key).unwrap();
        assert_eq!(texture.texture_settings().mag_filter, MagFilter::Nearest);
        assert_eq!(texture.texture_settings().wrap, WrapMode::ClampToEdge);
    }
}
