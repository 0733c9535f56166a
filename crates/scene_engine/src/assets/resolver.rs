//! Reattaches live handles to deserialized references
//!
//! Saved scenes and materials store asset keys only. An [`AssetResolver`]
//! maps each key back to a handle through the manifest that was loaded
//! alongside the scene, so a reloaded scene shares handles with the registry.

use super::handle::{AssetHandle, AssetKey, AssetRef};
use super::manifest::Manifest;
use super::materials::{Material, MaterialError};
use super::registry::AssetRegistry;
use super::AssetError;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Key-to-handle lookup over a registry and a manifest
pub struct AssetResolver<'a, R: AssetRegistry + ?Sized> {
    registry: &'a R,
    manifest: &'a Manifest,
    assets: HashMap<AssetKey, AssetHandle>,
    materials: HashMap<String, Arc<Material>>,
}

impl<'a, R: AssetRegistry + ?Sized> AssetResolver<'a, R> {
    /// Create a resolver
    pub fn new(registry: &'a R, manifest: &'a Manifest) -> Self {
        Self {
            registry,
            manifest,
            assets: HashMap::new(),
            materials: HashMap::new(),
        }
    }

    /// Handle for a key listed in the manifest
    pub fn asset(&mut self, key: &AssetKey) -> Result<AssetHandle, ResolveError> {
        if let Some(handle) = self.assets.get(key) {
            return Ok(handle.clone());
        }
        let entry = self
            .manifest
            .get(key)
            .ok_or_else(|| ResolveError::MissingAsset(key.clone()))?;
        let handle = match self.registry.get(key) {
            Some(handle) => handle,
            None => self.registry.create_asset(entry.asset_type, &entry.source)?,
        };
        self.assets.insert(key.clone(), handle.clone());
        Ok(handle)
    }

    /// Shared material with every reference resolved
    ///
    /// Each name is resolved once; later calls return the same `Arc`.
    pub fn material(&mut self, name: &str) -> Result<Arc<Material>, ResolveError> {
        if let Some(material) = self.materials.get(name) {
            return Ok(Arc::clone(material));
        }
        let mut material = self
            .manifest
            .material(name)
            .cloned()
            .ok_or_else(|| ResolveError::MissingMaterial(name.to_string()))?;
        material.resolve(self)?;
        let material = Arc::new(material);
        self.materials.insert(name.to_string(), Arc::clone(&material));
        Ok(material)
    }
}

impl AssetRef {
    /// Attach the handle registered for this key
    pub fn resolve<R: AssetRegistry + ?Sized>(
        &mut self,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<(), ResolveError> {
        let handle = resolver.asset(self.key())?;
        self.attach(handle);
        Ok(())
    }
}

/// Reference resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Key not listed in the manifest
    #[error("Asset {0} is not listed in the manifest")]
    MissingAsset(AssetKey),

    /// Material not listed in the manifest
    #[error("Material {0} is not listed in the manifest")]
    MissingMaterial(String),

    /// Listed asset failed to load
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Saved material no longer fits its shader
    #[error("Stale material: {0}")]
    StaleMaterial(#[from] MaterialError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetType, CachedAssetRegistry, MemoryStore};

    #[test]
    fn test_resolves_to_registry_handle() {
        let registry = CachedAssetRegistry::new(MemoryStore::new().with_file("cube.obj", "v 0 0 0"));
        let handle = registry.create_asset(AssetType::Mesh, &"cube.obj".into()).unwrap();
        let manifest = registry.manifest();

        let mut resolver = AssetResolver::new(&registry, &manifest);
        assert!(resolver.asset(handle.key()).unwrap().ptr_eq(&handle));
    }

    #[test]
    fn test_unlisted_key_fails() {
        let registry = CachedAssetRegistry::new(MemoryStore::new());
        let manifest = Manifest::new();
        let mut resolver = AssetResolver::new(&registry, &manifest);

        let key = AssetKey::new(AssetType::Mesh, &"cube.obj".into());
        assert!(matches!(resolver.asset(&key), Err(ResolveError::MissingAsset(k)) if k == key));
        assert!(matches!(resolver.material("Stone"), Err(ResolveError::MissingMaterial(_))));
    }
}
