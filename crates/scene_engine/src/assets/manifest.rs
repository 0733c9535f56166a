//! Asset manifest - serializable record of what a scene needs
//!
//! A manifest lists every asset by key together with the request that
//! produced it, plus the materials defined over those assets. Loading a
//! manifest into a registry reproduces the same handles a fresh build would.

use super::handle::{AssetHandle, AssetKey, TextureSettings};
use super::materials::Material;
use super::registry::AssetRegistry;
use super::{AssetError, AssetSource, AssetType};
use crate::config::{read_document, write_document, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// One asset request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Requested asset type
    pub asset_type: AssetType,
    /// Normalized source
    pub source: AssetSource,
    /// Sampler settings for textures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<TextureSettings>,
}

impl ManifestEntry {
    /// Entry describing a live handle
    pub fn from_handle(handle: &AssetHandle) -> Self {
        Self {
            asset_type: handle.asset_type(),
            source: handle.source().clone(),
            texture: handle
                .asset_type()
                .is_texture()
                .then(|| handle.texture_settings()),
        }
    }
}

/// Serializable set of assets and materials
///
/// Both maps are ordered, so two builds that make the same requests render
/// byte-identical manifests regardless of request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Assets by key
    #[serde(default)]
    pub assets: BTreeMap<AssetKey, ManifestEntry>,
    /// Materials by name
    #[serde(default)]
    pub materials: BTreeMap<String, Material>,
}

impl Manifest {
    /// Empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a live asset, refreshing its settings if already present
    pub fn record_asset(&mut self, handle: &AssetHandle) {
        self.assets
            .insert(handle.key().clone(), ManifestEntry::from_handle(handle));
    }

    /// Record a material definition
    pub fn record_material(&mut self, material: &Material) {
        self.materials
            .insert(material.name().to_string(), material.clone());
    }

    /// Number of asset entries
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether no assets are listed
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Whether an asset is listed
    pub fn contains(&self, key: &AssetKey) -> bool {
        self.assets.contains_key(key)
    }

    /// Entry for a key
    pub fn get(&self, key: &AssetKey) -> Option<&ManifestEntry> {
        self.assets.get(key)
    }

    /// Material definition by name
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Entries of one asset type, in key order
    pub fn entries_of(&self, asset_type: AssetType) -> impl Iterator<Item = (&AssetKey, &ManifestEntry)> {
        self.assets
            .iter()
            .filter(move |(_, entry)| entry.asset_type == asset_type)
    }

    /// Write the manifest; the format follows the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        write_document(path, self)?;
        log::info!(
            "Saved manifest with {} assets and {} materials to {}",
            self.assets.len(),
            self.materials.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a manifest
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        Ok(read_document(path)?)
    }

    /// Request every listed asset from a registry and apply stored settings
    pub fn acquire_all<R: AssetRegistry + ?Sized>(&self, registry: &R) -> Result<Vec<AssetHandle>, AssetError> {
        let mut handles = Vec::with_capacity(self.assets.len());
        for (key, entry) in &self.assets {
            let handle = registry.create_asset(entry.asset_type, &entry.source)?;
            if handle.key() != key {
                log::warn!("Manifest key {} re-derived as {}", key, handle.key());
            }
            if let Some(settings) = entry.texture {
                handle.set_texture_settings(settings);
            }
            handles.push(handle);
        }
        Ok(handles)
    }
}

/// Manifest persistence and reload errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Reading or writing the document failed
    #[error("Manifest persistence error: {0}")]
    Persistence(#[from] ConfigError),

    /// A listed asset could not be loaded
    #[error("Manifest asset error: {0}")]
    Asset(#[from] AssetError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        CachedAssetRegistry, MagFilter, MaterialBuilder, MemoryStore, ParamValue, ShaderStage, WrapMode,
    };

    fn registry() -> CachedAssetRegistry<MemoryStore> {
        CachedAssetRegistry::new(
            MemoryStore::new()
                .with_file("b.obj", "v 0 0 0")
                .with_file("a.png", vec![1u8]),
        )
    }

    #[test]
    fn test_order_independent() {
        let first = registry();
        first.create_asset(AssetType::Mesh, &"b.obj".into()).unwrap();
        first.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();

        let second = registry();
        second.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        second.create_asset(AssetType::Mesh, &"b.obj".into()).unwrap();

        let a = ron::to_string(&first.manifest()).unwrap();
        let b = ron::to_string(&second.manifest()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_entries_of_type() {
        let registry = registry();
        registry.create_asset(AssetType::Mesh, &"b.obj".into()).unwrap();
        registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();

        let manifest = registry.manifest();
        let meshes: Vec<_> = manifest.entries_of(AssetType::Mesh).collect();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].1.source, AssetSource::path("b.obj"));
        assert!(meshes[0].1.texture.is_none());
    }

    #[test]
    fn test_acquire_all_applies_settings() {
        let registry = registry();
        let mut manifest = Manifest::new();
        manifest.assets.insert(
            AssetKey::new(AssetType::Texture2D, &"a.png".into()),
            ManifestEntry {
                asset_type: AssetType::Texture2D,
                source: "a.png".into(),
                texture: Some(TextureSettings {
                    mag_filter: MagFilter::Nearest,
                    ..TextureSettings::default()
                }),
            },
        );

        let handles = manifest.acquire_all(&registry).unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].texture_settings().mag_filter, MagFilter::Nearest);
    }

    #[test]
    fn test_acquire_all_reports_missing() {
        let mut manifest = Manifest::new();
        manifest.assets.insert(
            AssetKey::new(AssetType::Mesh, &"gone.obj".into()),
            ManifestEntry {
                asset_type: AssetType::Mesh,
                source: "gone.obj".into(),
                texture: None,
            },
        );
        let result = manifest.acquire_all(&registry());
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }

    #[test]
    fn test_save_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.toml");
        let registry = CachedAssetRegistry::new(
            MemoryStore::new()
                .with_file("b.obj", "v 0 0 0")
                .with_file("a.png", vec![1u8])
                .with_file("lit_vert.glsl", "uniform mat4 u_Model;")
                .with_file("lit_frag.glsl", "uniform sampler2D u_Diffuse; uniform float u_Gloss;"),
        );
        registry.create_asset(AssetType::Mesh, &"b.obj".into()).unwrap();
        let texture = registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        texture
            .set_mag_filter(MagFilter::Nearest)
            .set_wrap(WrapMode::ClampToEdge);
        let shader = registry
            .create_asset(
                AssetType::Shader,
                &AssetSource::stages([
                    (ShaderStage::Vertex, "lit_vert.glsl"),
                    (ShaderStage::Fragment, "lit_frag.glsl"),
                ]),
            )
            .unwrap();
        let material = MaterialBuilder::new("Glossy", &shader)
            .param("u_Diffuse", &texture)
            .param("u_Gloss", 0.75_f32)
            .build()
            .unwrap();

        let mut manifest = registry.manifest();
        manifest.record_material(&material);
        manifest.save(&path).unwrap();

        let loaded = Manifest::load(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.entries_of(AssetType::Shader).count(), 1);
        let settings = loaded.get(texture.key()).and_then(|entry| entry.texture).unwrap();
        assert_eq!(settings.mag_filter, MagFilter::Nearest);
        assert_eq!(settings.wrap, WrapMode::ClampToEdge);
        assert_eq!(
            loaded.material("Glossy").and_then(|m| m.get("u_Gloss")),
            Some(&ParamValue::Float(0.75))
        );
    }
}
