//! Shared asset handles and logical asset keys

use super::shader_interface::ShaderInterface;
use super::{AssetSource, AssetType, ShaderStage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Deterministic logical identifier of an asset
///
/// Derived from the asset type and its normalized source, so the same request
/// produces the same key on every run: `texture_2d:textures/a.png`,
/// `shader:vertex=basic.glsl;fragment=lit.glsl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(String);

impl AssetKey {
    /// Build the key for a request
    pub fn new(asset_type: AssetType, source: &AssetSource) -> Self {
        Self(format!("{}:{}", asset_type.tag(), source.normalized()))
    }

    /// Key text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Asset type encoded in the key prefix
    pub fn asset_type(&self) -> Option<AssetType> {
        self.0.split_once(':').and_then(|(tag, _)| AssetType::from_tag(tag))
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minification filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MinFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Linear,
    /// Nearest texel from the nearest mip level
    NearestMipmapNearest,
    /// Trilinear
    #[default]
    LinearMipmapLinear,
}

/// Magnification filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagFilter {
    /// Nearest texel, keeps pixel art crisp
    Nearest,
    /// Bilinear
    #[default]
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    /// Tile
    #[default]
    Repeat,
    /// Tile with every other repetition mirrored
    MirroredRepeat,
    /// Clamp coordinates to the edge texel
    ClampToEdge,
}

/// Sampler configuration carried by texture handles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSettings {
    /// Minification filter
    pub min_filter: MinFilter,
    /// Magnification filter
    pub mag_filter: MagFilter,
    /// Wrap mode on every axis
    pub wrap: WrapMode,
}

/// Loaded shader program: stage sources and the parameters they declare
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    /// Source text per stage
    pub sources: BTreeMap<ShaderStage, String>,
    /// Parameters a material may bind
    pub interface: ShaderInterface,
}

/// Payload of a loaded asset
///
/// Mesh and texture contents stay opaque bytes; decoding is the renderer's job.
#[derive(Debug, Clone)]
pub enum AssetData {
    /// Raw file contents
    Binary(Vec<u8>),
    /// Parsed shader program
    Shader(ShaderProgram),
}

/// A loaded asset, shared by every handle that refers to it
#[derive(Debug)]
pub struct Asset {
    key: AssetKey,
    asset_type: AssetType,
    source: AssetSource,
    data: AssetData,
    settings: RwLock<TextureSettings>,
}

impl Asset {
    /// Wrap loaded data
    pub fn new(asset_type: AssetType, source: AssetSource, data: AssetData) -> Self {
        Self {
            key: AssetKey::new(asset_type, &source),
            asset_type,
            source,
            data,
            settings: RwLock::new(TextureSettings::default()),
        }
    }
}

/// Shared, reference-counted handle to a loaded asset
///
/// Cloning is cheap. Two handles are equal when they point at the same
/// loaded resource, not when their contents happen to match.
#[derive(Debug, Clone)]
pub struct AssetHandle(Arc<Asset>);

impl AssetHandle {
    /// Wrap a freshly loaded asset
    pub fn new(asset: Asset) -> Self {
        Self(Arc::new(asset))
    }

    /// Logical key
    pub fn key(&self) -> &AssetKey {
        &self.0.key
    }

    /// Asset type
    pub fn asset_type(&self) -> AssetType {
        self.0.asset_type
    }

    /// Normalized source
    pub fn source(&self) -> &AssetSource {
        &self.0.source
    }

    /// Whether both handles refer to the same underlying resource
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Raw bytes for mesh and texture assets
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.0.data {
            AssetData::Binary(bytes) => Some(bytes),
            AssetData::Shader(_) => None,
        }
    }

    /// Shader program for shader assets
    pub fn shader(&self) -> Option<&ShaderProgram> {
        match &self.0.data {
            AssetData::Shader(program) => Some(program),
            AssetData::Binary(_) => None,
        }
    }

    /// Parameter interface for shader assets
    pub fn shader_interface(&self) -> Option<&ShaderInterface> {
        self.shader().map(|program| &program.interface)
    }

    /// Current sampler settings (defaults for non-textures)
    pub fn texture_settings(&self) -> TextureSettings {
        *self.0.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the sampler settings of a texture
    ///
    /// Settings live on the shared asset, so every holder of the handle sees
    /// the change. Ignored for non-texture assets.
    pub fn set_texture_settings(&self, settings: TextureSettings) -> &Self {
        if self.asset_type().is_texture() {
            *self.0.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
        } else {
            log::warn!("Ignoring sampler settings on non-texture asset {}", self.key());
        }
        self
    }

    /// Set the minification filter
    pub fn set_min_filter(&self, filter: MinFilter) -> &Self {
        let settings = TextureSettings { min_filter: filter, ..self.texture_settings() };
        self.set_texture_settings(settings)
    }

    /// Set the magnification filter
    pub fn set_mag_filter(&self, filter: MagFilter) -> &Self {
        let settings = TextureSettings { mag_filter: filter, ..self.texture_settings() };
        self.set_texture_settings(settings)
    }

    /// Set the wrap mode
    pub fn set_wrap(&self, wrap: WrapMode) -> &Self {
        let settings = TextureSettings { wrap, ..self.texture_settings() };
        self.set_texture_settings(settings)
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AssetHandle {}

/// Serializable reference to an asset
///
/// Persists as its key only. The handle is attached when the reference is
/// created from a live asset or resolved after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef {
    key: AssetKey,
    #[serde(skip)]
    handle: Option<AssetHandle>,
}

impl AssetRef {
    /// Unresolved reference by key
    pub fn unresolved(key: AssetKey) -> Self {
        Self { key, handle: None }
    }

    /// Referenced key
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    /// Live handle, if resolved
    pub fn handle(&self) -> Option<&AssetHandle> {
        self.handle.as_ref()
    }

    /// Whether a live handle is attached
    pub fn is_resolved(&self) -> bool {
        self.handle.is_some()
    }

    /// Asset type, from the handle or the key prefix
    pub fn asset_type(&self) -> Option<AssetType> {
        self.handle
            .as_ref()
            .map(AssetHandle::asset_type)
            .or_else(|| self.key.asset_type())
    }

    /// Attach a live handle
    pub fn attach(&mut self, handle: AssetHandle) {
        self.handle = Some(handle);
    }
}

impl From<&AssetHandle> for AssetRef {
    fn from(handle: &AssetHandle) -> Self {
        Self {
            key: handle.key().clone(),
            handle: Some(handle.clone()),
        }
    }
}

impl From<AssetHandle> for AssetRef {
    fn from(handle: AssetHandle) -> Self {
        Self {
            key: handle.key().clone(),
            handle: Some(handle),
        }
    }
}

impl PartialEq for AssetRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
