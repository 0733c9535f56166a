//! Asset management system
//!
//! Scene code never touches files directly. It asks an [`AssetRegistry`] for a
//! `(type, source)` pair and gets back a shared [`AssetHandle`]; the registry
//! deduplicates requests and owns the loaded data.

pub mod handle;
pub mod manifest;
pub mod materials;
pub mod registry;
pub mod resolver;
pub mod shader_interface;
pub mod store;

pub use handle::{
    Asset, AssetData, AssetHandle, AssetKey, AssetRef, MagFilter, MinFilter, ShaderProgram,
    TextureSettings, WrapMode,
};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use materials::{Material, MaterialBuilder, MaterialError, MaterialRef, ParamValue};
pub use registry::{AssetRegistry, CachedAssetRegistry};
pub use resolver::{AssetResolver, ResolveError};
pub use shader_interface::{ParamType, ShaderInterface};
pub use store::{AssetStore, FileStore, MemoryStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Kind of asset a registry can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetType {
    /// Triangle mesh (OBJ or similar)
    #[serde(rename = "mesh")]
    Mesh,
    /// One-dimensional texture, typically a shading ramp
    #[serde(rename = "texture_1d")]
    Texture1D,
    /// Regular 2D texture
    #[serde(rename = "texture_2d")]
    Texture2D,
    /// Volume texture, typically a color lookup table
    #[serde(rename = "texture_3d")]
    Texture3D,
    /// Cube map
    #[serde(rename = "texture_cube")]
    TextureCube,
    /// Shader program assembled from per-stage sources
    #[serde(rename = "shader")]
    Shader,
}

impl AssetType {
    /// All asset types, in key order
    pub const ALL: [Self; 6] = [
        Self::Mesh,
        Self::Texture1D,
        Self::Texture2D,
        Self::Texture3D,
        Self::TextureCube,
        Self::Shader,
    ];

    /// Stable tag used in asset keys
    pub fn tag(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Texture1D => "texture_1d",
            Self::Texture2D => "texture_2d",
            Self::Texture3D => "texture_3d",
            Self::TextureCube => "texture_cube",
            Self::Shader => "shader",
        }
    }

    /// Parse a key tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Whether handles of this type carry sampler settings
    pub fn is_texture(self) -> bool {
        matches!(
            self,
            Self::Texture1D | Self::Texture2D | Self::Texture3D | Self::TextureCube
        )
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Programmable pipeline stage of a shader source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Tessellation control stage
    TessControl,
    /// Tessellation evaluation stage
    TessEvaluation,
    /// Geometry stage
    Geometry,
    /// Fragment stage
    Fragment,
    /// Compute stage
    Compute,
}

impl ShaderStage {
    /// Lowercase stage name used in keys
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::TessControl => "tess_control",
            Self::TessEvaluation => "tess_evaluation",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }
}

/// Where an asset comes from: one path, or one path per shader stage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetSource {
    /// Single source file
    Path(String),
    /// Shader stage sources
    Stages(BTreeMap<ShaderStage, String>),
}

impl AssetSource {
    /// Single-file source
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Per-stage shader source set
    pub fn stages<I, P>(stages: I) -> Self
    where
        I: IntoIterator<Item = (ShaderStage, P)>,
        P: Into<String>,
    {
        Self::Stages(stages.into_iter().map(|(s, p)| (s, p.into())).collect())
    }

    /// Every file path referenced by this source
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Stages(stages) => stages.values().map(String::as_str).collect(),
        }
    }

    /// Same source with every path normalized
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(normalize_path(path)),
            Self::Stages(stages) => Self::Stages(
                stages.iter().map(|(s, p)| (*s, normalize_path(p))).collect(),
            ),
        }
    }

    /// Check the source shape against the requested asset type
    pub fn validate_for(&self, asset_type: AssetType) -> Result<(), AssetError> {
        match (self, asset_type) {
            (Self::Stages(stages), AssetType::Shader) if !stages.is_empty() => Ok(()),
            (Self::Stages(_), AssetType::Shader) => {
                Err(AssetError::InvalidSource("shader needs at least one stage".to_string()))
            }
            (Self::Stages(_), other) => Err(AssetError::InvalidSource(format!(
                "{other} assets load from a single path"
            ))),
            (Self::Path(_), AssetType::Shader) => Err(AssetError::InvalidSource(
                "shader assets load from a stage set".to_string(),
            )),
            (Self::Path(path), _) if path.is_empty() => {
                Err(AssetError::InvalidSource("empty path".to_string()))
            }
            (Self::Path(_), _) => Ok(()),
        }
    }
}

impl From<&str> for AssetSource {
    fn from(path: &str) -> Self {
        Self::path(path)
    }
}

impl From<String> for AssetSource {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Stages(stages) => {
                let parts: Vec<String> = stages
                    .iter()
                    .map(|(stage, path)| format!("{}={}", stage.name(), path))
                    .collect();
                f.write_str(&parts.join(";"))
            }
        }
    }
}

/// Canonical form of a source path: forward slashes, no leading `./`
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut trimmed = unified.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Path already loaded as a different asset type
    #[error("Asset type conflict: {path} is loaded as {existing}, requested as {requested}")]
    TypeConflict {
        /// Conflicting source path
        path: String,
        /// Type the path is already registered as
        existing: AssetType,
        /// Type of the rejected request
        requested: AssetType,
    },

    /// Source does not fit the requested asset type
    #[error("Invalid asset source: {0}")]
    InvalidSource(String),

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./textures\\a.png"), "textures/a.png");
        assert_eq!(normalize_path("././cube.obj"), "cube.obj");
        assert_eq!(normalize_path(" meshes/b.obj "), "meshes/b.obj");
    }

    #[test]
    fn test_source_shapes() {
        assert!(AssetSource::path("a.png").validate_for(AssetType::Texture2D).is_ok());
        assert!(AssetSource::path("").validate_for(AssetType::Mesh).is_err());
        assert!(AssetSource::path("basic.glsl").validate_for(AssetType::Shader).is_err());

        let stages = AssetSource::stages([(ShaderStage::Vertex, "v.glsl")]);
        assert!(stages.validate_for(AssetType::Shader).is_ok());
        assert!(stages.validate_for(AssetType::Mesh).is_err());
        assert!(AssetSource::Stages(BTreeMap::new()).validate_for(AssetType::Shader).is_err());
    }

    #[test]
    fn test_tags_round_trip() {
        for asset_type in AssetType::ALL {
            assert_eq!(AssetType::from_tag(asset_type.tag()), Some(asset_type));
        }
        assert_eq!(AssetType::from_tag("font"), None);
    }

    #[test]
    fn test_stage_display_is_ordered() {
        let source = AssetSource::stages([
            (ShaderStage::Fragment, "f.glsl"),
            (ShaderStage::Vertex, "v.glsl"),
        ]);
        assert_eq!(source.to_string(), "vertex=v.glsl;fragment=f.glsl");
    }
}
