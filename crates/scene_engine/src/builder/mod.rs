//! Declarative scene construction
//!
//! A [`SceneBuilder`] turns a level recipe into a [`Scene`](crate::scene::Scene)
//! plus the [`Manifest`](crate::assets::Manifest) of everything the recipe
//! touched. Assets come from an injected [`AssetRegistry`](crate::assets::AssetRegistry);
//! the builder never reads files itself.

mod scene_builder;

#[cfg(test)]
mod tests;

pub use scene_builder::{BuilderState, SceneBuilder};

use crate::assets::{AssetError, AssetType, MaterialError};
use crate::scene::SceneError;
use thiserror::Error;

/// Scene construction errors
///
/// The first error aborts a build; no partial scene is returned.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Asset source path does not exist
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Path already loaded as another asset type
    #[error("Asset type conflict: {path} is loaded as {existing}, requested as {requested}")]
    TypeConflict {
        /// Conflicting path
        path: String,
        /// Type the path is loaded as
        existing: AssetType,
        /// Rejected type
        requested: AssetType,
    },

    /// Material assigns a parameter its shader does not declare
    #[error("Material {material}: unknown shader parameter {parameter}")]
    UnknownParameter {
        /// Material name
        material: String,
        /// Parameter name
        parameter: String,
    },

    /// Object or material name already used
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Attachment would create a cycle
    #[error("Attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: String,
        /// Requested child
        child: String,
    },

    /// Mutation after the builder was finalized
    #[error("Scene builder is finalized")]
    BuilderClosed,

    /// Other asset failure
    #[error(transparent)]
    Asset(AssetError),

    /// Other material failure
    #[error(transparent)]
    Material(MaterialError),

    /// Other scene failure
    #[error(transparent)]
    Scene(SceneError),
}

impl From<AssetError> for BuildError {
    fn from(error: AssetError) -> Self {
        match error {
            AssetError::NotFound(path) => Self::AssetNotFound(path),
            AssetError::TypeConflict { path, existing, requested } => {
                Self::TypeConflict { path, existing, requested }
            }
            other => Self::Asset(other),
        }
    }
}

impl From<MaterialError> for BuildError {
    fn from(error: MaterialError) -> Self {
        match error {
            MaterialError::UnknownParameter { material, parameter } => {
                Self::UnknownParameter { material, parameter }
            }
            other => Self::Material(other),
        }
    }
}

impl From<SceneError> for BuildError {
    fn from(error: SceneError) -> Self {
        match error {
            SceneError::DuplicateName(name) => Self::DuplicateName(name),
            SceneError::CycleDetected { parent, child } => Self::CycleDetected { parent, child },
            other => Self::Scene(other),
        }
    }
}
