//! Material definitions bound to shader interfaces
//!
//! A material names a shader program and assigns values to the parameters
//! that program declares. Assignments are checked against the shader
//! interface when they are made, never at draw time.

pub mod material;
pub mod material_builder;

pub use material::{Material, MaterialRef, ParamValue};
pub use material_builder::MaterialBuilder;

use super::handle::AssetKey;
use super::shader_interface::ParamType;
use thiserror::Error;

/// Material definition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterialError {
    /// Parameter not declared by the shader
    #[error("Material {material}: shader declares no parameter named {parameter}")]
    UnknownParameter {
        /// Material being defined
        material: String,
        /// Offending parameter name
        parameter: String,
    },

    /// Value kind does not fit the declared parameter type
    #[error("Material {material}: parameter {parameter} expects {expected}, got {found}")]
    ParameterTypeMismatch {
        /// Material being defined
        material: String,
        /// Offending parameter name
        parameter: String,
        /// Declared type
        expected: ParamType,
        /// Kind of the supplied value
        found: String,
    },

    /// Handle passed as a shader is some other kind of asset
    #[error("Asset {0} is not a shader")]
    NotAShader(AssetKey),

    /// Shader reference carries no live handle to validate against
    #[error("Material {0} has no resolved shader")]
    UnresolvedShader(String),
}
