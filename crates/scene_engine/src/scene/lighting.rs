//! Scene lights and skybox

use crate::assets::handle::AssetRef;
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Point light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// World position
    pub position: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Attenuation range
    pub range: f32,
}

impl Light {
    /// Light with the default range
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            range: 4.0,
        }
    }

    /// Set the attenuation range
    #[must_use]
    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }
}

/// Environment cube map drawn behind the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skybox {
    /// Cube texture
    pub texture: AssetRef,
    /// Shader program drawing the box
    pub shader: AssetRef,
    /// Euler rotation in degrees
    pub rotation: Vec3,
}

impl Skybox {
    /// Unrotated skybox
    pub fn new(texture: impl Into<AssetRef>, shader: impl Into<AssetRef>) -> Self {
        Self {
            texture: texture.into(),
            shader: shader.into(),
            rotation: Vec3::zeros(),
        }
    }

    /// Rotate the skybox
    #[must_use]
    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }
}
