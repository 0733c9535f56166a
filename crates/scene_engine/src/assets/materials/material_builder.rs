//! Fluent material construction
//!
//! Collects parameter assignments and validates them all in [`MaterialBuilder::build`],
//! so a level script can describe a material in one expression.

use super::material::{Material, ParamValue};
use super::MaterialError;
use crate::assets::handle::AssetHandle;

/// Builder for shader-bound materials
///
/// # Examples
/// ```no_run
/// use scene_engine::assets::{AssetHandle, MaterialBuilder, MaterialError, Material};
///
/// fn stone(shader: &AssetHandle, diffuse: &AssetHandle) -> Result<Material, MaterialError> {
///     MaterialBuilder::new("Stone", shader)
///         .texture("u_Material.Diffuse", diffuse)
///         .param("u_Material.Shininess", 0.0_f32)
///         .build()
/// }
/// ```
pub struct MaterialBuilder {
    name: String,
    shader: AssetHandle,
    params: Vec<(String, ParamValue)>,
}

impl MaterialBuilder {
    /// Start a material over a shader
    pub fn new(name: impl Into<String>, shader: &AssetHandle) -> Self {
        Self {
            name: name.into(),
            shader: shader.clone(),
            params: Vec::new(),
        }
    }

    /// Assign a parameter value
    #[must_use]
    pub fn param(mut self, parameter: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((parameter.into(), value.into()));
        self
    }

    /// Bind a texture to a sampler parameter
    #[must_use]
    pub fn texture(self, parameter: impl Into<String>, texture: &AssetHandle) -> Self {
        self.param(parameter, texture)
    }

    /// Assign every pair from an iterator
    #[must_use]
    pub fn params<I, K>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Validate every assignment and produce the material
    ///
    /// Fails on the first parameter the shader does not declare or whose
    /// value does not fit the declared type. Later assignments of the same
    /// parameter replace earlier ones.
    pub fn build(self) -> Result<Material, MaterialError> {
        let mut material = Material::new(self.name, &self.shader)?;
        for (parameter, value) in self.params {
            material.set(&parameter, value)?;
        }
        Ok(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetRegistry, AssetSource, AssetType, CachedAssetRegistry, MemoryStore, ShaderStage};
    use crate::foundation::math::Vec4;

    fn shader() -> AssetHandle {
        let registry = CachedAssetRegistry::new(
            MemoryStore::new().with_file("tint.glsl", "uniform vec4 u_Tint; uniform float u_Gain;"),
        );
        registry
            .create_asset(AssetType::Shader, &AssetSource::stages([(ShaderStage::Fragment, "tint.glsl")]))
            .unwrap()
    }

    #[test]
    fn test_build_collects_params() {
        let material = MaterialBuilder::new("Tinted", &shader())
            .param("u_Tint", Vec4::new(1.0, 0.5, 0.25, 1.0))
            .param("u_Gain", 2.0_f32)
            .param("u_Gain", 3.0_f32)
            .build()
            .unwrap();

        assert_eq!(material.name(), "Tinted");
        assert_eq!(material.get("u_Gain"), Some(&ParamValue::Float(3.0)));
        assert!(material.get("u_Tint").is_some());
    }

    #[test]
    fn test_build_rejects_undeclared() {
        let result = MaterialBuilder::new("Tinted", &shader())
            .param("u_Color", 1.0_f32)
            .build();
        assert_eq!(
            result,
            Err(MaterialError::UnknownParameter {
                material: "Tinted".to_string(),
                parameter: "u_Color".to_string(),
            })
        );
    }
}
