//! Material data and serializable material references

use super::MaterialError;
use crate::assets::handle::{AssetHandle, AssetRef};
use crate::assets::registry::AssetRegistry;
use crate::assets::resolver::{AssetResolver, ResolveError};
use crate::assets::shader_interface::{ParamType, ShaderInterface};
use crate::assets::AssetType;
use crate::foundation::math::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Value assigned to a shader parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Texture bound to a sampler
    Texture(AssetRef),
    /// Scalar float
    Float(f32),
    /// Signed integer, also accepted for unsigned parameters
    Int(i32),
    /// Boolean
    Bool(bool),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector or RGBA color
    Vec4(Vec4),
    /// 4x4 matrix
    Mat4(Mat4),
}

impl ParamValue {
    /// Whether the value can be bound to a parameter of the given type
    pub fn matches(&self, param_type: ParamType) -> bool {
        match self {
            Self::Texture(texture) => {
                let sampler = match texture.asset_type() {
                    Some(AssetType::Texture1D) => ParamType::Sampler1D,
                    Some(AssetType::Texture2D) => ParamType::Sampler2D,
                    Some(AssetType::Texture3D) => ParamType::Sampler3D,
                    Some(AssetType::TextureCube) => ParamType::SamplerCube,
                    _ => return false,
                };
                sampler == param_type
            }
            Self::Float(_) => param_type == ParamType::Float,
            Self::Int(_) => matches!(param_type, ParamType::Int | ParamType::UInt),
            Self::Bool(_) => param_type == ParamType::Bool,
            Self::Vec2(_) => param_type == ParamType::Vec2,
            Self::Vec3(_) => param_type == ParamType::Vec3,
            Self::Vec4(_) => param_type == ParamType::Vec4,
            Self::Mat4(_) => param_type == ParamType::Mat4,
        }
    }

    /// Short description of the value kind, for diagnostics
    pub fn kind(&self) -> String {
        match self {
            Self::Texture(texture) => texture
                .asset_type()
                .map_or_else(|| "texture".to_string(), |t| t.to_string()),
            Self::Float(_) => "float".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::Vec2(_) => "vec2".to_string(),
            Self::Vec3(_) => "vec3".to_string(),
            Self::Vec4(_) => "vec4".to_string(),
            Self::Mat4(_) => "mat4".to_string(),
        }
    }

    /// Texture reference, if this is a texture binding
    pub fn texture(&self) -> Option<&AssetRef> {
        match self {
            Self::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec2> for ParamValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for ParamValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for ParamValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<Mat4> for ParamValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

impl From<AssetRef> for ParamValue {
    fn from(value: AssetRef) -> Self {
        Self::Texture(value)
    }
}

impl From<&AssetHandle> for ParamValue {
    fn from(handle: &AssetHandle) -> Self {
        Self::Texture(AssetRef::from(handle))
    }
}

impl From<AssetHandle> for ParamValue {
    fn from(handle: AssetHandle) -> Self {
        Self::Texture(AssetRef::from(handle))
    }
}

/// Named shader plus parameter assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    name: String,
    shader: AssetRef,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
}

impl Material {
    /// Create a material with no parameters set
    pub fn new(name: impl Into<String>, shader: &AssetHandle) -> Result<Self, MaterialError> {
        if shader.asset_type() != AssetType::Shader {
            return Err(MaterialError::NotAShader(shader.key().clone()));
        }
        Ok(Self {
            name: name.into(),
            shader: AssetRef::from(shader),
            params: BTreeMap::new(),
        })
    }

    /// Assign a parameter, checked against the shader interface
    pub fn set(&mut self, parameter: &str, value: impl Into<ParamValue>) -> Result<&mut Self, MaterialError> {
        let value = value.into();
        let interface = self
            .shader
            .handle()
            .and_then(AssetHandle::shader_interface)
            .ok_or_else(|| MaterialError::UnresolvedShader(self.name.clone()))?;
        self.check_param(interface, parameter, &value)?;

        self.params.insert(parameter.to_string(), value);
        Ok(self)
    }

    fn check_param(
        &self,
        interface: &ShaderInterface,
        parameter: &str,
        value: &ParamValue,
    ) -> Result<(), MaterialError> {
        let expected = interface
            .get(parameter)
            .ok_or_else(|| MaterialError::UnknownParameter {
                material: self.name.clone(),
                parameter: parameter.to_string(),
            })?;
        if !value.matches(expected) {
            return Err(MaterialError::ParameterTypeMismatch {
                material: self.name.clone(),
                parameter: parameter.to_string(),
                expected,
                found: value.kind(),
            });
        }
        Ok(())
    }

    /// Material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shader reference
    pub fn shader(&self) -> &AssetRef {
        &self.shader
    }

    /// Assigned value of a parameter
    pub fn get(&self, parameter: &str) -> Option<&ParamValue> {
        self.params.get(parameter)
    }

    /// All assignments, ordered by parameter name
    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// Textures bound by this material
    pub fn textures(&self) -> impl Iterator<Item = &AssetRef> {
        self.params.values().filter_map(ParamValue::texture)
    }

    /// Attach live handles to the shader and every texture binding
    pub fn resolve<R: AssetRegistry + ?Sized>(
        &mut self,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<(), ResolveError> {
        self.shader.resolve(resolver)?;
        for value in self.params.values_mut() {
            if let ParamValue::Texture(texture) = value {
                texture.resolve(resolver)?;
            }
        }

        // Saved bindings must still fit the shader as it is on disk now
        let interface = self
            .shader
            .handle()
            .and_then(AssetHandle::shader_interface)
            .ok_or_else(|| MaterialError::UnresolvedShader(self.name.clone()))?;
        for (parameter, value) in &self.params {
            self.check_param(interface, parameter, value)?;
        }
        Ok(())
    }
}

/// Serializable reference to a shared material
///
/// Persists as the material name; the definition itself lives in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialRef {
    name: String,
    #[serde(skip)]
    material: Option<Arc<Material>>,
}

impl MaterialRef {
    /// Unresolved reference by name
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: None,
        }
    }

    /// Referenced material name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live material, if resolved
    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Whether a live material is attached
    pub fn is_resolved(&self) -> bool {
        self.material.is_some()
    }

    /// Look the material up through a resolver
    pub fn resolve<R: AssetRegistry + ?Sized>(
        &mut self,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<(), ResolveError> {
        self.material = Some(resolver.material(&self.name)?);
        Ok(())
    }
}

impl From<&Arc<Material>> for MaterialRef {
    fn from(material: &Arc<Material>) -> Self {
        Self {
            name: material.name().to_string(),
            material: Some(Arc::clone(material)),
        }
    }
}

impl From<Arc<Material>> for MaterialRef {
    fn from(material: Arc<Material>) -> Self {
        Self {
            name: material.name().to_string(),
            material: Some(material),
        }
    }
}

impl PartialEq for MaterialRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetSource, CachedAssetRegistry, Manifest, MemoryStore, ShaderStage};

    const FRAGMENT: &str = "
        struct Material { sampler2D Diffuse; float Shininess; sampler1D toonTex; };
        uniform Material u_Material;
        uniform int u_Mode;
    ";

    fn setup() -> (CachedAssetRegistry<MemoryStore>, AssetHandle) {
        let registry = CachedAssetRegistry::new(
            MemoryStore::new()
                .with_file("lit.glsl", FRAGMENT)
                .with_file("a.png", vec![0u8])
                .with_file("ramp.png", vec![0u8]),
        );
        let shader = registry
            .create_asset(AssetType::Shader, &AssetSource::stages([(ShaderStage::Fragment, "lit.glsl")]))
            .unwrap();
        (registry, shader)
    }

    #[test]
    fn test_set_validates_against_interface() {
        let (registry, shader) = setup();
        let diffuse = registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        let ramp = registry.create_asset(AssetType::Texture1D, &"ramp.png".into()).unwrap();

        let mut material = Material::new("Stone", &shader).unwrap();
        material
            .set("u_Material.Diffuse", &diffuse)
            .unwrap()
            .set("u_Material.Shininess", 0.0_f32)
            .unwrap()
            .set("u_Material.toonTex", &ramp)
            .unwrap();
        assert_eq!(material.params().len(), 3);
        assert_eq!(material.textures().count(), 2);

        let unknown = material.set("u_Material.Roughness", 1.0_f32);
        assert!(matches!(unknown, Err(MaterialError::UnknownParameter { parameter, .. }) if parameter == "u_Material.Roughness"));

        let mismatch = material.set("u_Material.Diffuse", &ramp);
        assert!(matches!(
            mismatch,
            Err(MaterialError::ParameterTypeMismatch { expected: ParamType::Sampler2D, .. })
        ));
        assert_eq!(material.get("u_Material.Diffuse"), Some(&ParamValue::from(&diffuse)));
    }

    #[test]
    fn test_int_accepts_declared_int() {
        let (_, shader) = setup();
        let mut material = Material::new("Mode", &shader).unwrap();
        assert!(material.set("u_Mode", 2_i32).is_ok());
        assert!(material.set("u_Mode", true).is_err());
    }

    #[test]
    fn test_new_rejects_non_shader() {
        let (registry, _) = setup();
        let texture = registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        assert!(matches!(Material::new("Bad", &texture), Err(MaterialError::NotAShader(_))));
    }

    #[test]
    fn test_deserialized_material_resolves() {
        let (registry, shader) = setup();
        let diffuse = registry.create_asset(AssetType::Texture2D, &"a.png".into()).unwrap();
        let mut material = Material::new("Stone", &shader).unwrap();
        material.set("u_Material.Diffuse", &diffuse).unwrap();

        let mut manifest = registry.manifest();
        manifest.record_material(&material);
        let text = ron::to_string(&manifest).unwrap();
        let manifest: Manifest = ron::from_str(&text).unwrap();

        let mut resolver = AssetResolver::new(&registry, &manifest);
        let first = resolver.material("Stone").unwrap();
        let second = resolver.material("Stone").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let bound = first.get("u_Material.Diffuse").and_then(ParamValue::texture).unwrap();
        assert!(bound.handle().unwrap().ptr_eq(&diffuse));
        assert!(first.shader().handle().unwrap().ptr_eq(&shader));
    }

    #[test]
    fn test_stale_binding_fails_to_resolve() {
        let (registry, shader) = setup();
        let mut material = Material::new("Mode", &shader).unwrap();
        material.set("u_Mode", 2_i32).unwrap();
        let mut manifest = registry.manifest();
        manifest.record_material(&material);

        // Same shader file, edited so it no longer declares u_Mode
        let edited = CachedAssetRegistry::new(
            MemoryStore::new().with_file("lit.glsl", "uniform float u_Exposure;"),
        );
        let mut resolver = AssetResolver::new(&edited, &manifest);
        assert!(matches!(
            resolver.material("Mode"),
            Err(ResolveError::StaleMaterial(MaterialError::UnknownParameter { parameter, .. })) if parameter == "u_Mode"
        ));
    }

    #[test]
    fn test_material_ref_serializes_as_name() {
        let (_, shader) = setup();
        let material = Arc::new(Material::new("Stone", &shader).unwrap());
        let reference = MaterialRef::from(&material);
        assert_eq!(ron::to_string(&reference).unwrap(), "\"Stone\"");

        let back: MaterialRef = ron::from_str("\"Stone\"").unwrap();
        assert_eq!(back, reference);
        assert!(!back.is_resolved());
    }
}
