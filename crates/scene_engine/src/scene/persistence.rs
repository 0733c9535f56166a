//! Scene save and load
//!
//! A saved scene stores names, transforms, hierarchy and components with
//! asset and material references as keys. Loading resolves those keys
//! through the manifest saved alongside it, so handles are shared with the
//! registry again.

use super::components::ComponentData;
use super::lighting::{Light, Skybox};
use super::scene_graph::Scene;
use super::SceneError;
use crate::assets::handle::AssetRef;
use crate::assets::registry::AssetRegistry;
use crate::assets::resolver::AssetResolver;
use crate::config::{read_document, write_document};
use crate::foundation::math::Transform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Unique name
    pub name: String,
    /// Local transform
    pub transform: Transform,
    /// Child names in attachment order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    /// Components ordered by kind
    #[serde(default)]
    pub components: Vec<ComponentData>,
}

/// Serializable form of a [`Scene`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Objects in creation order
    pub objects: Vec<ObjectRecord>,
    /// Name of the main camera object
    pub main_camera: String,
    /// Lights in insertion order
    #[serde(default)]
    pub lights: Vec<Light>,
    /// Light limit
    pub max_lights: usize,
    /// Skybox
    #[serde(default)]
    pub skybox: Option<Skybox>,
    /// Occupied LUT slots
    #[serde(default)]
    pub color_luts: BTreeMap<usize, AssetRef>,
}

impl Scene {
    /// Capture the scene as a document
    pub fn to_document(&self) -> SceneDocument {
        let name_of = |id| self.object(id).map(|object| object.name().to_string());
        SceneDocument {
            objects: self
                .objects()
                .map(|(_, object)| ObjectRecord {
                    name: object.name().to_string(),
                    transform: *object.transform(),
                    children: object.children().iter().filter_map(|&id| name_of(id)).collect(),
                    components: object.components().cloned().collect(),
                })
                .collect(),
            main_camera: name_of(self.main_camera()).unwrap_or_default(),
            lights: self.lights().to_vec(),
            max_lights: self.max_lights(),
            skybox: self.skybox().cloned(),
            color_luts: self
                .color_luts()
                .map(|(slot, lut)| (slot, lut.clone()))
                .collect(),
        }
    }

    /// Rebuild a scene from a document, resolving every reference
    ///
    /// # Errors
    /// * `UnresolvedReference` - a key or material is missing from the manifest
    /// * `UnknownObject` - a child or camera name has no record
    /// * `DuplicateName`, `CycleDetected`, `InvalidLutSlot` - malformed document
    pub fn from_document<R: AssetRegistry + ?Sized>(
        document: SceneDocument,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<Self, SceneError> {
        let mut scene = Self::empty(document.max_lights);

        for record in &document.objects {
            let id = scene.create_game_object(record.name.clone())?;
            let object = scene.get_mut(id)?;
            object.set_transform(record.transform);
            for component in &record.components {
                let mut component = component.clone();
                component.resolve(resolver)?;
                object.add_data(component)?;
            }
        }

        for record in &document.objects {
            let parent = scene
                .find(&record.name)
                .ok_or_else(|| SceneError::UnknownObject(record.name.clone()))?;
            for child_name in &record.children {
                let child = scene
                    .find(child_name)
                    .ok_or_else(|| SceneError::UnknownObject(child_name.clone()))?;
                scene.attach_child(parent, child)?;
            }
        }

        let camera = scene
            .find(&document.main_camera)
            .ok_or_else(|| SceneError::UnknownObject(document.main_camera.clone()))?;
        scene.set_main_camera(camera);

        for light in document.lights {
            scene.add_light(light)?;
        }
        if let Some(mut skybox) = document.skybox {
            skybox.texture.resolve(resolver)?;
            skybox.shader.resolve(resolver)?;
            scene.set_skybox(skybox);
        }
        for (slot, mut lut) in document.color_luts {
            lut.resolve(resolver)?;
            scene.set_color_lut(slot, lut)?;
        }

        log::debug!("Rebuilt scene with {} objects", scene.object_count());
        Ok(scene)
    }

    /// Write the scene; saving an unchanged scene twice yields identical files
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let path = path.as_ref();
        write_document(path, &self.to_document())?;
        log::info!("Saved scene with {} objects to {}", self.object_count(), path.display());
        Ok(())
    }

    /// Read a scene saved with [`Scene::save`]
    pub fn load<R: AssetRegistry + ?Sized>(
        path: impl AsRef<Path>,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let document: SceneDocument = read_document(path)?;
        let scene = Self::from_document(document, resolver)?;
        log::info!("Loaded scene from {}", path.display());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{
        AssetKey, AssetSource, AssetType, CachedAssetRegistry, Manifest, Material, MaterialRef, MemoryStore,
        ResolveError, ShaderStage,
    };
    use crate::foundation::math::Vec3;
    use crate::scene::components::RenderComponent;
    use crate::scene::MAIN_CAMERA_NAME;
    use std::sync::Arc;

    struct Fixture {
        registry: CachedAssetRegistry<MemoryStore>,
        manifest: Manifest,
        scene: Scene,
    }

    fn fixture() -> Fixture {
        let registry = CachedAssetRegistry::new(
            MemoryStore::new()
                .with_file("cube.obj", "v 0 0 0")
                .with_file("stone.png", vec![0u8])
                .with_file("sky.jpg", vec![0u8])
                .with_file("cool.cube", "LUT_3D_SIZE 2")
                .with_file("lit.glsl", "uniform sampler2D s_Diffuse;"),
        );
        let shader = registry
            .create_asset(AssetType::Shader, &AssetSource::stages([(ShaderStage::Fragment, "lit.glsl")]))
            .unwrap();
        let mesh = registry.create_asset(AssetType::Mesh, &"cube.obj".into()).unwrap();
        let texture = registry.create_asset(AssetType::Texture2D, &"stone.png".into()).unwrap();
        let sky = registry.create_asset(AssetType::TextureCube, &"sky.jpg".into()).unwrap();
        let lut = registry.create_asset(AssetType::Texture3D, &"cool.cube".into()).unwrap();

        let mut material = Material::new("Stone", &shader).unwrap();
        material.set("s_Diffuse", &texture).unwrap();
        let material = Arc::new(material);

        let mut scene = Scene::new();
        let parent = scene.create_game_object("Parent").unwrap();
        let child = scene.create_game_object("Child").unwrap();
        scene.get_mut(child).unwrap().set_position(Vec3::new(1.0, 2.0, 3.0));
        scene
            .add_component(child, RenderComponent::new(&mesh, &material))
            .unwrap();
        scene.attach_child(parent, child).unwrap();
        scene.add_light(Light::new(Vec3::new(0.0, 1.0, 3.0), Vec3::new(1.0, 1.0, 1.0)).with_range(100.0)).unwrap();
        scene.set_skybox(Skybox::new(&sky, &shader).with_rotation(Vec3::new(90.0, 0.0, 0.0)));
        scene.set_color_lut(2, &lut).unwrap();

        let mut manifest = registry.manifest();
        manifest.record_material(&material);
        Fixture { registry, manifest, scene }
    }

    #[test]
    fn test_round_trip_restores_scene() {
        let Fixture { registry, manifest, scene } = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");
        scene.save(&path).unwrap();

        let mut resolver = AssetResolver::new(&registry, &manifest);
        let loaded = Scene::load(&path, &mut resolver).unwrap();

        assert_eq!(loaded.to_document(), scene.to_document());
        assert_eq!(loaded.get(loaded.main_camera()).unwrap().name(), MAIN_CAMERA_NAME);

        let child = loaded.find("Child").unwrap();
        assert_eq!(loaded.get(child).unwrap().parent(), loaded.find("Parent"));

        let render = loaded.component::<RenderComponent>(child).unwrap();
        let mesh_key = AssetKey::new(AssetType::Mesh, &"cube.obj".into());
        let mesh = render.mesh.as_ref().and_then(AssetRef::handle).unwrap();
        assert!(mesh.ptr_eq(&registry.get(&mesh_key).unwrap()));
        let material = render.material.as_ref().and_then(MaterialRef::material).unwrap();
        assert!(material.get("s_Diffuse").unwrap().texture().unwrap().is_resolved());
        assert!(loaded.skybox().unwrap().texture.is_resolved());
        assert!(loaded.color_lut(2).unwrap().is_resolved());
    }

    #[test]
    fn test_save_is_idempotent() {
        let Fixture { scene, .. } = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");

        scene.save(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        scene.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_missing_key_is_unresolved() {
        let Fixture { registry, scene, .. } = fixture();
        let manifest = Manifest::new();
        let mut resolver = AssetResolver::new(&registry, &manifest);

        let result = Scene::from_document(scene.to_document(), &mut resolver);
        assert!(matches!(
            result,
            Err(SceneError::UnresolvedReference(ResolveError::MissingAsset(_)))
        ));
    }
}
