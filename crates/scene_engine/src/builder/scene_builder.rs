//! Scene builder state machine
//!
//! ```text
//! Uninitialized --first mutation--> Building --finalize()--> Finalized
//! ```
//!
//! Every asset the recipe acquires and every material it defines is tracked,
//! so [`SceneBuilder::finalize`] can snapshot exactly what the scene needs
//! rather than everything the shared registry happens to hold.

use super::BuildError;
use crate::assets::{
    AssetHandle, AssetKey, AssetRegistry, AssetSource, AssetType, Manifest, Material,
    MaterialBuilder, MaterialRef, ParamValue, ShaderStage,
};
use crate::core::config::SceneConfig;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Transform, Vec3};
use crate::scene::{ComponentData, GameObject, Light, Scene, SceneError, Skybox};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Builder lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing requested yet
    Uninitialized,
    /// Accepting mutations
    Building,
    /// Manifest produced; mutations fail with `BuilderClosed`
    Finalized,
}

/// Declarative scene construction over a shared asset registry
pub struct SceneBuilder {
    registry: Arc<dyn AssetRegistry>,
    scene: Scene,
    state: BuilderState,
    assets: BTreeMap<AssetKey, AssetHandle>,
    materials: BTreeMap<String, Arc<Material>>,
    manifest: Option<Manifest>,
}

impl SceneBuilder {
    /// Builder producing a scene with default limits
    pub fn new(registry: Arc<dyn AssetRegistry>) -> Self {
        Self::with_scene(registry, Scene::new())
    }

    /// Builder honoring scene configuration
    pub fn with_config(registry: Arc<dyn AssetRegistry>, config: &SceneConfig) -> Self {
        Self::with_scene(registry, Scene::with_max_lights(config.max_lights))
    }

    fn with_scene(registry: Arc<dyn AssetRegistry>, scene: Scene) -> Self {
        Self {
            registry,
            scene,
            state: BuilderState::Uninitialized,
            assets: BTreeMap::new(),
            materials: BTreeMap::new(),
            manifest: None,
        }
    }

    /// Run a recipe to completion and finalize
    ///
    /// The first error aborts the recipe and the partial scene is dropped.
    pub fn build<F>(registry: Arc<dyn AssetRegistry>, recipe: F) -> Result<(Scene, Manifest), BuildError>
    where
        F: FnOnce(&mut Self) -> Result<(), BuildError>,
    {
        let mut builder = Self::new(registry);
        recipe(&mut builder)?;
        Ok(builder.into_parts())
    }

    /// Current lifecycle state
    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Shared registry
    pub fn registry(&self) -> &Arc<dyn AssetRegistry> {
        &self.registry
    }

    /// Scene under construction
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Camera object created with the scene
    pub fn main_camera(&self) -> ObjectId {
        self.scene.main_camera()
    }

    /// Material defined earlier in this build
    pub fn material(&self, name: &str) -> Option<Arc<Material>> {
        self.materials.get(name).cloned()
    }

    fn begin_mutation(&mut self) -> Result<(), BuildError> {
        match self.state {
            BuilderState::Finalized => Err(BuildError::BuilderClosed),
            BuilderState::Uninitialized => {
                log::info!("Scene build started");
                self.state = BuilderState::Building;
                Ok(())
            }
            BuilderState::Building => Ok(()),
        }
    }

    fn track_asset(&mut self, handle: &AssetHandle) {
        self.assets
            .entry(handle.key().clone())
            .or_insert_with(|| handle.clone());
    }

    fn track_material(&mut self, material: &Arc<Material>) {
        if self.materials.contains_key(material.name()) {
            return;
        }
        if let Some(shader) = material.shader().handle() {
            self.track_asset(shader);
        }
        for texture in material.textures().filter_map(|t| t.handle()) {
            self.track_asset(texture);
        }
        self.materials
            .insert(material.name().to_string(), Arc::clone(material));
    }

    /// Reject materials that reuse a tracked name for a different definition
    ///
    /// The manifest stores materials by name, so two definitions under one
    /// name could not both survive a reload.
    fn check_materials(&self, components: &[ComponentData]) -> Result<(), BuildError> {
        let mut pending: BTreeMap<&str, &Arc<Material>> = BTreeMap::new();
        for component in components {
            for material in component.material_refs().into_iter().filter_map(MaterialRef::material) {
                let known = pending
                    .get(material.name())
                    .copied()
                    .or_else(|| self.materials.get(material.name()));
                match known {
                    Some(existing) if !Arc::ptr_eq(existing, material) => {
                        return Err(BuildError::DuplicateName(material.name().to_string()));
                    }
                    Some(_) => {}
                    None => {
                        pending.insert(material.name(), material);
                    }
                }
            }
        }
        Ok(())
    }

    fn track_component(&mut self, component: &ComponentData) {
        for handle in component.asset_refs().into_iter().filter_map(|r| r.handle()) {
            self.track_asset(handle);
        }
        for material in component.material_refs().into_iter().filter_map(|r| r.material()) {
            self.track_material(material);
        }
    }

    /// Acquire an asset through the registry
    ///
    /// # Errors
    /// `AssetNotFound` for a missing path, `TypeConflict` when the path is
    /// already loaded as another type.
    pub fn acquire_asset(
        &mut self,
        asset_type: AssetType,
        source: impl Into<AssetSource>,
    ) -> Result<AssetHandle, BuildError> {
        self.begin_mutation()?;
        let handle = self.registry.create_asset(asset_type, &source.into())?;
        log::debug!("Acquired {}", handle.key());
        self.track_asset(&handle);
        Ok(handle)
    }

    /// Acquire a mesh
    pub fn mesh(&mut self, path: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(AssetType::Mesh, path)
    }

    /// Acquire a 1D texture
    pub fn texture_1d(&mut self, path: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(AssetType::Texture1D, path)
    }

    /// Acquire a 2D texture
    pub fn texture_2d(&mut self, path: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(AssetType::Texture2D, path)
    }

    /// Acquire a 3D texture, e.g. a `.cube` color LUT
    pub fn texture_3d(&mut self, path: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(AssetType::Texture3D, path)
    }

    /// Acquire a cube map
    pub fn texture_cube(&mut self, path: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(AssetType::TextureCube, path)
    }

    /// Acquire a vertex + fragment shader program
    pub fn shader(&mut self, vertex: &str, fragment: &str) -> Result<AssetHandle, BuildError> {
        self.acquire_asset(
            AssetType::Shader,
            AssetSource::stages([(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)]),
        )
    }

    /// Define a named material over a shader
    ///
    /// # Errors
    /// * `DuplicateName` - a material with this name already exists
    /// * `UnknownParameter` - a parameter is not declared by the shader
    /// * `Material` - a value does not fit its parameter, or the handle is not a shader
    pub fn define_material<I, K>(
        &mut self,
        name: &str,
        shader: &AssetHandle,
        params: I,
    ) -> Result<Arc<Material>, BuildError>
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: Into<String>,
    {
        self.begin_mutation()?;
        if self.materials.contains_key(name) {
            return Err(BuildError::DuplicateName(name.to_string()));
        }
        let material = Arc::new(MaterialBuilder::new(name, shader).params(params).build()?);
        log::debug!(
            "Defined material {} with {} parameters",
            name,
            material.params().len()
        );
        self.track_material(&material);
        Ok(material)
    }

    /// Create a game object with a transform and components
    ///
    /// Nothing is created when any component kind repeats or the name is taken.
    pub fn create_object<I>(
        &mut self,
        name: &str,
        transform: Transform,
        components: I,
    ) -> Result<ObjectId, BuildError>
    where
        I: IntoIterator<Item = ComponentData>,
    {
        self.begin_mutation()?;
        if self.scene.find(name).is_some() {
            return Err(BuildError::DuplicateName(name.to_string()));
        }
        let components: Vec<ComponentData> = components.into_iter().collect();
        let mut kinds = BTreeSet::new();
        for component in &components {
            if !kinds.insert(component.kind()) {
                return Err(SceneError::DuplicateComponent {
                    object: name.to_string(),
                    kind: component.kind(),
                }
                .into());
            }
        }

        self.check_materials(&components)?;

        let id = self.scene.create_game_object(name)?;
        self.scene.get_mut(id)?.set_transform(transform);
        for component in components {
            self.track_component(&component);
            self.scene.add_component(id, component)?;
        }
        Ok(id)
    }

    /// Attach a component to an existing object
    pub fn add_component(&mut self, id: ObjectId, component: impl Into<ComponentData>) -> Result<(), BuildError> {
        self.begin_mutation()?;
        let component = component.into();
        self.check_materials(std::slice::from_ref(&component))?;
        self.track_component(&component);
        self.scene.add_component(id, component)?;
        Ok(())
    }

    /// Edit an object directly
    ///
    /// Components added this way are not tracked for the manifest; prefer
    /// [`SceneBuilder::add_component`].
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut GameObject, BuildError> {
        self.begin_mutation()?;
        Ok(self.scene.get_mut(id)?)
    }

    /// Parent `child` under `parent`, detaching it from any previous parent
    pub fn attach_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), BuildError> {
        self.begin_mutation()?;
        self.scene.attach_child(parent, child)?;
        Ok(())
    }

    /// Add a scene light
    pub fn add_light(&mut self, light: Light) -> Result<usize, BuildError> {
        self.begin_mutation()?;
        Ok(self.scene.add_light(light)?)
    }

    /// Set the skybox
    pub fn set_skybox(&mut self, texture: &AssetHandle, shader: &AssetHandle, rotation: Vec3) -> Result<(), BuildError> {
        self.begin_mutation()?;
        self.track_asset(texture);
        self.track_asset(shader);
        self.scene
            .set_skybox(Skybox::new(texture, shader).with_rotation(rotation));
        Ok(())
    }

    /// Assign a color LUT to slot 1, 2 or 3
    pub fn set_color_lut(&mut self, slot: usize, lut: &AssetHandle) -> Result<(), BuildError> {
        self.begin_mutation()?;
        self.scene.set_color_lut(slot, lut)?;
        self.track_asset(lut);
        Ok(())
    }

    /// Snapshot every acquired asset and defined material
    ///
    /// Texture settings are captured as they are now, so settings applied
    /// after acquisition are persisted. Calling this again returns the same
    /// manifest.
    pub fn finalize(&mut self) -> Manifest {
        if let Some(manifest) = &self.manifest {
            return manifest.clone();
        }
        let mut manifest = Manifest::new();
        for handle in self.assets.values() {
            manifest.record_asset(handle);
        }
        for material in self.materials.values() {
            manifest.record_material(material);
        }
        log::info!(
            "Scene build finalized: {} objects, {} assets, {} materials",
            self.scene.object_count(),
            manifest.len(),
            manifest.materials.len()
        );
        self.state = BuilderState::Finalized;
        self.manifest = Some(manifest.clone());
        manifest
    }

    /// Finalize and hand over the scene with its manifest
    pub fn into_parts(mut self) -> (Scene, Manifest) {
        let manifest = self.finalize();
        (self.scene, manifest)
    }

    /// Reference to a material defined in this build
    pub fn material_ref(&self, name: &str) -> Option<MaterialRef> {
        self.materials.get(name).map(MaterialRef::from)
    }
}
