//! Scene graph ownership, hierarchy edits and per-frame update

use super::components::{Camera, Component, ComponentData, ParticleSystem, RotatingBehaviour};
use super::game_object::GameObject;
use super::lighting::{Light, Skybox};
use super::SceneError;
use crate::assets::handle::AssetRef;
use crate::foundation::collections::{ObjectId, SlotMap};
use crate::foundation::math::{utils, Mat4};
use std::collections::HashMap;

/// Number of color grading LUT slots, addressed 1..=3
pub const COLOR_LUT_SLOTS: usize = 3;

/// Light limit used by [`Scene::new`]
pub const DEFAULT_MAX_LIGHTS: usize = 8;

/// Name of the camera object every new scene starts with
pub const MAIN_CAMERA_NAME: &str = "Main Camera";

/// Object graph plus scene-wide rendering settings
#[derive(Debug, Clone)]
pub struct Scene {
    objects: SlotMap<ObjectId, GameObject>,
    order: Vec<ObjectId>,
    names: HashMap<String, ObjectId>,
    lights: Vec<Light>,
    max_lights: usize,
    skybox: Option<Skybox>,
    color_luts: [Option<AssetRef>; COLOR_LUT_SLOTS],
    main_camera: ObjectId,
}

impl Scene {
    /// Scene holding only the main camera
    pub fn new() -> Self {
        Self::with_max_lights(DEFAULT_MAX_LIGHTS)
    }

    /// Scene holding only the main camera, with a custom light limit
    pub fn with_max_lights(max_lights: usize) -> Self {
        let mut scene = Self::empty(max_lights);
        let mut camera = GameObject::new(MAIN_CAMERA_NAME.to_string());
        // Fresh object, so the kind is free
        camera.add(Camera::default()).ok();
        scene.main_camera = scene.insert(camera);
        scene
    }

    /// Scene without a camera; the caller designates one
    pub(super) fn empty(max_lights: usize) -> Self {
        Self {
            objects: SlotMap::with_key(),
            order: Vec::new(),
            names: HashMap::new(),
            lights: Vec::new(),
            max_lights,
            skybox: None,
            color_luts: Default::default(),
            main_camera: ObjectId::default(),
        }
    }

    fn insert(&mut self, object: GameObject) -> ObjectId {
        let name = object.name().to_string();
        let id = self.objects.insert(object);
        self.order.push(id);
        self.names.insert(name, id);
        id
    }

    fn name_of(&self, id: ObjectId) -> String {
        self.objects
            .get(id)
            .map_or_else(|| format!("{id:?}"), |object| object.name().to_string())
    }

    /// Create an unattached object with an identity transform
    ///
    /// # Errors
    /// `DuplicateName` when the name is already taken in this scene.
    pub fn create_game_object(&mut self, name: impl Into<String>) -> Result<ObjectId, SceneError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(SceneError::DuplicateName(name));
        }
        log::debug!("Creating game object {}", name);
        Ok(self.insert(GameObject::new(name)))
    }

    /// Object by id
    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutable object by id
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Object by id, as an error when missing
    pub fn get(&self, id: ObjectId) -> Result<&GameObject, SceneError> {
        self.objects
            .get(id)
            .ok_or_else(|| SceneError::UnknownObject(format!("{id:?}")))
    }

    /// Mutable object by id, as an error when missing
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut GameObject, SceneError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| SceneError::UnknownObject(format!("{id:?}")))
    }

    /// Id of the object with this name
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    /// Object with this name
    pub fn find_object(&self, name: &str) -> Option<&GameObject> {
        self.find(name).and_then(|id| self.objects.get(id))
    }

    /// Objects in creation order
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.order
            .iter()
            .filter_map(|&id| self.objects.get(id).map(|object| (id, object)))
    }

    /// Objects without a parent, in creation order
    pub fn roots(&self) -> impl Iterator<Item = (ObjectId, &GameObject)> {
        self.objects().filter(|(_, object)| object.parent().is_none())
    }

    /// Number of objects, including the main camera
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Attach a component to an object
    pub fn add_component(&mut self, id: ObjectId, component: impl Into<ComponentData>) -> Result<(), SceneError> {
        self.get_mut(id)?.add_data(component.into())?;
        Ok(())
    }

    /// Typed component of an object
    pub fn component<C: Component>(&self, id: ObjectId) -> Option<&C> {
        self.objects.get(id).and_then(GameObject::get::<C>)
    }

    /// Whether `ancestor` is on the parent chain of `node`
    pub fn is_ancestor(&self, ancestor: ObjectId, node: ObjectId) -> bool {
        let mut current = self.objects.get(node).and_then(GameObject::parent);
        // Links are cycle-free, but never walk further than the object count
        for _ in 0..self.objects.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.objects.get(id).and_then(GameObject::parent),
                None => return false,
            }
        }
        false
    }

    /// Make `child` a child of `parent`
    ///
    /// A child that already has another parent is detached from it first.
    ///
    /// # Errors
    /// * `UnknownObject` - either id is not in this scene
    /// * `CycleDetected` - `child` is `parent` or one of its ancestors; the
    ///   graph is left unchanged
    pub fn attach_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<(), SceneError> {
        self.get(parent)?;
        let previous = self.get(child)?.parent();

        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected {
                parent: self.name_of(parent),
                child: self.name_of(child),
            });
        }
        if previous == Some(parent) {
            return Ok(());
        }

        if let Some(old) = previous {
            log::warn!(
                "Reparenting {} from {} to {}",
                self.name_of(child),
                self.name_of(old),
                self.name_of(parent)
            );
            if let Some(old_parent) = self.objects.get_mut(old) {
                old_parent.children.retain(|&id| id != child);
            }
        }
        if let Some(object) = self.objects.get_mut(child) {
            object.parent = Some(parent);
        }
        if let Some(object) = self.objects.get_mut(parent) {
            object.children.push(child);
        }
        Ok(())
    }

    /// Detach an object from its parent, making it a root
    pub fn detach(&mut self, child: ObjectId) -> Result<(), SceneError> {
        let previous = self.get_mut(child)?.parent.take();
        if let Some(old_parent) = previous.and_then(|id| self.objects.get_mut(id)) {
            old_parent.children.retain(|&id| id != child);
        }
        Ok(())
    }

    /// Object-to-world matrix, composing every ancestor's transform
    pub fn world_transform(&self, id: ObjectId) -> Result<Mat4, SceneError> {
        let mut matrix = self.get(id)?.transform().to_matrix();
        let mut current = self.get(id)?.parent();
        while let Some(parent_id) = current {
            let parent = self.get(parent_id)?;
            matrix = parent.transform().to_matrix() * matrix;
            current = parent.parent();
        }
        Ok(matrix)
    }

    /// Add a light
    ///
    /// # Errors
    /// `TooManyLights` once the scene holds `max_lights` lights.
    pub fn add_light(&mut self, light: Light) -> Result<usize, SceneError> {
        if self.lights.len() >= self.max_lights {
            return Err(SceneError::TooManyLights(self.max_lights));
        }
        self.lights.push(light);
        Ok(self.lights.len() - 1)
    }

    /// Lights in insertion order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Mutable lights
    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Light limit
    pub fn max_lights(&self) -> usize {
        self.max_lights
    }

    /// Set the skybox
    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    /// Current skybox
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    /// Assign a color grading LUT to slot 1, 2 or 3
    pub fn set_color_lut(&mut self, slot: usize, lut: impl Into<AssetRef>) -> Result<(), SceneError> {
        let index = slot
            .checked_sub(1)
            .filter(|&index| index < COLOR_LUT_SLOTS)
            .ok_or(SceneError::InvalidLutSlot(slot))?;
        if let Some(old) = self.color_luts[index].replace(lut.into()) {
            log::warn!("Replacing color LUT {} in slot {}", old.key(), slot);
        }
        Ok(())
    }

    /// LUT in slot 1, 2 or 3
    pub fn color_lut(&self, slot: usize) -> Option<&AssetRef> {
        slot.checked_sub(1)
            .and_then(|index| self.color_luts.get(index))
            .and_then(Option::as_ref)
    }

    /// Occupied LUT slots as `(slot, lut)`
    pub fn color_luts(&self) -> impl Iterator<Item = (usize, &AssetRef)> {
        self.color_luts
            .iter()
            .enumerate()
            .filter_map(|(index, lut)| lut.as_ref().map(|lut| (index + 1, lut)))
    }

    /// Camera object the scene renders from
    pub fn main_camera(&self) -> ObjectId {
        self.main_camera
    }

    pub(super) fn set_main_camera(&mut self, id: ObjectId) {
        self.main_camera = id;
    }

    /// Advance every component with the update capability
    ///
    /// Returns the number of particles spawned during this step.
    pub fn update(&mut self, dt: f32) -> u64 {
        let mut spawned = 0;
        for &id in &self.order {
            let Some(object) = self.objects.get_mut(id) else {
                continue;
            };
            if let Some(speed) = object.get::<RotatingBehaviour>().map(|r| r.rotation_speed) {
                let rotation = &mut object.transform_mut().rotation;
                *rotation += speed * dt;
                rotation.apply(|angle| *angle = utils::wrap_degrees(*angle));
            }
            if let Some(particles) = object.get_mut::<ParticleSystem>() {
                spawned += particles.advance(dt);
            }
        }
        if spawned > 0 {
            log::trace!("Spawned {} particles", spawned);
        }
        spawned
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{Asset, AssetData, AssetHandle, AssetSource, AssetType};
    use crate::foundation::math::{Transform, Vec3, Vec4};
    use crate::scene::components::ParticleEmitter;
    use approx::assert_relative_eq;

    fn lut(path: &str) -> AssetHandle {
        AssetHandle::new(Asset::new(
            AssetType::Texture3D,
            AssetSource::path(path),
            AssetData::Binary(Vec::new()),
        ))
    }

    #[test]
    fn test_new_scene_has_main_camera() {
        let scene = Scene::new();
        assert_eq!(scene.object_count(), 1);
        let camera = scene.get(scene.main_camera()).unwrap();
        assert_eq!(camera.name(), MAIN_CAMERA_NAME);
        assert!(camera.has::<Camera>());
    }

    #[test]
    fn test_duplicate_name() {
        let mut scene = Scene::new();
        scene.create_game_object("Box").unwrap();
        assert!(matches!(scene.create_game_object("Box"), Err(SceneError::DuplicateName(n)) if n == "Box"));
        assert!(matches!(
            scene.create_game_object(MAIN_CAMERA_NAME),
            Err(SceneError::DuplicateName(_))
        ));
        assert_eq!(scene.object_count(), 2);
    }

    #[test]
    fn test_cycle_leaves_graph_unchanged() {
        let mut scene = Scene::new();
        let a = scene.create_game_object("A").unwrap();
        let b = scene.create_game_object("B").unwrap();
        let c = scene.create_game_object("C").unwrap();
        scene.attach_child(a, b).unwrap();
        scene.attach_child(b, c).unwrap();

        assert!(matches!(scene.attach_child(c, a), Err(SceneError::CycleDetected { .. })));
        assert!(matches!(scene.attach_child(a, a), Err(SceneError::CycleDetected { .. })));

        assert_eq!(scene.get(a).unwrap().parent(), None);
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));
        assert_eq!(scene.get(c).unwrap().parent(), Some(b));
        assert_eq!(scene.get(c).unwrap().children(), &[] as &[ObjectId]);
        assert!(scene.is_ancestor(a, c));
    }

    #[test]
    fn test_reparent_moves_child() {
        let mut scene = Scene::new();
        let a = scene.create_game_object("A").unwrap();
        let b = scene.create_game_object("B").unwrap();
        let child = scene.create_game_object("Child").unwrap();

        scene.attach_child(a, child).unwrap();
        scene.attach_child(b, child).unwrap();
        assert!(scene.get(a).unwrap().children().is_empty());
        assert_eq!(scene.get(b).unwrap().children(), &[child]);

        scene.detach(child).unwrap();
        assert!(scene.get(b).unwrap().children().is_empty());
        assert_eq!(scene.roots().count(), 4);
    }

    #[test]
    fn test_world_transform_composes_parents() {
        let mut scene = Scene::new();
        let parent = scene.create_game_object("Parent").unwrap();
        let child = scene.create_game_object("Child").unwrap();
        scene
            .get_mut(parent)
            .unwrap()
            .set_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0)));
        scene.get_mut(child).unwrap().set_position(Vec3::new(0.0, 2.0, 0.0));
        scene.attach_child(parent, child).unwrap();

        let world = scene.world_transform(child).unwrap();
        assert_relative_eq!(world.m14, 1.0);
        assert_relative_eq!(world.m24, 2.0);
    }

    #[test]
    fn test_lut_slots() {
        let mut scene = Scene::new();
        assert!(matches!(scene.set_color_lut(0, &lut("a.cube")), Err(SceneError::InvalidLutSlot(0))));
        assert!(matches!(scene.set_color_lut(4, &lut("a.cube")), Err(SceneError::InvalidLutSlot(4))));

        scene.set_color_lut(1, &lut("cool.cube")).unwrap();
        scene.set_color_lut(3, &lut("warm.cube")).unwrap();
        let slots: Vec<usize> = scene.color_luts().map(|(slot, _)| slot).collect();
        assert_eq!(slots, vec![1, 3]);
        assert!(scene.color_lut(2).is_none());
    }

    #[test]
    fn test_light_limit() {
        let mut scene = Scene::with_max_lights(1);
        scene.add_light(Light::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0))).unwrap();
        assert!(matches!(
            scene.add_light(Light::new(Vec3::zeros(), Vec3::zeros())),
            Err(SceneError::TooManyLights(1))
        ));
    }

    #[test]
    fn test_update_rotates_and_emits() {
        let mut scene = Scene::new();
        let spinner = scene.create_game_object("Spinner").unwrap();
        scene
            .add_component(spinner, RotatingBehaviour { rotation_speed: Vec3::new(0.0, 0.0, 90.0) })
            .unwrap();
        let mut particles = ParticleSystem::default();
        particles.add_emitter(ParticleEmitter::new(Vec3::zeros(), Vec3::y(), 2.0, Vec4::new(1.0, 1.0, 1.0, 1.0)));
        scene.add_component(spinner, particles).unwrap();

        assert_eq!(scene.update(1.0), 2);
        assert_eq!(scene.update(3.0), 6);
        let rotation = scene.get(spinner).unwrap().transform().rotation;
        assert_relative_eq!(rotation.z, 0.0, epsilon = 1e-4);
    }
}
