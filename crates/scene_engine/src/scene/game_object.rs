//! Scene nodes

use super::components::{Capabilities, Component, ComponentData, ComponentKind};
use super::SceneError;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::{Transform, Vec3};
use std::collections::BTreeMap;

/// Named node with a transform and at most one component per kind
///
/// Hierarchy links are maintained by the owning [`Scene`](super::Scene);
/// a game object only reports them.
#[derive(Debug, Clone)]
pub struct GameObject {
    name: String,
    transform: Transform,
    pub(super) parent: Option<ObjectId>,
    pub(super) children: Vec<ObjectId>,
    components: BTreeMap<ComponentKind, ComponentData>,
}

impl GameObject {
    pub(super) fn new(name: String) -> Self {
        Self {
            name,
            transform: Transform::identity(),
            parent: None,
            children: Vec::new(),
            components: BTreeMap::new(),
        }
    }

    /// Unique name within the scene
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable local transform
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Replace the local transform
    pub fn set_transform(&mut self, transform: Transform) -> &mut Self {
        self.transform = transform;
        self
    }

    /// Set local position
    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.transform.position = position;
        self
    }

    /// Set local rotation as Euler angles in degrees
    pub fn set_rotation(&mut self, degrees: Vec3) -> &mut Self {
        self.transform.rotation = degrees;
        self
    }

    /// Set local scale
    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.transform.scale = scale;
        self
    }

    /// Parent, if attached
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// Children in attachment order
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    /// Attach a typed component
    pub fn add<C: Component>(&mut self, component: C) -> Result<&mut Self, SceneError> {
        self.add_data(component.into())
    }

    /// Attach a component of any kind
    pub fn add_data(&mut self, component: ComponentData) -> Result<&mut Self, SceneError> {
        let kind = component.kind();
        if self.components.contains_key(&kind) {
            return Err(SceneError::DuplicateComponent {
                object: self.name.clone(),
                kind,
            });
        }
        self.components.insert(kind, component);
        Ok(self)
    }

    /// Typed component
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.components.get(&C::KIND).and_then(C::from_data)
    }

    /// Mutable typed component
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut(&C::KIND).and_then(C::from_data_mut)
    }

    /// Whether a component of the type is attached
    pub fn has<C: Component>(&self) -> bool {
        self.has_kind(C::KIND)
    }

    /// Whether a component of the kind is attached
    pub fn has_kind(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Detach a component
    pub fn remove(&mut self, kind: ComponentKind) -> Option<ComponentData> {
        self.components.remove(&kind)
    }

    /// Components ordered by kind
    pub fn components(&self) -> impl Iterator<Item = &ComponentData> {
        self.components.values()
    }

    pub(super) fn components_mut(&mut self) -> impl Iterator<Item = &mut ComponentData> {
        self.components.values_mut()
    }

    /// Whether any attached component participates in every given hook
    pub fn has_capability(&self, capabilities: Capabilities) -> bool {
        self.components
            .keys()
            .any(|kind| kind.capabilities().contains(capabilities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::scene::components::{Camera, JumpBehaviour, RotatingBehaviour};

    #[test]
    fn test_one_component_per_kind() {
        let mut object = GameObject::new("Monkey".to_string());
        object.add(JumpBehaviour::default()).unwrap().add(Camera::default()).unwrap();

        let result = object.add(JumpBehaviour { impulse: 2.0 });
        assert!(matches!(
            result,
            Err(SceneError::DuplicateComponent { kind: ComponentKind::JumpBehaviour, .. })
        ));
        assert_relative_eq!(object.get::<JumpBehaviour>().unwrap().impulse, 10.0);
        assert_eq!(object.components().count(), 2);
    }

    #[test]
    fn test_capability_query() {
        let mut object = GameObject::new("Spinner".to_string());
        assert!(!object.has_capability(Capabilities::UPDATE));
        object.add(RotatingBehaviour::default()).unwrap();
        assert!(object.has_capability(Capabilities::UPDATE));
        assert!(!object.has_capability(Capabilities::RENDER));

        assert!(object.remove(ComponentKind::RotatingBehaviour).is_some());
        assert!(!object.has::<RotatingBehaviour>());
    }
}
