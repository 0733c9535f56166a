//! Component kinds attachable to game objects
//!
//! The set of kinds is closed. Each kind declares the capabilities the
//! runtime dispatches on (update ticks, rendering, trigger callbacks,
//! physics registration), and a game object holds at most one of each kind.

use crate::assets::handle::AssetRef;
use crate::assets::materials::MaterialRef;
use crate::assets::registry::AssetRegistry;
use crate::assets::resolver::{AssetResolver, ResolveError};
use crate::foundation::math::{Vec2, Vec3, Vec4};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Runtime hooks a component kind participates in
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Ticked by `Scene::update`
        const UPDATE = 1 << 0;
        /// Drawn by the renderer
        const RENDER = 1 << 1;
        /// Notified when a body enters a trigger
        const TRIGGER_ENTER = 1 << 2;
        /// Notified when a body leaves a trigger
        const TRIGGER_EXIT = 1 << 3;
        /// Registered with the physics world
        const PHYSICS = 1 << 4;
    }
}

bitflags! {
    /// Body types a trigger volume reacts to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TriggerTypeFlags: u8 {
        /// Static bodies
        const STATICS = 1 << 0;
        /// Kinematic bodies
        const KINEMATICS = 1 << 1;
        /// Dynamic bodies
        const DYNAMICS = 1 << 2;
    }
}

impl Default for TriggerTypeFlags {
    fn default() -> Self {
        Self::DYNAMICS
    }
}

/// Perspective or orthographic view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Use an orthographic projection
    pub orthographic: bool,
    /// Vertical extent of the orthographic view
    pub ortho_size: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.01,
            far: 1000.0,
            orthographic: false,
            ortho_size: 10.0,
        }
    }
}

/// Fly-camera input mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleCameraControl {
    /// Degrees of rotation per pixel of mouse motion
    pub mouse_sensitivity: Vec2,
    /// Units per second along each local axis
    pub move_speed: Vec3,
    /// Speed factor while shift is held
    pub shift_multiplier: f32,
}

impl Default for SimpleCameraControl {
    fn default() -> Self {
        Self {
            mouse_sensitivity: Vec2::new(0.5, 0.3),
            move_speed: Vec3::new(1.0, 1.0, 1.0),
            shift_multiplier: 2.0,
        }
    }
}

/// Mesh and material drawn at the object's transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderComponent {
    /// Mesh asset
    pub mesh: Option<AssetRef>,
    /// Shared material
    pub material: Option<MaterialRef>,
    /// Whether the object is drawn
    pub visible: bool,
}

impl RenderComponent {
    /// Render a mesh with a material
    pub fn new(mesh: impl Into<AssetRef>, material: impl Into<MaterialRef>) -> Self {
        Self {
            mesh: Some(mesh.into()),
            material: Some(material.into()),
            visible: true,
        }
    }
}

impl Default for RenderComponent {
    fn default() -> Self {
        Self {
            mesh: None,
            material: None,
            visible: true,
        }
    }
}

/// Constant spin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotatingBehaviour {
    /// Degrees per second around each axis
    pub rotation_speed: Vec3,
}

/// Jump on input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpBehaviour {
    /// Upward impulse applied to the rigid body
    pub impulse: f32,
}

impl Default for JumpBehaviour {
    fn default() -> Self {
        Self { impulse: 10.0 }
    }
}

/// Swap the render material while something is inside a trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSwapBehaviour {
    /// Material applied on enter
    pub enter_material: Option<MaterialRef>,
    /// Material applied on exit
    pub exit_material: Option<MaterialRef>,
}

/// Logs trigger entries and exits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerVolumeEnterBehaviour;

/// Collision shape in the owning object's local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Axis-aligned box
    Box {
        /// Half size along each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Radius
        radius: f32,
    },
    /// Infinite plane
    Plane {
        /// Plane normal
        normal: Vec3,
    },
    /// Cylinder along the local Y axis
    Cylinder {
        /// Radius
        radius: f32,
        /// Full height
        height: f32,
    },
    /// Convex hull of a mesh asset
    ConvexMesh {
        /// Hull source
        mesh: AssetRef,
    },
}

/// Positioned collision shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Shape
    pub shape: ColliderShape,
    /// Offset from the object origin
    pub position: Vec3,
    /// Euler rotation in degrees
    pub rotation: Vec3,
}

impl Collider {
    /// Shape at the object origin
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
        }
    }

    /// Box collider
    pub fn cube(half_extents: Vec3) -> Self {
        Self::new(ColliderShape::Box { half_extents })
    }

    /// Sphere collider
    pub fn sphere(radius: f32) -> Self {
        Self::new(ColliderShape::Sphere { radius })
    }

    /// Plane collider
    pub fn plane(normal: Vec3) -> Self {
        Self::new(ColliderShape::Plane { normal })
    }

    /// Offset the collider
    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Rotate the collider
    #[must_use]
    pub fn with_rotation(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }
}

/// How the physics world moves a body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RigidBodyType {
    /// Never moves
    #[default]
    Static,
    /// Moved by its transform
    Kinematic,
    /// Simulated
    Dynamic,
}

/// Physics body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    /// Body type
    pub body_type: RigidBodyType,
    /// Mass in kilograms, ignored for static bodies
    pub mass: f32,
    /// Attached shapes
    pub colliders: Vec<Collider>,
}

impl RigidBody {
    /// Body without colliders
    pub fn new(body_type: RigidBodyType) -> Self {
        Self {
            body_type,
            mass: 1.0,
            colliders: Vec::new(),
        }
    }

    /// Attach a collider
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(RigidBodyType::Static)
    }
}

/// Non-solid region reporting overlaps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriggerVolume {
    /// Body types that fire the trigger
    pub flags: TriggerTypeFlags,
    /// Region shapes
    pub colliders: Vec<Collider>,
}

impl TriggerVolume {
    /// Attach a collider
    #[must_use]
    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.colliders.push(collider);
        self
    }
}

/// Point source of particles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitter {
    /// Spawn position relative to the owner
    pub position: Vec3,
    /// Initial particle velocity
    pub velocity: Vec3,
    /// Particles per second
    pub emit_rate: f32,
    /// RGBA particle color
    pub color: Vec4,
    #[serde(skip)]
    pending: f32,
    #[serde(skip)]
    emitted: u64,
}

impl ParticleEmitter {
    /// Create an emitter
    pub fn new(position: Vec3, velocity: Vec3, emit_rate: f32, color: Vec4) -> Self {
        Self {
            position,
            velocity,
            emit_rate,
            color,
            pending: 0.0,
            emitted: 0,
        }
    }

    /// Particles spawned so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Advance the emission clock, returning how many particles spawn
    pub fn advance(&mut self, dt: f32) -> u64 {
        self.pending += self.emit_rate.max(0.0) * dt.max(0.0);
        let whole = self.pending.floor();
        self.pending -= whole;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let spawned = whole as u64;
        self.emitted += spawned;
        spawned
    }
}

/// Collection of emitters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleSystem {
    /// Emitters, in authoring order
    pub emitters: Vec<ParticleEmitter>,
}

impl ParticleSystem {
    /// Add an emitter
    pub fn add_emitter(&mut self, emitter: ParticleEmitter) -> &mut Self {
        self.emitters.push(emitter);
        self
    }

    /// Advance every emitter
    pub fn advance(&mut self, dt: f32) -> u64 {
        self.emitters.iter_mut().map(|e| e.advance(dt)).sum()
    }
}

/// Typed access to one component kind
pub trait Component: Into<ComponentData> {
    /// Kind tag
    const KIND: ComponentKind;

    /// Borrow the component out of type-erased data
    fn from_data(data: &ComponentData) -> Option<&Self>;

    /// Mutably borrow the component out of type-erased data
    fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self>;
}

macro_rules! component_kinds {
    ($($(#[$meta:meta])* $kind:ident($ty:ty) => $caps:expr;)+) => {
        /// Tag identifying a component kind
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ComponentKind {
            $($(#[$meta])* $kind,)+
        }

        impl ComponentKind {
            /// Every kind, in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$kind,)+];

            /// Hooks this kind participates in
            pub fn capabilities(self) -> Capabilities {
                match self {
                    $(Self::$kind => $caps,)+
                }
            }

            /// Kind name
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$kind => stringify!($kind),)+
                }
            }
        }

        /// Component value of any kind
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum ComponentData {
            $($(#[$meta])* $kind($ty),)+
        }

        impl ComponentData {
            /// Kind tag of the contained component
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(Self::$kind(_) => ComponentKind::$kind,)+
                }
            }
        }

        $(
            impl From<$ty> for ComponentData {
                fn from(component: $ty) -> Self {
                    Self::$kind(component)
                }
            }

            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn from_data(data: &ComponentData) -> Option<&Self> {
                    match data {
                        ComponentData::$kind(component) => Some(component),
                        _ => None,
                    }
                }

                fn from_data_mut(data: &mut ComponentData) -> Option<&mut Self> {
                    match data {
                        ComponentData::$kind(component) => Some(component),
                        _ => None,
                    }
                }
            }
        )+
    };
}

component_kinds! {
    /// Camera
    Camera(Camera) => Capabilities::empty();
    /// Fly-camera controls
    SimpleCameraControl(SimpleCameraControl) => Capabilities::UPDATE;
    /// Mesh renderer
    Render(RenderComponent) => Capabilities::RENDER;
    /// Constant spin
    RotatingBehaviour(RotatingBehaviour) => Capabilities::UPDATE;
    /// Jump on input
    JumpBehaviour(JumpBehaviour) => Capabilities::UPDATE;
    /// Material swap on trigger
    MaterialSwapBehaviour(MaterialSwapBehaviour) => Capabilities::TRIGGER_ENTER.union(Capabilities::TRIGGER_EXIT);
    /// Trigger logging
    TriggerVolumeEnterBehaviour(TriggerVolumeEnterBehaviour) => Capabilities::TRIGGER_ENTER.union(Capabilities::TRIGGER_EXIT);
    /// Physics body
    RigidBody(RigidBody) => Capabilities::PHYSICS.union(Capabilities::UPDATE);
    /// Trigger region
    TriggerVolume(TriggerVolume) => Capabilities::PHYSICS;
    /// Particle emitters
    ParticleSystem(ParticleSystem) => Capabilities::UPDATE.union(Capabilities::RENDER);
}

impl ComponentData {
    /// Hooks the contained component participates in
    pub fn capabilities(&self) -> Capabilities {
        self.kind().capabilities()
    }

    /// Attach live handles to every asset and material reference
    pub fn resolve<R: AssetRegistry + ?Sized>(
        &mut self,
        resolver: &mut AssetResolver<'_, R>,
    ) -> Result<(), ResolveError> {
        match self {
            Self::Render(render) => {
                if let Some(mesh) = &mut render.mesh {
                    mesh.resolve(resolver)?;
                }
                if let Some(material) = &mut render.material {
                    material.resolve(resolver)?;
                }
            }
            Self::MaterialSwapBehaviour(swap) => {
                for material in [&mut swap.enter_material, &mut swap.exit_material]
                    .into_iter()
                    .flatten()
                {
                    material.resolve(resolver)?;
                }
            }
            Self::RigidBody(RigidBody { colliders, .. }) | Self::TriggerVolume(TriggerVolume { colliders, .. }) => {
                for collider in colliders {
                    if let ColliderShape::ConvexMesh { mesh } = &mut collider.shape {
                        mesh.resolve(resolver)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Every asset reference held directly or through colliders
    pub fn asset_refs(&self) -> Vec<&AssetRef> {
        match self {
            Self::Render(render) => render.mesh.iter().collect(),
            Self::RigidBody(RigidBody { colliders, .. }) | Self::TriggerVolume(TriggerVolume { colliders, .. }) => colliders
                .iter()
                .filter_map(|collider| match &collider.shape {
                    ColliderShape::ConvexMesh { mesh } => Some(mesh),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Every material reference
    pub fn material_refs(&self) -> Vec<&MaterialRef> {
        match self {
            Self::Render(render) => render.material.iter().collect(),
            Self::MaterialSwapBehaviour(swap) => swap
                .enter_material
                .iter()
                .chain(swap.exit_material.iter())
                .collect(),
            _ => Vec::new(),
        }
    }
}
