//! Scene graph of game objects, lights and environment settings
//!
//! ## Architecture
//!
//! ```text
//! SceneBuilder (authoring)
//!      ↓
//! Scene (object graph, lights, skybox, LUTs)
//!      ↓
//! SceneDocument (persistence, keys only)
//! ```
//!
//! Game objects live in a slot map owned by the scene and are addressed by
//! [`ObjectId`]. Parent/child links are ids, never references, so the graph
//! can be edited freely and checked for cycles before any link changes.

pub mod components;
mod game_object;
mod lighting;
mod persistence;
mod scene_graph;

pub use components::{
    Camera, Capabilities, Collider, ColliderShape, Component, ComponentData, ComponentKind,
    JumpBehaviour, MaterialSwapBehaviour, ParticleEmitter, ParticleSystem, RenderComponent,
    RigidBody, RigidBodyType, RotatingBehaviour, SimpleCameraControl, TriggerTypeFlags,
    TriggerVolume, TriggerVolumeEnterBehaviour,
};
pub use game_object::GameObject;
pub use lighting::{Light, Skybox};
pub use persistence::{ObjectRecord, SceneDocument};
pub use scene_graph::{Scene, COLOR_LUT_SLOTS, DEFAULT_MAX_LIGHTS, MAIN_CAMERA_NAME};

pub use crate::foundation::collections::ObjectId;

use crate::assets::resolver::ResolveError;
use crate::config::ConfigError;
use thiserror::Error;

/// Scene graph errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Object name already used in this scene
    #[error("Duplicate object name: {0}")]
    DuplicateName(String),

    /// Link would make a node its own ancestor
    #[error("Attaching {child} under {parent} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: String,
        /// Requested child
        child: String,
    },

    /// Id or name does not refer to an object of this scene
    #[error("Unknown object: {0}")]
    UnknownObject(String),

    /// Object already has a component of this kind
    #[error("Object {object} already has a {kind:?} component")]
    DuplicateComponent {
        /// Object name
        object: String,
        /// Rejected kind
        kind: ComponentKind,
    },

    /// Color LUT slot outside 1..=3
    #[error("Invalid color LUT slot {0}, expected 1..=3")]
    InvalidLutSlot(usize),

    /// Light limit reached
    #[error("Scene already holds the maximum of {0} lights")]
    TooManyLights(usize),

    /// Saved reference could not be matched to a loaded asset or material
    #[error("Unresolved reference: {0}")]
    UnresolvedReference(#[from] ResolveError),

    /// Reading or writing the scene document failed
    #[error("Scene persistence error: {0}")]
    Persistence(#[from] ConfigError),
}
