//! # Scene Engine
//!
//! Declarative scene construction over a shared, deduplicating asset registry.
//!
//! ## Features
//!
//! - **Asset Registry**: one shared handle per `(type, path)`, safe across threads
//! - **Materials**: shader parameters checked against what the shader declares
//! - **Scene Graph**: named game objects, one component per kind, cycle-free hierarchy
//! - **Manifests**: every asset a scene needs, saved to reload it without rebuilding
//! - **Application Host**: layers that build or load the active scene
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Level;
//!
//! impl ApplicationLayer for Level {
//!     fn name(&self) -> &str {
//!         "Level"
//!     }
//!
//!     fn on_app_load(&mut self, app: &mut Application) -> Result<(), AppError> {
//!         app.build_scene(|builder| {
//!             let cube = builder.mesh("cube.obj")?;
//!             let shader = builder.shader("lit_vert.glsl", "lit_frag.glsl")?;
//!             let material = builder.define_material("Plain", &shader, Vec::<(&str, ParamValue)>::new())?;
//!             builder.create_object(
//!                 "Box",
//!                 Transform::identity(),
//!                 [ComponentData::from(RenderComponent::new(&cube, &material))],
//!             )?;
//!             Ok(())
//!         })
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut app = Application::with_file_store(ApplicationConfig::default());
//!     app.add_layer(Level);
//!     app.load()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;

// Scene construction
pub mod assets;
pub mod scene;
pub mod builder;

mod application;

pub use application::{AppError, Application, ApplicationLayer, SceneHost};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application, ApplicationLayer, SceneHost,
        assets::{
            AssetHandle, AssetRegistry, AssetType, CachedAssetRegistry, MagFilter, Manifest,
            Material, MinFilter, ParamValue, WrapMode,
        },
        builder::{BuildError, SceneBuilder},
        config::Config,
        core::config::ApplicationConfig,
        foundation::math::{Transform, Vec3, Vec4},
        scene::{ComponentData, Light, ObjectId, RenderComponent, Scene},
    };
}
