//! # Core Engine Module
//!
//! Shared abstractions used throughout the engine.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for engine, assets and scene output
//! - **Foundation**: Low-level utilities (math, collections, logging)
//! - **Assets**: Asset registry, materials and manifests

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::assets;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    AssetConfig,
    EngineConfig,
    SceneConfig,
    Config,
    ConfigError,
};
