//! Scenario tests for declarative scene builds over an in-memory store


use crate::assets::{AssetRegistry, CachedAssetRegistry, MemoryStore};
use std::sync::Arc;

const LIT_VERTEX: &str = "
#version 450
uniform mat4 u_ModelViewProjection;
uniform mat4 u_Model;
";

const LIT_FRAGMENT: &str = "
#version 450
struct Material {
    sampler2D Diffuse;
    float     Shininess;
};
uniform Material u_Material;
";

/// Store with the files the scenarios reference
fn store() -> MemoryStore {
    MemoryStore::new()
        .with_file("cube.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
        .with_file("plane.obj", "v 0 0 0\n")
        .with_file("a.png", vec![0x89, b'P', b'N', b'G'])
        .with_file("red.png", vec![0x89, b'P', b'N', b'G'])
        .with_file("shaders/lit_vert.glsl", LIT_VERTEX)
        .with_file("shaders/lit_frag.glsl", LIT_FRAGMENT)
}

/// Fresh registry with nothing cached
fn cold_registry() -> Arc<dyn AssetRegistry> {
    Arc::new(CachedAssetRegistry::new(store()))
}
