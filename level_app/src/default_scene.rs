//! Tile level layer
//!
//! Seven textured floor tiles sharing one toon-shaded material setup, an
//! ocean skybox, three color grading LUTs and a small particle fountain.

use scene_engine::assets::{MagFilter, MinFilter, ParamValue, WrapMode};
use scene_engine::builder::{BuildError, SceneBuilder};
use scene_engine::foundation::math::{Transform, Vec3, Vec4};
use scene_engine::scene::{
    ComponentData, Light, ParticleEmitter, ParticleSystem, RenderComponent, SimpleCameraControl,
};
use scene_engine::{AppError, Application, ApplicationLayer, SceneHost};

/// Material name and source file stem of each tile
const TILES: [(&str, &str); 7] = [
    ("THR1", "THR0001F"),
    ("THR2", "THR0002F"),
    ("THR3", "THR0003F"),
    ("THR4", "THR0004F"),
    ("THF1", "THR1301F"),
    ("THF2", "THR1401F"),
    ("THF3", "THR1801F"),
];

const COLOR_LUTS: [&str; 3] = ["luts/cool.cube", "luts/warmo.cube", "luts/Custom.cube"];

const UI_SPRITE: &str = "textures/ui-sprite.png";

const EMIT_RATE: f32 = 10.0;

/// (position, velocity) of each fountain emitter
const EMITTERS: [([f32; 3], [f32; 3]); 5] = [
    ([0.01, 0.0, 4.0], [-0.01, 1.0, -0.5]),
    ([-0.1, 0.0, 4.0], [0.1, 1.0, -0.5]),
    ([0.1, 0.0, 4.0], [-0.1, 1.0, -0.5]),
    ([-0.5, 0.0, 4.0], [0.5, 1.0, -0.5]),
    ([0.5, 0.0, 4.0], [-0.5, 1.0, -0.5]),
];

/// Builds the tile level, or reloads it when a saved copy is requested
pub struct DefaultSceneLayer {
    name: String,
}

impl DefaultSceneLayer {
    pub fn new() -> Self {
        Self {
            name: "Default Scene".to_string(),
        }
    }
}

impl Default for DefaultSceneLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationLayer for DefaultSceneLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_app_load(&mut self, app: &mut Application) -> Result<(), AppError> {
        if app.saved_scene_available() {
            let path = app.config().scene.scene_path.clone();
            log::info!("Loading saved scene from {}", path.display());
            app.load_scene_file(&path)
        } else {
            app.build_scene(author_level)
        }
    }
}

/// Author the tile level
pub fn author_level(builder: &mut SceneBuilder) -> Result<(), BuildError> {
    let basic_shader = builder.shader(
        "shaders/vertex_shaders/basic.glsl",
        "shaders/fragment_shaders/frag_blinn_phong_textured.glsl",
    )?;

    // Default sprite for overlay widgets, listed so reloads keep it resident
    builder.texture_2d(UI_SPRITE)?;

    let toon_lut = builder.texture_1d("luts/toon-1D.png")?;
    toon_lut.set_wrap(WrapMode::ClampToEdge);

    // Y-up cubemap, rotated into the level's Z-up frame
    let ocean = builder.texture_cube("cubemaps/ocean/ocean.jpg")?;
    let skybox_shader = builder.shader(
        "shaders/vertex_shaders/skybox_vert.glsl",
        "shaders/fragment_shaders/skybox_frag.glsl",
    )?;
    builder.set_skybox(&ocean, &skybox_shader, Vec3::new(90.0, 0.0, 0.0))?;

    for (slot, path) in COLOR_LUTS.iter().enumerate() {
        let lut = builder.texture_3d(path)?;
        builder.set_color_lut(slot + 1, &lut)?;
    }

    for (name, stem) in TILES {
        let mesh = builder.mesh(&format!("{stem}.obj"))?;
        let texture = builder.texture_2d(&format!("textures/{stem}.png"))?;
        texture
            .set_min_filter(MinFilter::Nearest)
            .set_mag_filter(MagFilter::Nearest);

        let material = builder.define_material(
            name,
            &basic_shader,
            [
                ("u_Material.Diffuse", ParamValue::from(&texture)),
                ("u_Material.Shininess", ParamValue::Float(0.0)),
                ("u_Material.toonTex", ParamValue::from(&toon_lut)),
            ],
        )?;

        builder.create_object(
            &format!("{name}Object"),
            Transform::identity().with_rotation(Vec3::new(90.0, 0.0, 0.0)),
            [ComponentData::from(RenderComponent::new(&mesh, &material))],
        )?;
    }

    builder.add_light(Light::new(Vec3::new(0.0, 1.0, 3.0), Vec3::new(1.0, 1.0, 1.0)).with_range(100.0))?;
    builder.add_light(Light::new(Vec3::new(1.0, 0.0, 3.0), Vec3::new(0.2, 0.8, 0.1)))?;
    builder.add_light(Light::new(Vec3::new(0.0, 1.0, 3.0), Vec3::new(1.0, 0.2, 0.1)))?;

    let camera = builder.main_camera();
    builder.object_mut(camera)?.set_transform(
        Transform::from_position(Vec3::new(0.0, 0.0, 0.23)).with_rotation(Vec3::new(75.0, 0.0, 0.0)),
    );
    builder.add_component(camera, SimpleCameraControl::default())?;

    let mut fountain = ParticleSystem::default();
    let color = Vec4::new(0.5608, 0.4706, 0.5323, 1.0);
    for (position, velocity) in EMITTERS {
        fountain.add_emitter(ParticleEmitter::new(
            Vec3::from(position),
            Vec3::from(velocity),
            EMIT_RATE,
            color,
        ));
    }
    builder.create_object("Particles", Transform::identity(), [ComponentData::from(fountain)])?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_engine::assets::{AssetKey, AssetType, CachedAssetRegistry, MemoryStore};
    use scene_engine::core::config::{ApplicationConfig, SceneConfig};
    use scene_engine::scene::Scene;
    use std::path::Path;
    use std::sync::Arc;

    const BASIC_FRAGMENT: &str = "
struct Material {
    sampler2D Diffuse;
    float     Shininess;
    sampler1D toonTex;
};
uniform Material u_Material;
";

    fn level_store() -> MemoryStore {
        let mut store = MemoryStore::new()
            .with_file("shaders/vertex_shaders/basic.glsl", "uniform mat4 u_Model;")
            .with_file("shaders/fragment_shaders/frag_blinn_phong_textured.glsl", BASIC_FRAGMENT)
            .with_file("shaders/vertex_shaders/skybox_vert.glsl", "uniform mat4 u_View;")
            .with_file("shaders/fragment_shaders/skybox_frag.glsl", "uniform samplerCube s_Environment;")
            .with_file(UI_SPRITE, vec![0u8])
            .with_file("luts/toon-1D.png", vec![0u8])
            .with_file("cubemaps/ocean/ocean.jpg", vec![0u8]);
        for path in COLOR_LUTS {
            store = store.with_file(path, "LUT_3D_SIZE 2");
        }
        for (_, stem) in TILES {
            store = store
                .with_file(&format!("{stem}.obj"), "v 0 0 0")
                .with_file(&format!("textures/{stem}.png"), vec![0u8]);
        }
        store
    }

    fn level_app(dir: &Path, load_saved: bool) -> Application {
        let mut config = ApplicationConfig::default();
        config.scene = SceneConfig::new()
            .with_paths(dir.join("scene-manifest.ron"), dir.join("scene.ron"))
            .with_load_saved_scene(load_saved);
        let mut app = Application::new(config, Arc::new(CachedAssetRegistry::new(level_store())));
        app.add_layer(DefaultSceneLayer::new());
        app
    }

    #[test]
    fn test_level_contents() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = level_app(dir.path(), false);
        app.load().unwrap();

        let scene = app.scene().unwrap();
        assert_eq!(scene.object_count(), TILES.len() + 2);
        assert_eq!(scene.lights().len(), 3);
        assert!(scene.skybox().is_some());
        assert_eq!(scene.color_luts().count(), 3);

        let manifest = app.manifest().unwrap();
        assert_eq!(manifest.entries_of(AssetType::Mesh).count(), TILES.len());
        assert_eq!(manifest.entries_of(AssetType::Texture2D).count(), TILES.len() + 1);
        assert!(manifest.contains(&AssetKey::new(AssetType::Texture2D, &UI_SPRITE.into())));
        assert_eq!(manifest.entries_of(AssetType::Shader).count(), 2);
        assert_eq!(manifest.materials.len(), TILES.len());
    }

    #[test]
    fn test_camera_is_controllable() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = level_app(dir.path(), false);
        app.load().unwrap();

        let scene = app.scene().unwrap();
        assert!(scene.component::<SimpleCameraControl>(scene.main_camera()).is_some());
    }

    #[test]
    fn test_saved_level_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut built = level_app(dir.path(), true);
        built.load().unwrap();
        let expected = built.scene().map(Scene::to_document).unwrap();

        let mut reloaded = level_app(dir.path(), true);
        reloaded.load().unwrap();
        assert_eq!(reloaded.scene().map(Scene::to_document).unwrap(), expected);
    }
}
