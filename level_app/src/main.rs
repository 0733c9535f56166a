//! Tile level demo
//!
//! Builds the tile level from `resources/`, writes its manifest and scene
//! files, and steps the scene for a few frames. Set `load_saved_scene` in
//! `level.toml` to reload the saved files instead of rebuilding.

mod default_scene;

use default_scene::DefaultSceneLayer;
use scene_engine::config::ConfigError;
use scene_engine::core::config::{ApplicationConfig, Config};
use scene_engine::foundation::logging;
use scene_engine::{AppError, Application};
use thiserror::Error;

const CONFIG_PATH: &str = "level.toml";
const FRAME_TIME: f32 = 1.0 / 60.0;
const WARMUP_FRAMES: usize = 60;

#[derive(Error, Debug)]
enum LaunchError {
    #[error("Failed to read level.toml: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    App(#[from] AppError),
}

fn run() -> Result<(), LaunchError> {
    let config = ApplicationConfig::load_or_default(CONFIG_PATH)?;
    config.validate()?;
    logging::init_with_level(&config.engine.log_level);

    log::info!("Starting tile level demo");
    let mut app = Application::with_file_store(config);
    app.add_layer(DefaultSceneLayer::new());
    app.load()?;

    for _ in 0..WARMUP_FRAMES {
        app.update(FRAME_TIME);
    }

    if let Some(scene) = app.scene() {
        log::info!(
            "Scene ready: {} objects, {} lights, {} assets in registry",
            scene.object_count(),
            scene.lights().len(),
            app.registry().len()
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match run() {
        Ok(()) => {
            log::info!("Tile level demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Tile level demo failed: {}", e);
            Err(e.into())
        }
    }
}
