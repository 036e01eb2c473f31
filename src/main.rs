//! Touch Model Viewer
//!
//! Opens a window, loads the configured GLB/glTF model and lets you inspect it:
//! - Drag to rotate, two fingers to pan/pinch/twist (mouse wheel zooms)
//! - Tap a part to highlight it
//! - R resets the view, Escape quits
//!
//! Usage: touch-model-viewer [config.ron]

use std::path::Path;

use macroquad::prelude::*;
use touch_model_viewer::input::{poll_contacts, TouchTracker};
use touch_model_viewer::render::{Lighting, MacroquadRenderer};
use touch_model_viewer::{ConfigError, ModelAsset, ModelViewer, ViewerConfig, VERSION};

const DEFAULT_CONFIG_PATH: &str = "viewer.ron";

/// Zoom step per mouse wheel notch
const WHEEL_ZOOM_STEP: f32 = 1.1;

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Touch Model Viewer v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_config() -> ViewerConfig {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    match ViewerConfig::load(Path::new(&path)) {
        Ok(config) => {
            log::info!("Loaded config from {}", path);
            config
        }
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No config at {}, using defaults", path);
            ViewerConfig::default()
        }
        Err(e) => {
            log::warn!("Ignoring config {}: {}", path, e);
            ViewerConfig::default()
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config();

    // Touches are handled directly; don't let them double as mouse clicks
    simulate_mouse_with_touch(false);

    let bg = config.background();
    let background = Color::new(bg.r, bg.g, bg.b, 1.0);
    let renderer = MacroquadRenderer::new(bg, Lighting::new(config.light(), config.light_intensity));
    let asset = ModelAsset::new(config.model.clone());

    let mut viewer = ModelViewer::new(config, Box::new(renderer));
    viewer.on_model_loaded(|names| log::info!("Meshes: {}", names.join(", ")));
    viewer.on_mesh_clicked(|name| log::info!("Clicked: {}", name));

    // Show the background while the model loads
    clear_background(background);
    next_frame().await;
    viewer.complete_load(asset.fetch().await);

    let mut tracker = TouchTracker::new();
    loop {
        viewer.set_viewport(screen_width(), screen_height());

        let now_ms = get_time() * 1000.0;
        for event in tracker.update(&poll_contacts(), now_ms) {
            viewer.handle_touch(&event);
        }

        let (_, wheel) = mouse_wheel();
        if wheel > 0.0 {
            viewer.zoom(viewer.current_zoom() * WHEEL_ZOOM_STEP);
        } else if wheel < 0.0 {
            viewer.zoom(viewer.current_zoom() / WHEEL_ZOOM_STEP);
        }

        if is_key_pressed(KeyCode::R) {
            viewer.reset_view();
        }
        if is_key_pressed(KeyCode::Escape) {
            viewer.unmount();
            break;
        }

        if !viewer.frame() {
            clear_background(background);
        }
        next_frame().await;
    }
}
