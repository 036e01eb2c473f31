//! Touch Model Viewer: a touch-driven GLB/glTF model viewer
//!
//! - One finger rotates the model
//! - Two fingers pan, pinch-zoom and twist
//! - A quick tap selects the mesh under the finger and highlights it
//!
//! Everything except `render`, `input::poll_contacts` and
//! `ModelAsset::fetch` is plain state and math, usable without a window.

pub mod camera;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod highlight;
pub mod input;
pub mod loader;
pub mod math;
pub mod picking;
pub mod ray;
pub mod render;
pub mod render_loop;
pub mod scene;
pub mod viewer;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::ViewerConfig;
pub use error::{ConfigError, LoadError};
pub use gesture::{GestureEffect, TouchEvent};
pub use loader::ModelAsset;
pub use viewer::{ModelViewer, ViewerStatus};
