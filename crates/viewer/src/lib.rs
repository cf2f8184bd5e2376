//! Renderer-agnostic viewer state: configuration, camera framing,
//! visualization modes, image and lighting controls, and the [`Viewer`]
//! controller that owns all of it.

pub mod config;
pub mod controller;
pub mod framing;
pub mod image;
pub mod lighting;
pub mod model;
pub mod modes;
pub mod shortcuts;
pub mod snapshot;

pub use config::ViewerConfig;
pub use controller::{LOAD_FAILED_MESSAGE, LoadStatus, ModelInfo, Viewer};
pub use image::{ImageFilter, ImageSettings};
pub use lighting::LightingSettings;
pub use modes::ViewMode;
pub use shortcuts::Shortcut;
