//! omnicap engine crate.
//!
//! Renders a scene from one viewpoint into all six faces of a cube target in a
//! single pass, reprojects the cube into an equirectangular panorama, then
//! publishes, previews and exports that panorama.
//!
//! The platform loop (`window`, `core`, `input`, `time`) follows the usual
//! winit + wgpu layout; the capture itself lives in `render` and is driven by
//! [`panorama::PanoramaRenderer`].

pub mod core;
pub mod device;
pub mod input;
pub mod time;
pub mod window;

pub mod coords;
pub mod error;
pub mod export;
pub mod logging;
pub mod paint;
pub mod panorama;
pub mod publish;
pub mod render;
pub mod scene;

pub use error::{CaptureError, ExportError, ResourceValidationError};
pub use panorama::{CaptureConfig, FrameOutcome, PanoramaRenderer};
