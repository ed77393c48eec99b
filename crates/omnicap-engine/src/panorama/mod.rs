//! Frame orchestration: capture, reprojection, publish, preview and export.

mod config;
mod renderer;

pub use config::CaptureConfig;
pub use renderer::{FrameOutcome, PanoramaRenderer};
