//! Error taxonomy for the capture pipeline.
//!
//! Startup failures (shader compile/link, resource creation, missing device
//! features) are returned as [`CaptureError`] and are expected to abort startup.
//! Per-frame failures never cross the pipeline boundary as errors; they are
//! logged and reported as [`crate::panorama::FrameOutcome::Stale`].

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for pipeline construction.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Shader stage that failed to build.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Capture,
    Equirect,
    Preview,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Capture => "capture",
            ShaderStage::Equirect => "equirect",
            ShaderStage::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// Errors raised while building or resizing the pipeline.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Layered target attachments are incompatible.
    #[error(transparent)]
    ResourceValidation(#[from] ResourceValidationError),

    /// WGSL source failed to parse.
    #[error("{stage} shader failed to compile:\n{message}")]
    ShaderCompile { stage: ShaderStage, message: String },

    /// WGSL module parsed but failed validation (interface/binding mismatch).
    #[error("{stage} shader failed to link:\n{message}")]
    ShaderLink { stage: ShaderStage, message: String },

    /// The adapter lacks a feature the pipeline requires.
    #[error("GPU adapter does not support required feature {0:?}")]
    MissingFeature(wgpu::Features),

    /// Near plane must be positive and in front of the far plane.
    #[error("invalid clip range near={near} far={far}")]
    InvalidClipRange { near: f32, far: f32 },

    /// Equirect output must be exactly 2:1 and non-zero.
    #[error("invalid equirect output size {width}x{height} (width must equal 2 x height)")]
    InvalidOutputSize { width: u32, height: u32 },
}

/// Layered framebuffer completeness failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    #[error("face size must be non-zero")]
    ZeroFaceSize,

    #[error("face size {size} exceeds device limit {limit}")]
    FaceSizeExceedsLimit { size: u32, limit: u32 },

    #[error("cube target needs 6 layers, color attachment has {0}")]
    ColorLayerCount(u32),

    #[error("color attachment has {color} layers but depth attachment has {depth}")]
    LayerCountMismatch { color: u32, depth: u32 },

    #[error("color attachment is {color_w}x{color_h} but depth attachment is {depth_w}x{depth_h}")]
    ExtentMismatch {
        color_w: u32,
        color_h: u32,
        depth_w: u32,
        depth_h: u32,
    },

    #[error("cube faces must be square, got {width}x{height}")]
    NonSquareFace { width: u32, height: u32 },

    #[error("{0:?} is not a renderable color format")]
    ColorFormat(wgpu::TextureFormat),

    #[error("{0:?} is not a depth format")]
    DepthFormat(wgpu::TextureFormat),
}

/// On-demand export failures. Recovered locally and logged.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to read back equirect target: {0}")]
    Readback(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
