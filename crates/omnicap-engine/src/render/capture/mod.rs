//! Layered cube capture: face views, the six-layer target and the multiview
//! pipeline that fills it.

mod lighting;
mod pipeline;
mod target;
mod views;

pub use lighting::LightingParams;
pub use pipeline::{CapturePass, CapturePipeline, CaptureState};
pub use target::{
    AttachmentDesc, CubeCaptureTarget, CubeTargetDesc, CUBE_COLOR_FORMAT, CUBE_DEPTH_FORMAT,
};
pub use views::{face_projection, ClipRange, CubeFace, FaceViewSet, FACE_COUNT};
