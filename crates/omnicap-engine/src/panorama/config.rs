use glam::Vec3;

use crate::error::Result;
use crate::paint::Color;
use crate::render::capture::{ClipRange, LightingParams};
use crate::render::equirect::EquirectSize;

/// Startup parameters of the capture pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Edge length of each square cube face, in texels.
    pub face_size: u32,
    pub output: EquirectSize,
    pub clip: ClipRange,
    pub clear_color: Color,
    pub lighting: LightingParams,
    pub capture_origin: Vec3,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            face_size: 1024,
            output: EquirectSize::default(),
            clip: ClipRange::default(),
            clear_color: Color::from_rgb_u8(0, 50, 100),
            lighting: LightingParams::default(),
            capture_origin: Vec3::ZERO,
        }
    }
}

impl CaptureConfig {
    /// Sets the face size and derives the output size from it.
    pub fn with_face_size(mut self, face_size: u32) -> Result<Self> {
        self.face_size = face_size;
        self.output = EquirectSize::for_face_size(face_size)?;
        Ok(self)
    }

    pub fn with_output(mut self, output: EquirectSize) -> Self {
        self.output = output;
        self
    }

    pub fn with_clip(mut self, clip: ClipRange) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingParams) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_capture_origin(mut self, origin: Vec3) -> Self {
        self.capture_origin = origin;
        self
    }
}
