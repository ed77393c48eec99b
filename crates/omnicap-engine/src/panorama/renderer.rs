use std::path::Path;

use glam::Vec3;

use crate::coords::Rect;
use crate::error::{CaptureError, ExportError, ResourceValidationError, Result};
use crate::export::{self, ExportJob, PanoramaPixels};
use crate::paint::Color;
use crate::publish::{PublishSink, PublishedFrame};
use crate::render::capture::{
    face_projection, CapturePipeline, ClipRange, CubeCaptureTarget, FaceViewSet, LightingParams,
};
use crate::render::equirect::{EquirectPipeline, EquirectSize, EquirectTarget};
use crate::render::preview::PreviewRenderer;
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawList, SceneProvider};

use super::CaptureConfig;

/// Result of one [`PanoramaRenderer::render_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Capture and reprojection were submitted and published.
    Fresh { frame_index: u64 },
    /// The cube target failed its completeness check; nothing was rendered or
    /// published and the previous panorama is still current.
    Stale(ResourceValidationError),
}

impl FrameOutcome {
    #[inline]
    pub fn is_fresh(&self) -> bool {
        matches!(self, FrameOutcome::Fresh { .. })
    }
}

/// Owns the whole capture pipeline for one viewpoint.
///
/// Per frame: scene -> six-face capture -> equirect reprojection -> publish.
/// The letterboxed preview and PNG export read the published panorama.
pub struct PanoramaRenderer {
    clear_color: Color,
    clip: ClipRange,
    lighting: LightingParams,
    views: FaceViewSet,
    uniforms_dirty: bool,

    cube: CubeCaptureTarget,
    capture: CapturePipeline,
    equirect_target: EquirectTarget,
    equirect: EquirectPipeline,
    preview: PreviewRenderer,

    frame_index: u64,
    stale_frames: u64,
}

impl PanoramaRenderer {
    /// Builds every pipeline and target. Any error here is fatal: the device
    /// cannot run the capture.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, config: &CaptureConfig) -> Result<Self> {
        if !device.features().contains(wgpu::Features::MULTIVIEW) {
            return Err(CaptureError::MissingFeature(wgpu::Features::MULTIVIEW));
        }
        check_clip(config.clip)?;

        let cube = CubeCaptureTarget::new(device, config.face_size)?;
        let capture = CapturePipeline::new(device)?;
        let equirect_target = EquirectTarget::new(device, config.output)?;
        let mut equirect = EquirectPipeline::new(device)?;
        let preview = PreviewRenderer::new()?;

        equirect.bind_source(device, &cube);
        equirect.write_output_size(queue, config.output);

        log::info!(
            "panorama pipeline ready: face {} -> equirect {}, clip {}..{}",
            config.face_size,
            config.output,
            config.clip.near,
            config.clip.far
        );

        Ok(Self {
            clear_color: config.clear_color,
            clip: config.clip,
            lighting: config.lighting,
            views: FaceViewSet::from_origin(config.capture_origin),
            uniforms_dirty: true,
            cube,
            capture,
            equirect_target,
            equirect,
            preview,
            frame_index: 0,
            stale_frames: 0,
        })
    }

    // ── configuration ────────────────────────────────────────────────────

    /// Moves the viewpoint. View matrices are rebuilt once, on the next frame.
    pub fn set_capture_origin(&mut self, origin: Vec3) {
        if origin == self.views.origin() {
            return;
        }
        self.views = FaceViewSet::from_origin(origin);
        self.uniforms_dirty = true;
    }

    #[inline]
    pub fn capture_origin(&self) -> Vec3 {
        self.views.origin()
    }

    pub fn set_lighting(&mut self, lighting: LightingParams) {
        self.lighting = lighting;
        self.uniforms_dirty = true;
    }

    #[inline]
    pub fn lighting(&self) -> &LightingParams {
        &self.lighting
    }

    pub fn set_clip(&mut self, clip: ClipRange) -> Result<()> {
        check_clip(clip)?;
        self.clip = clip;
        self.uniforms_dirty = true;
        Ok(())
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Resizes the panorama. Returns `true` when the target was reallocated.
    pub fn set_output_size(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: EquirectSize,
    ) -> Result<bool> {
        let changed = self.equirect_target.ensure_size(device, size)?;
        if changed {
            self.equirect.write_output_size(queue, size);
        }
        Ok(changed)
    }

    /// Reallocates the cube target. On error the current target stays in use.
    pub fn set_face_size(&mut self, device: &wgpu::Device, face_size: u32) -> Result<()> {
        if face_size == self.cube.face_size() {
            return Ok(());
        }
        let cube = CubeCaptureTarget::new(device, face_size)?;
        self.equirect.bind_source(device, &cube);
        self.cube = cube;
        Ok(())
    }

    #[inline]
    pub fn face_size(&self) -> u32 {
        self.cube.face_size()
    }

    #[inline]
    pub fn output_size(&self) -> EquirectSize {
        self.equirect_target.size()
    }

    #[inline]
    pub fn cube_target(&self) -> &CubeCaptureTarget {
        &self.cube
    }

    #[inline]
    pub fn equirect_target(&self) -> &EquirectTarget {
        &self.equirect_target
    }

    /// Number of successfully captured frames.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // ── per frame ────────────────────────────────────────────────────────

    /// Captures `scene` at `time`, reprojects it, submits, then publishes.
    ///
    /// Incomplete targets never reach the GPU: the frame is skipped and
    /// reported as [`FrameOutcome::Stale`].
    pub fn render_frame(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &dyn SceneProvider,
        time: f32,
        sink: &mut dyn PublishSink,
    ) -> FrameOutcome {
        if let Err(e) = self.cube.check_complete() {
            self.note_stale(&e);
            return FrameOutcome::Stale(e);
        }
        if self.stale_frames > 0 {
            log::info!("cube target complete again after {} stale frames", self.stale_frames);
            self.stale_frames = 0;
        }

        if self.uniforms_dirty {
            self.capture
                .write_views(queue, face_projection(self.clip), &self.views);
            self.capture.write_lighting(queue, &self.lighting);
            self.uniforms_dirty = false;
        }

        let mut draws = DrawList::new();
        scene.contribute(time, &mut draws);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("omnicap capture encoder"),
        });
        self.capture.capture(
            device,
            queue,
            &mut encoder,
            &self.cube,
            &draws,
            self.clear_color,
        );
        self.equirect.record(&mut encoder, &self.equirect_target);
        queue.submit(std::iter::once(encoder.finish()));

        let frame_index = self.frame_index;
        self.frame_index += 1;

        sink.publish(&PublishedFrame {
            device,
            queue,
            target: &self.equirect_target,
            frame_index,
        });

        FrameOutcome::Fresh { frame_index }
    }

    /// Draws the current panorama letterboxed into the window target.
    pub fn draw_preview(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> Option<Rect> {
        self.preview.render(ctx, target, &self.equirect_target)
    }

    // ── export ───────────────────────────────────────────────────────────

    /// Reads the current panorama back as linear RGBA.
    pub fn read_pixels(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> std::result::Result<PanoramaPixels, ExportError> {
        export::read_pixels(device, queue, &self.equirect_target)
    }

    /// Writes the current panorama to `dir` as a timestamped PNG.
    pub fn export_png(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dir: &Path,
    ) -> std::result::Result<ExportJob, ExportError> {
        export::export_png(device, queue, &self.equirect_target, dir)
    }

    fn note_stale(&mut self, err: &ResourceValidationError) {
        self.stale_frames += 1;
        if self.stale_frames == 1 {
            log::error!("cube target incomplete, skipping capture: {err}");
        } else {
            log::debug!("cube target still incomplete ({} frames): {err}", self.stale_frames);
        }
    }
}

fn check_clip(clip: ClipRange) -> Result<()> {
    if clip.is_valid() {
        Ok(())
    } else {
        Err(CaptureError::InvalidClipRange {
            near: clip.near,
            far: clip.far,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{GpuInit, HeadlessGpu};
    use crate::render::capture::CubeTargetDesc;
    use crate::scene::EmptyScene;

    fn gpu() -> Option<HeadlessGpu> {
        match HeadlessGpu::new_blocking(GpuInit::default()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e:#}");
                None
            }
        }
    }

    #[test]
    fn incomplete_cube_target_skips_frames_until_replaced() {
        let Some(gpu) = gpu() else { return };
        let (device, queue) = (gpu.device(), gpu.queue());
        let config = CaptureConfig::default()
            .with_face_size(64)
            .unwrap()
            .with_output(EquirectSize::new(256, 128).unwrap());
        let mut panorama = PanoramaRenderer::new(device, queue, &config).unwrap();

        let mut published = Vec::new();
        let mut sink = |frame: &PublishedFrame<'_>| published.push(frame.frame_index);

        let first = panorama.render_frame(device, queue, &EmptyScene, 0.0, &mut sink);
        assert_eq!(first, FrameOutcome::Fresh { frame_index: 0 });

        // Depth faces half the size of the color faces.
        let mut desc = CubeTargetDesc::new(64);
        desc.depth.width = 32;
        desc.depth.height = 32;
        panorama.cube = CubeCaptureTarget::allocate_unchecked(device, desc);

        for t in 1..4 {
            let outcome = panorama.render_frame(device, queue, &EmptyScene, t as f32, &mut sink);
            assert!(
                matches!(
                    outcome,
                    FrameOutcome::Stale(ResourceValidationError::ExtentMismatch {
                        color_w: 64,
                        depth_w: 32,
                        ..
                    })
                ),
                "{outcome:?}"
            );
        }
        assert_eq!(panorama.stale_frames, 3);
        assert_eq!(panorama.frame_index(), 1);

        panorama.set_face_size(device, 32).unwrap();
        let recovered = panorama.render_frame(device, queue, &EmptyScene, 4.0, &mut sink);
        assert_eq!(recovered, FrameOutcome::Fresh { frame_index: 1 });
        assert_eq!(panorama.stale_frames, 0);

        // Stale frames never reach the sink.
        assert_eq!(published, vec![0, 1]);
    }
}
