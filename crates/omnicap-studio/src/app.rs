use std::path::PathBuf;

use omnicap_engine::core::{App, AppControl, FrameCtx};
use omnicap_engine::input::Key;
use omnicap_engine::paint::Color;
use omnicap_engine::publish::NamedSink;
use omnicap_engine::{CaptureConfig, CaptureError, FrameOutcome, PanoramaRenderer};

use crate::spheres::TestSpheres;

/// Name the panorama is published under.
pub const STREAM_NAME: &str = "equirect";

/// Window background around the letterboxed preview.
fn background() -> Color {
    Color::gray_u8(12)
}

/// GPU-side state, created on the first frame once a device exists.
struct Capture {
    panorama: PanoramaRenderer,
    scene: TestSpheres,
}

pub struct StudioApp {
    config: CaptureConfig,
    export_dir: PathBuf,
    sink: NamedSink,
    capture: Option<Capture>,
    exit_error: Option<anyhow::Error>,
}

impl StudioApp {
    pub fn new(config: CaptureConfig, export_dir: PathBuf) -> Self {
        Self {
            config,
            export_dir,
            sink: NamedSink::new(STREAM_NAME),
            capture: None,
            exit_error: None,
        }
    }

    /// Capture setup failures end the session; the runtime returns the error.
    fn fail(&mut self, err: CaptureError) -> AppControl {
        log::error!("capture pipeline setup failed: {err}");
        self.exit_error = Some(anyhow::Error::new(err).context("capture pipeline setup failed"));
        AppControl::Exit
    }
}

impl App for StudioApp {
    fn take_exit_error(&mut self) -> Option<anyhow::Error> {
        self.exit_error.take()
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        if self.capture.is_none() {
            match PanoramaRenderer::new(ctx.device(), ctx.queue(), &self.config) {
                Ok(panorama) => {
                    ctx.window.set_title(&format!(
                        "omnicap - {0}x{0} faces, {1} panorama",
                        panorama.face_size(),
                        panorama.output_size()
                    ));
                    self.capture = Some(Capture {
                        panorama,
                        scene: TestSpheres::new(ctx.device()),
                    });
                }
                Err(e) => return self.fail(e),
            }
        }
        let Some(capture) = self.capture.as_mut() else {
            return AppControl::Continue;
        };

        let outcome = capture.panorama.render_frame(
            ctx.device(),
            ctx.queue(),
            &capture.scene,
            ctx.time.elapsed,
            &mut self.sink,
        );

        // Plain S only; modified chords are left to the window system.
        if ctx.input_frame.key_pressed(Key::Char('S')) && !ctx.input.modifiers.any() {
            match outcome {
                FrameOutcome::Fresh { .. } => {
                    match capture
                        .panorama
                        .export_png(ctx.device(), ctx.queue(), &self.export_dir)
                    {
                        Ok(job) => log::info!("exporting {}", job.path.display()),
                        Err(e) => log::error!("export failed: {e}"),
                    }
                }
                FrameOutcome::Stale(_) => log::warn!("export skipped: panorama is stale"),
            }
        }

        let panorama = &mut capture.panorama;
        ctx.render(background(), |rctx, target| {
            panorama.draw_preview(rctx, target);
        })
    }
}
