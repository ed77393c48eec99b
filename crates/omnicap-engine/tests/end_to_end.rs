//! Headless GPU tests of the full capture path.
//!
//! Each test skips (passes with a note on stderr) when no adapter with
//! multiview support is available.

use glam::{Mat4, Vec3};

use omnicap_engine::device::{GpuInit, HeadlessGpu};
use omnicap_engine::export::PanoramaPixels;
use omnicap_engine::paint::Color;
use omnicap_engine::render::capture::LightingParams;
use omnicap_engine::publish::{NullSink, PublishedFrame};
use omnicap_engine::render::equirect::EquirectSize;
use omnicap_engine::render::{GpuMesh, Mesh};
use omnicap_engine::scene::{DrawList, EmptyScene, SceneProvider};
use omnicap_engine::{CaptureConfig, CaptureError, FrameOutcome, PanoramaRenderer, ResourceValidationError};

const FACE: u32 = 64;

fn gpu() -> Option<HeadlessGpu> {
    match HeadlessGpu::new_blocking(GpuInit::default()) {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e:#}");
            None
        }
    }
}

fn small_config() -> CaptureConfig {
    CaptureConfig::default()
        .with_face_size(FACE)
        .unwrap()
        .with_output(EquirectSize::new(256, 128).unwrap())
}

struct OneSphere {
    mesh: GpuMesh,
    center: Vec3,
}

impl OneSphere {
    fn new(gpu: &HeadlessGpu, center: Vec3) -> Self {
        Self {
            mesh: GpuMesh::upload(gpu.device(), &Mesh::icosphere(3), "test sphere"),
            center,
        }
    }
}

impl SceneProvider for OneSphere {
    fn contribute<'a>(&'a self, _time: f32, draws: &mut DrawList<'a>) {
        draws.push(Mat4::from_translation(self.center), &self.mesh);
    }
}

fn brightness(t: [f32; 4]) -> f32 {
    t[0] + t[1] + t[2]
}

fn assert_is_clear(t: [f32; 4], clear: Color) {
    let eps = 2e-3;
    assert!(
        (t[0] - clear.r).abs() < eps && (t[1] - clear.g).abs() < eps && (t[2] - clear.b).abs() < eps,
        "expected clear color, got {t:?}"
    );
}

fn capture_once(gpu: &HeadlessGpu, renderer: &mut PanoramaRenderer, scene: &dyn SceneProvider) -> PanoramaPixels {
    let outcome = renderer.render_frame(gpu.device(), gpu.queue(), scene, 0.0, &mut NullSink);
    assert!(outcome.is_fresh(), "{outcome:?}");
    renderer.read_pixels(gpu.device(), gpu.queue()).unwrap()
}

// ── scene content ────────────────────────────────────────────────────────

#[test]
fn sphere_on_positive_x_lands_at_panorama_centre() {
    let Some(gpu) = gpu() else { return };
    let config = small_config();
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &config).unwrap();
    let scene = OneSphere::new(&gpu, Vec3::new(10.0, 0.0, 0.0));

    let px = capture_once(&gpu, &mut renderer, &scene);
    assert_eq!((px.width, px.height), (256, 128));

    let centre = px.sample_uv(0.5, 0.5);
    let clear = config.clear_color;
    assert!(
        brightness(centre) > brightness(clear.to_array()) + 0.5,
        "centre {centre:?} not lit"
    );

    // Opposite direction (-X) and the poles see only the clear color.
    assert_is_clear(px.sample_uv(0.01, 0.5), clear);
    assert_is_clear(px.sample_uv(0.5, 0.99), clear);
    assert_is_clear(px.sample_uv(0.5, 0.01), clear);
    // +Z is a quarter turn away.
    assert_is_clear(px.sample_uv(0.75, 0.5), clear);
}

#[test]
fn sphere_above_lands_on_top_rows() {
    let Some(gpu) = gpu() else { return };
    let config = small_config();
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &config).unwrap();
    let scene = OneSphere::new(&gpu, Vec3::new(0.0, 10.0, 0.0));

    let px = capture_once(&gpu, &mut renderer, &scene);
    // The top row is +Y regardless of longitude.
    for x in [0, 64, 128, 200, 255] {
        assert!(brightness(px.texel(x, 0)) > brightness(config.clear_color.to_array()) + 0.5);
    }
    assert_is_clear(px.texel(128, 127), config.clear_color);
}

#[test]
fn empty_scene_is_flat_clear_color() {
    let Some(gpu) = gpu() else { return };
    let config = small_config().with_clear_color(Color::from_rgb_u8(0, 50, 100));
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &config).unwrap();

    let px = capture_once(&gpu, &mut renderer, &EmptyScene);
    for t in &px.texels {
        assert_is_clear(*t, config.clear_color);
    }
}

#[test]
fn moving_origin_moves_the_view() {
    let Some(gpu) = gpu() else { return };
    let config = small_config();
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &config).unwrap();
    let scene = OneSphere::new(&gpu, Vec3::new(10.0, 0.0, 0.0));

    // From x = 20 the sphere is behind, on the -X seam. The light follows
    // the viewpoint so the visible side is lit.
    let origin = Vec3::new(20.0, 0.0, 0.0);
    renderer.set_capture_origin(origin);
    renderer.set_lighting(LightingParams {
        light_position: origin,
        ..LightingParams::default()
    });
    assert_eq!(renderer.capture_origin(), origin);
    let px = capture_once(&gpu, &mut renderer, &scene);

    let lit = brightness(config.clear_color.to_array()) + 0.5;
    assert!(brightness(px.texel(0, 64)) > lit);
    assert!(brightness(px.texel(255, 64)) > lit);
    assert_is_clear(px.sample_uv(0.5, 0.5), config.clear_color);
}

// ── publish / resize ─────────────────────────────────────────────────────

#[test]
fn every_fresh_frame_is_published_once() {
    let Some(gpu) = gpu() else { return };
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &small_config()).unwrap();

    let mut seen = Vec::new();
    let mut sink = |frame: &PublishedFrame<'_>| seen.push((frame.frame_index, frame.size()));

    for t in 0..3 {
        let outcome = renderer.render_frame(gpu.device(), gpu.queue(), &EmptyScene, t as f32, &mut sink);
        assert_eq!(outcome, FrameOutcome::Fresh { frame_index: t });
    }

    let size = EquirectSize::new(256, 128).unwrap();
    assert_eq!(seen, vec![(0, size), (1, size), (2, size)]);
    assert_eq!(renderer.frame_index(), 3);
}

#[test]
fn output_resize_reallocates() {
    let Some(gpu) = gpu() else { return };
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &small_config()).unwrap();

    let bigger = EquirectSize::new(512, 256).unwrap();
    assert!(renderer.set_output_size(gpu.device(), gpu.queue(), bigger).unwrap());
    assert!(!renderer.set_output_size(gpu.device(), gpu.queue(), bigger).unwrap());

    let px = capture_once(&gpu, &mut renderer, &EmptyScene);
    assert_eq!((px.width, px.height), (512, 256));
}

#[test]
fn face_resize_keeps_capturing() {
    let Some(gpu) = gpu() else { return };
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &small_config()).unwrap();

    renderer.set_face_size(gpu.device(), 32).unwrap();
    assert_eq!(renderer.face_size(), 32);
    assert!(renderer.set_face_size(gpu.device(), 0).is_err());
    assert_eq!(renderer.face_size(), 32);

    let scene = OneSphere::new(&gpu, Vec3::new(10.0, 0.0, 0.0));
    let px = capture_once(&gpu, &mut renderer, &scene);
    assert!(brightness(px.sample_uv(0.5, 0.5)) > 1.0);
}

// ── startup validation ───────────────────────────────────────────────────

#[test]
fn zero_face_size_fails_startup() {
    let Some(gpu) = gpu() else { return };
    let mut config = small_config();
    config.face_size = 0;

    match PanoramaRenderer::new(gpu.device(), gpu.queue(), &config) {
        Err(CaptureError::ResourceValidation(ResourceValidationError::ZeroFaceSize)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("zero face size accepted"),
    }
}

// ── export ───────────────────────────────────────────────────────────────

#[test]
fn export_writes_timestamped_png() {
    let Some(gpu) = gpu() else { return };
    let mut renderer = PanoramaRenderer::new(gpu.device(), gpu.queue(), &small_config()).unwrap();
    renderer.render_frame(gpu.device(), gpu.queue(), &EmptyScene, 0.0, &mut NullSink);

    let dir = std::env::temp_dir().join(format!("omnicap-e2e-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let job = renderer.export_png(gpu.device(), gpu.queue(), &dir).unwrap();
    let name = job.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("equirect_") && name.ends_with(".png"), "{name}");

    let path = job.wait().unwrap();
    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (256, 128));
    assert_eq!(img.get_pixel(10, 10).0, [0, 50, 100, 255]);

    std::fs::remove_dir_all(&dir).ok();
}
