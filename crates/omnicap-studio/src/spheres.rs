//! Seeded field of orbiting spheres around the capture point.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};

use omnicap_engine::render::{GpuMesh, Mesh};
use omnicap_engine::scene::{DrawList, SceneProvider};

pub const SPHERE_COUNT: usize = 40;
pub const SPHERE_SEED: u64 = 1337;
const SUBDIVISIONS: u32 = 3;

/// One sphere's orbit around the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Unit offset from the origin at `t = 0` (before phase).
    pub direction: Vec3,
    /// Unit rotation axis.
    pub axis: Vec3,
    pub orbit_radius: f32,
    pub radius: f32,
    /// Radians per second.
    pub speed: f32,
    pub phase: f32,
}

impl Orbit {
    pub fn model(&self, time: f32) -> Mat4 {
        let rotation = Quat::from_axis_angle(self.axis, time * self.speed + self.phase);
        let center = rotation * self.direction * self.orbit_radius;
        Mat4::from_translation(center) * Mat4::from_scale(Vec3::splat(self.radius))
    }
}

/// Generates `count` orbits from `seed`. The same seed always yields the same
/// field.
pub fn generate_orbits(count: usize, seed: u64) -> Vec<Orbit> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut uniform = |lo: f32, hi: f32| lo + (hi - lo) * rng.f32();

    (0..count)
        .map(|_| {
            let direction = Vec3::new(
                uniform(-1.0, 1.0),
                uniform(-1.0, 1.0),
                uniform(-1.0, 1.0),
            )
            .try_normalize()
            .unwrap_or(Vec3::X);
            let axis = Vec3::new(
                uniform(-1.0, 1.0),
                uniform(-1.0, 1.0),
                uniform(-1.0, 1.0),
            )
            .try_normalize()
            .unwrap_or(Vec3::Y);

            Orbit {
                direction,
                axis,
                orbit_radius: uniform(60.0, 180.0),
                radius: uniform(6.0, 22.0),
                speed: uniform(0.10, 0.35),
                phase: uniform(0.0, TAU),
            }
        })
        .collect()
}

/// Scene provider drawing every orbit with one shared icosphere.
pub struct TestSpheres {
    mesh: GpuMesh,
    orbits: Vec<Orbit>,
}

impl TestSpheres {
    pub fn new(device: &wgpu::Device) -> Self {
        let mesh = Mesh::icosphere(SUBDIVISIONS);
        log::debug!(
            "test spheres: {} orbits, {} triangles each",
            SPHERE_COUNT,
            mesh.triangle_count()
        );
        Self {
            mesh: GpuMesh::upload(device, &mesh, "test sphere"),
            orbits: generate_orbits(SPHERE_COUNT, SPHERE_SEED),
        }
    }
}

impl SceneProvider for TestSpheres {
    fn contribute<'a>(&'a self, time: f32, draws: &mut DrawList<'a>) {
        for orbit in &self.orbits {
            draws.push(orbit.model(time), &self.mesh);
        }
    }
}
