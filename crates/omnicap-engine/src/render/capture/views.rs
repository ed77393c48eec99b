//! Per-face view matrices and the shared 90° projection.
//!
//! Face order (+X, -X, +Y, -Y, +Z, -Z) equals texture layer order, and the
//! up vectors follow the cube-map sampling convention so that a direction
//! rendered through face `i` lands where a cube lookup along the same
//! direction will read it.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

pub const FACE_COUNT: usize = 6;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; FACE_COUNT] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// Layer index in the cube target.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Axis the face looks along.
    pub fn direction(self) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::X,
            CubeFace::NegX => Vec3::NEG_X,
            CubeFace::PosY => Vec3::Y,
            CubeFace::NegY => Vec3::NEG_Y,
            CubeFace::PosZ => Vec3::Z,
            CubeFace::NegZ => Vec3::NEG_Z,
        }
    }

    /// Up vector of the face camera.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PosY => Vec3::Z,
            CubeFace::NegY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }
}

/// Near/far planes shared by all faces.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipRange {
    pub near: f32,
    pub far: f32,
}

impl ClipRange {
    pub const fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    pub fn is_valid(&self) -> bool {
        self.near.is_finite() && self.far.is_finite() && self.near > 0.0 && self.far > self.near
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self::new(0.05, 2000.0)
    }
}

/// Square 90° perspective with depth in `0..1`.
///
/// Y is flipped so that texel row 0 of each layer holds the face's "top" as
/// defined by the cube sampling rules. The flip reverses triangle winding, so
/// pipelines using this projection must not cull by winding.
pub fn face_projection(clip: ClipRange) -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::perspective_rh(FRAC_PI_2, 1.0, clip.near, clip.far)
}

/// Six view matrices for one capture origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FaceViewSet {
    origin: Vec3,
    views: [Mat4; FACE_COUNT],
}

impl FaceViewSet {
    pub fn from_origin(origin: Vec3) -> Self {
        let views = CubeFace::ALL
            .map(|face| Mat4::look_at_rh(origin, origin + face.direction(), face.up()));
        Self { origin, views }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn view(&self, face: CubeFace) -> Mat4 {
        self.views[face.index()]
    }

    #[inline]
    pub fn views(&self) -> &[Mat4; FACE_COUNT] {
        &self.views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::equirect::cube_face_for_direction;
    use glam::{Vec2, Vec4Swizzles};

    /// World-space forward of a view matrix.
    fn forward(view: Mat4) -> Vec3 {
        view.inverse().transform_vector3(Vec3::NEG_Z).normalize()
    }

    // ── face basis ───────────────────────────────────────────────────────

    #[test]
    fn ups_are_never_parallel_to_directions() {
        for face in CubeFace::ALL {
            let cross = face.direction().cross(face.up());
            assert!(cross.length() > 0.99, "{face:?}");
        }
    }

    #[test]
    fn six_distinct_axes_regardless_of_origin() {
        for origin in [Vec3::ZERO, Vec3::new(12.0, -3.5, 400.0)] {
            let set = FaceViewSet::from_origin(origin);
            for face in CubeFace::ALL {
                let f = forward(set.view(face));
                assert!(f.abs_diff_eq(face.direction(), 1e-5), "{face:?}: {f}");
            }
            for a in 0..FACE_COUNT {
                for b in (a + 1)..FACE_COUNT {
                    assert!(forward(set.views()[a]).dot(forward(set.views()[b])) < 0.5);
                }
            }
        }
    }

    #[test]
    fn origin_maps_to_view_space_zero() {
        let origin = Vec3::new(-8.0, 2.0, 5.0);
        let set = FaceViewSet::from_origin(origin);
        for face in CubeFace::ALL {
            let p = set.view(face).transform_point3(origin);
            assert!(p.length() < 1e-4);
        }
        assert_eq!(set.origin(), origin);
    }

    #[test]
    fn face_index_round_trips() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index(), i);
            assert_eq!(CubeFace::from_index(i), Some(*face));
        }
        assert_eq!(CubeFace::from_index(6), None);
    }

    // ── projection ───────────────────────────────────────────────────────

    #[test]
    fn depth_spans_near_to_far() {
        let clip = ClipRange::new(0.05, 2000.0);
        let proj = face_projection(clip);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -clip.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -clip.far));
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-4);

        let mid_a = proj.project_point3(Vec3::new(0.0, 0.0, -10.0)).z;
        let mid_b = proj.project_point3(Vec3::new(0.0, 0.0, -20.0)).z;
        assert!(mid_a < mid_b);
    }

    #[test]
    fn frustum_edges_hit_ndc_bounds() {
        let proj = face_projection(ClipRange::default());
        // 45° off axis in view space sits exactly on the frustum edge.
        let right = proj.project_point3(Vec3::new(5.0, 0.0, -5.0));
        let up = proj.project_point3(Vec3::new(0.0, 5.0, -5.0));
        assert!((right.x - 1.0).abs() < 1e-5);
        assert!((up.y + 1.0).abs() < 1e-5, "view-space up lands at NDC -y");
    }

    #[test]
    fn clip_range_validity() {
        assert!(ClipRange::default().is_valid());
        assert!(!ClipRange::new(0.0, 10.0).is_valid());
        assert!(!ClipRange::new(5.0, 1.0).is_valid());
        assert!(!ClipRange::new(0.1, f32::INFINITY).is_valid());
    }

    // ── agreement with cube sampling ─────────────────────────────────────

    /// Projects `dir` through every face and returns the face whose frustum
    /// contains it, with the face-local texture coordinate (row 0 at t = 0).
    fn rasterized_face(set: &FaceViewSet, proj: Mat4, dir: Vec3) -> Option<(CubeFace, Vec2)> {
        let p = set.origin() + dir * 50.0;
        CubeFace::ALL.into_iter().find_map(|face| {
            let clip = proj * set.view(face) * p.extend(1.0);
            if clip.w <= 0.0 {
                return None;
            }
            let ndc = clip.xyz() / clip.w;
            let inside = ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0 && (0.0..=1.0).contains(&ndc.z);
            inside.then(|| (face, Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5)))
        })
    }

    #[test]
    fn rendered_layers_match_cube_lookup() {
        let set = FaceViewSet::from_origin(Vec3::new(3.0, -1.0, 7.0));
        let proj = face_projection(ClipRange::default());

        let mut rng_state = 0x2545_f491_u32;
        let mut next = || {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 17;
            rng_state ^= rng_state << 5;
            (rng_state as f32 / u32::MAX as f32) * 2.0 - 1.0
        };

        let mut checked = 0;
        for _ in 0..500 {
            let dir = Vec3::new(next(), next(), next());
            if dir.length() < 0.1 {
                continue;
            }
            let dir = dir.normalize();
            let (face, uv) = cube_face_for_direction(dir);
            let Some((raster_face, raster_uv)) = rasterized_face(&set, proj, dir) else {
                continue;
            };
            assert_eq!(face, raster_face, "dir {dir}");
            assert!(uv.abs_diff_eq(raster_uv, 1e-4), "dir {dir}: {uv} vs {raster_uv}");
            checked += 1;
        }
        assert!(checked > 400);
    }
}
