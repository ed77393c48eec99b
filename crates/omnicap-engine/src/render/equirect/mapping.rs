//! CPU mirror of the reprojection math in `equirect.wgsl`.
//!
//! Coordinates: `u` runs 0..1 around the horizon starting at -X (longitude
//! -π), `v` runs 0..1 from the -Y pole to the +Y pole. +X sits at (0.5, 0.5)
//! and +Z at (0.75, 0.5).

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{UVec2, Vec2, Vec3};

use crate::render::capture::CubeFace;

/// Unit direction for an equirect coordinate.
pub fn direction_from_uv(uv: Vec2) -> Vec3 {
    let theta = uv.x * TAU - PI;
    let phi = uv.y * PI - FRAC_PI_2;
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    Vec3::new(cos_phi * cos_theta, sin_phi, cos_phi * sin_theta).normalize()
}

/// Inverse of [`direction_from_uv`]. `dir` need not be normalized.
///
/// At the poles longitude is undefined; `u` is then whatever `atan2` returns
/// for the residual x/z components.
pub fn uv_from_direction(dir: Vec3) -> Vec2 {
    let d = dir.normalize_or_zero();
    let theta = d.z.atan2(d.x);
    let phi = d.y.clamp(-1.0, 1.0).asin();
    Vec2::new((theta + PI) / TAU, (phi + FRAC_PI_2) / PI)
}

/// Clamps `uv` one texel inward so the seam and poles never sample exactly
/// at the wrap boundary.
pub fn clamp_uv(uv: Vec2, size: UVec2) -> Vec2 {
    let margin = Vec2::ONE / size.max(UVec2::ONE).as_vec2();
    uv.clamp(margin, Vec2::ONE - margin)
}

/// Face selected by a cube lookup along `dir`, plus the face-local
/// coordinate with `t = 0` on the first texel row.
///
/// Follows the standard major-axis selection; ties resolve toward X, then Y.
pub fn cube_face_for_direction(dir: Vec3) -> (CubeFace, Vec2) {
    let a = dir.abs();
    let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
        if dir.x >= 0.0 {
            (CubeFace::PosX, -dir.z, -dir.y, a.x)
        } else {
            (CubeFace::NegX, dir.z, -dir.y, a.x)
        }
    } else if a.y >= a.z {
        if dir.y >= 0.0 {
            (CubeFace::PosY, dir.x, dir.z, a.y)
        } else {
            (CubeFace::NegY, dir.x, -dir.z, a.y)
        }
    } else if dir.z >= 0.0 {
        (CubeFace::PosZ, dir.x, -dir.y, a.z)
    } else {
        (CubeFace::NegZ, -dir.x, -dir.y, a.z)
    };

    let st = Vec2::new(sc, tc) / ma.max(f32::MIN_POSITIVE);
    (face, (st + Vec2::ONE) * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_dir(actual: Vec3, expected: Vec3) {
        assert!(actual.abs_diff_eq(expected, 1e-5), "{actual} != {expected}");
    }

    // ── landmarks ────────────────────────────────────────────────────────

    #[test]
    fn horizon_landmarks() {
        assert_dir(direction_from_uv(Vec2::new(0.5, 0.5)), Vec3::X);
        assert_dir(direction_from_uv(Vec2::new(0.75, 0.5)), Vec3::Z);
        assert_dir(direction_from_uv(Vec2::new(0.25, 0.5)), Vec3::NEG_Z);
        assert_dir(direction_from_uv(Vec2::new(0.0, 0.5)), Vec3::NEG_X);
        assert_dir(direction_from_uv(Vec2::new(1.0, 0.5)), Vec3::NEG_X);
    }

    #[test]
    fn poles() {
        for u in [0.0, 0.3, 0.9] {
            assert_dir(direction_from_uv(Vec2::new(u, 1.0)), Vec3::Y);
            assert_dir(direction_from_uv(Vec2::new(u, 0.0)), Vec3::NEG_Y);
        }
        assert!((uv_from_direction(Vec3::Y).y - 1.0).abs() < 1e-6);
        assert!(uv_from_direction(Vec3::NEG_Y).y.abs() < 1e-6);
    }

    #[test]
    fn directions_are_unit_length() {
        for i in 0..=16 {
            for j in 0..=8 {
                let d = direction_from_uv(Vec2::new(i as f32 / 16.0, j as f32 / 8.0));
                assert!((d.length() - 1.0).abs() < 1e-5);
            }
        }
    }

    // ── inverse ──────────────────────────────────────────────────────────

    #[test]
    fn inverse_away_from_seam_and_poles() {
        for i in 1..32 {
            for j in 1..16 {
                let uv = Vec2::new(i as f32 / 32.0, j as f32 / 16.0);
                let back = uv_from_direction(direction_from_uv(uv));
                assert!(back.abs_diff_eq(uv, 1e-4), "{uv} -> {back}");
            }
        }
    }

    #[test]
    fn seam_columns_agree() {
        // u = 0 and u = 1 describe the same meridian.
        for j in 1..8 {
            let v = j as f32 / 8.0;
            let a = direction_from_uv(Vec2::new(0.0, v));
            let b = direction_from_uv(Vec2::new(1.0, v));
            assert_dir(a, b);
        }
    }

    #[test]
    fn unnormalized_input_is_accepted() {
        let uv = uv_from_direction(Vec3::new(0.0, 0.0, 12.0));
        assert!(uv.abs_diff_eq(Vec2::new(0.75, 0.5), 1e-6));
    }

    // ── clamping ─────────────────────────────────────────────────────────

    #[test]
    fn clamp_keeps_one_texel_margin() {
        let size = UVec2::new(8, 4);
        assert_eq!(clamp_uv(Vec2::ZERO, size), Vec2::new(0.125, 0.25));
        assert_eq!(clamp_uv(Vec2::ONE, size), Vec2::new(0.875, 0.75));
        assert_eq!(clamp_uv(Vec2::splat(0.5), size), Vec2::splat(0.5));
    }

    #[test]
    fn clamped_rows_approach_the_poles() {
        for size in [UVec2::new(256, 128), UVec2::new(4096, 2048)] {
            // The clamped rows sit one row of latitude short of each pole.
            let expected = (PI / size.y as f32).cos();
            for j in 0..=8 {
                let u = j as f32 / 8.0;
                let bottom = direction_from_uv(clamp_uv(Vec2::new(u, 0.0), size));
                let top = direction_from_uv(clamp_uv(Vec2::new(u, 1.0), size));

                for d in [bottom, top] {
                    assert!(d.is_finite(), "{size} u={u}: {d}");
                    assert!((d.length() - 1.0).abs() < 1e-5);
                }
                assert!((bottom.y + expected).abs() < 1e-5, "{size}: {bottom}");
                assert!((top.y - expected).abs() < 1e-5, "{size}: {top}");
                assert!(bottom.y < -0.999 && top.y > 0.999);
            }
        }
    }

    #[test]
    fn clamped_seam_columns_stay_within_a_texel_of_the_seam() {
        let size = UVec2::new(256, 128);
        let eps = 1.0 / size.x as f32;
        for j in 0..=8 {
            let v = clamp_uv(Vec2::new(0.5, j as f32 / 8.0), size).y;
            let seam = direction_from_uv(Vec2::new(0.0, v));
            let left = direction_from_uv(clamp_uv(Vec2::new(0.0, v), size));
            let right = direction_from_uv(clamp_uv(Vec2::new(1.0, v), size));

            assert!(left.is_finite() && right.is_finite());
            // Chord length never exceeds the arc of one texel of azimuth.
            assert!(left.distance(seam) <= eps * TAU + 1e-5, "v={v}");
            assert!(right.distance(seam) <= eps * TAU + 1e-5, "v={v}");
            assert!(left.distance(right) <= 2.0 * eps * TAU + 1e-5, "v={v}");
        }
    }

    // ── cube lookup ──────────────────────────────────────────────────────

    #[test]
    fn axis_directions_hit_face_centres() {
        for face in CubeFace::ALL {
            let (hit, st) = cube_face_for_direction(face.direction() * 3.0);
            assert_eq!(hit, face);
            assert!(st.abs_diff_eq(Vec2::splat(0.5), 1e-6));
        }
    }

    #[test]
    fn face_camera_up_lands_on_last_rows() {
        // The projection flip puts each face camera's up vector at the bottom
        // of the layer, where the cube lookup expects it.
        for face in CubeFace::ALL {
            let dir = (face.direction() + face.up() * 0.9).normalize();
            let (hit, st) = cube_face_for_direction(dir);
            assert_eq!(hit, face);
            assert!(st.y > 0.9, "{face:?}: {st}");
            assert!((st.x - 0.5).abs() < 1e-5);
        }
    }
}
