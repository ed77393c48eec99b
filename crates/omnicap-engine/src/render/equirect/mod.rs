//! Cube-to-equirectangular reprojection.

mod mapping;
mod pipeline;
mod target;

pub use mapping::{clamp_uv, cube_face_for_direction, direction_from_uv, uv_from_direction};
pub use pipeline::EquirectPipeline;
pub use target::{EquirectSize, EquirectTarget, EQUIRECT_FORMAT};
