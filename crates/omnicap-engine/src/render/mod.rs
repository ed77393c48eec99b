//! GPU rendering subsystem.
//!
//! Two passes run every frame:
//! - `capture`: scene geometry is rendered once into all six layers of a cube
//!   target using a multiview fan-out keyed by face index.
//! - `equirect`: the cube is resampled into a 2:1 panoramic image.
//!
//! `preview` then blits the panorama onto the window. Each renderer owns its GPU
//! resources (pipelines, buffers, bind groups).
//!
//! Convention:
//! - World space is right-handed, +Y up.
//! - Cube faces are ordered +X, -X, +Y, -Y, +Z, -Z and map to texture layers 0..5.

pub mod capture;
mod common;
mod ctx;
pub mod equirect;
pub mod mesh;
pub mod preview;
mod shader;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{GpuMesh, Mesh, MeshVertex};
