//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//!
//! `HeadlessGpu` covers the same device setup without a window, for offline
//! capture and tests.

mod gpu;
mod headless;
mod init;

pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use headless::HeadlessGpu;
pub use init::GpuInit;
