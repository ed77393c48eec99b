use anyhow::{Context, Result};

use crate::error::CaptureError;

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is vsync and broadly supported.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// The single-pass cube capture relies on `MULTIVIEW`; it is always requested
    /// in addition to whatever is listed here.
    pub required_features: wgpu::Features,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            desired_maximum_frame_latency: 2,
        }
    }
}

impl GpuInit {
    /// Features requested from the adapter.
    pub fn features(&self) -> wgpu::Features {
        self.required_features | wgpu::Features::MULTIVIEW
    }
}

/// Requests a device from `adapter` with the features the capture pipeline needs.
///
/// The adapter's own limits are requested so multiview view counts and large
/// face sizes are available wherever the hardware allows them.
pub(crate) async fn request_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let wanted = init.features();
    let missing = wanted.difference(adapter.features());
    if !missing.is_empty() {
        return Err(CaptureError::MissingFeature(missing).into());
    }

    let info = adapter.get_info();
    log::info!(
        "using adapter '{}' ({:?}, {:?})",
        info.name,
        info.device_type,
        info.backend
    );

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("omnicap device"),
            required_features: wanted,
            required_limits: adapter.limits(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")
}
