mod app;
mod spheres;

use std::path::PathBuf;

use anyhow::Result;
use winit::dpi::PhysicalSize;

use omnicap_engine::CaptureConfig;
use omnicap_engine::device::GpuInit;
use omnicap_engine::logging::{init_logging, LoggingConfig};
use omnicap_engine::window::{Runtime, RuntimeConfig};

use app::StudioApp;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let runtime = RuntimeConfig {
        title: "omnicap".to_string(),
        initial_size: PhysicalSize::new(2048, 1024),
    };

    // The panorama holds linear values; present them unencoded so the preview
    // matches the exported PNG.
    let gpu_init = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    log::info!("S: export PNG  Esc: quit");
    Runtime::run(
        runtime,
        gpu_init,
        StudioApp::new(CaptureConfig::default(), PathBuf::from(".")),
    )
}
