//! WGSL loading with up-front validation.
//!
//! `wgpu` reports shader problems through the device error callback, which by
//! default panics and carries no stage information. Modules are therefore parsed
//! and validated with `naga` before they reach the device, so a bad shader turns
//! into a typed [`CaptureError`] at startup.

use crate::error::{CaptureError, Result, ShaderStage};

/// Parses and validates `source`, then checks that every entry point in
/// `entry_points` exists.
///
/// Parse failures map to [`CaptureError::ShaderCompile`]; validation failures
/// and missing entry points map to [`CaptureError::ShaderLink`].
pub(crate) fn validate_wgsl(stage: ShaderStage, source: &str, entry_points: &[&str]) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| CaptureError::ShaderCompile {
        stage,
        message: e.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::MULTIVIEW,
    );
    validator
        .validate(&module)
        .map_err(|e| CaptureError::ShaderLink {
            stage,
            message: e.emit_to_string(source),
        })?;

    for name in entry_points {
        if !module.entry_points.iter().any(|ep| ep.name == *name) {
            return Err(CaptureError::ShaderLink {
                stage,
                message: format!("missing entry point `{name}`"),
            });
        }
    }
    Ok(())
}

/// Validates `source` and creates the device-side module.
pub(crate) fn create_module(
    device: &wgpu::Device,
    stage: ShaderStage,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule> {
    validate_wgsl(stage, source, &["vs_main", "fs_main"])?;
    log::debug!("{stage} shader validated");

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}

pub(crate) const CAPTURE_WGSL: &str = include_str!("shaders/capture.wgsl");
pub(crate) const EQUIRECT_WGSL: &str = include_str!("shaders/equirect.wgsl");
pub(crate) const PREVIEW_WGSL: &str = include_str!("shaders/preview.wgsl");
