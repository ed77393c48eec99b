//! On-demand PNG export of the panorama.
//!
//! The GPU readback happens on the calling thread (it has to, the device is
//! not shared); PNG encoding and the file write run on a short-lived worker
//! thread so the frame loop only pays for the copy.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use chrono::{DateTime, Local};
use half::f16;

use crate::error::ExportError;
use crate::render::equirect::{EquirectTarget, EQUIRECT_FORMAT};

const BYTES_PER_TEXEL: u32 = 8;

/// Linear RGBA texels, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaPixels {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl PanoramaPixels {
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[(y * self.width + x) as usize]
    }

    /// Texel nearest to an equirect coordinate (`v = 1` is the top row).
    pub fn sample_uv(&self, u: f32, v: f32) -> [f32; 4] {
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = (((1.0 - v) * self.height as f32) as u32).min(self.height - 1);
        self.texel(x, y)
    }

    /// 8-bit RGBA with colors clamped to `0..=1` and opaque alpha.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|t| [unorm8(t[0]), unorm8(t[1]), unorm8(t[2]), 255])
            .collect()
    }
}

/// Export that was read back and handed to the writer thread.
pub struct ExportJob {
    pub path: PathBuf,
    pub handle: JoinHandle<Result<(), ExportError>>,
}

impl ExportJob {
    /// Blocks until the file is written.
    pub fn wait(self) -> Result<PathBuf, ExportError> {
        match self.handle.join() {
            Ok(result) => result.map(|()| self.path),
            Err(_) => Err(ExportError::Readback("export writer thread panicked".into())),
        }
    }
}

/// `equirect_YYYY-MM-DD-HH-MM-SS-mmm.png`
pub fn timestamped_file_name(now: DateTime<Local>) -> String {
    format!("equirect_{}.png", now.format("%Y-%m-%d-%H-%M-%S-%3f"))
}

/// Copies the equirect texture back to the CPU.
///
/// Blocks until the GPU has finished all submitted work touching the target.
pub fn read_pixels(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &EquirectTarget,
) -> Result<PanoramaPixels, ExportError> {
    let size = target.size();
    let (width, height) = (size.width(), size.height());

    if target.texture().format() != EQUIRECT_FORMAT {
        return Err(ExportError::Readback(format!(
            "unexpected texture format {:?}",
            target.texture().format()
        )));
    }

    let tight_bpr = width * BYTES_PER_TEXEL;
    let padded_bpr = align_bytes_per_row(tight_bpr);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("omnicap export staging"),
        size: padded_bpr as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("omnicap export encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: target.texture(),
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| ExportError::Readback(e.to_string()))?;
    rx.recv()
        .map_err(|_| ExportError::Readback("map callback dropped".into()))?
        .map_err(|e| ExportError::Readback(e.to_string()))?;

    let data = slice.get_mapped_range();
    let mut texels = Vec::with_capacity(width as usize * height as usize);
    for row in 0..height as usize {
        let start = row * padded_bpr as usize;
        let bytes = &data[start..start + tight_bpr as usize];
        texels.extend(bytes.chunks_exact(BYTES_PER_TEXEL as usize).map(decode_texel));
    }
    drop(data);
    staging.unmap();

    Ok(PanoramaPixels {
        width,
        height,
        texels,
    })
}

/// Reads the target back and writes it to `dir` under a timestamped name on a
/// worker thread.
pub fn export_png(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &EquirectTarget,
    dir: &Path,
) -> Result<ExportJob, ExportError> {
    let pixels = read_pixels(device, queue, target)?;
    let path = dir.join(timestamped_file_name(Local::now()));

    let job_path = path.clone();
    let handle = std::thread::Builder::new()
        .name("omnicap-export".into())
        .spawn(move || {
            let result = write_png(&job_path, &pixels);
            match &result {
                Ok(()) => log::info!("exported {}", job_path.display()),
                Err(e) => log::error!("{e}"),
            }
            result
        })
        .map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

    Ok(ExportJob { path, handle })
}

/// Encodes `pixels` as 8-bit RGBA PNG at `path`.
pub fn write_png(path: &Path, pixels: &PanoramaPixels) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    image::save_buffer_with_format(
        path,
        &pixels.to_rgba8(),
        pixels.width,
        pixels.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|source| ExportError::Image {
        path: path.to_path_buf(),
        source,
    })
}

fn align_bytes_per_row(bytes: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    bytes.div_ceil(align) * align
}

fn decode_texel(bytes: &[u8]) -> [f32; 4] {
    let channel = |i: usize| f16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]).to_f32();
    [channel(0), channel(1), channel(2), channel(3)]
}

fn unorm8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ── naming ───────────────────────────────────────────────────────────

    #[test]
    fn file_name_has_millisecond_timestamp() {
        let t = Local
            .with_ymd_and_hms(2026, 3, 7, 9, 5, 2)
            .single()
            .unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(timestamped_file_name(t), "equirect_2026-03-07-09-05-02-042.png");
    }

    // ── conversion ───────────────────────────────────────────────────────

    #[test]
    fn rows_padded_to_copy_alignment() {
        assert_eq!(align_bytes_per_row(8), 256);
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(4096 * 8), 4096 * 8);
        assert_eq!(align_bytes_per_row(100 * 8), 1024);
    }

    #[test]
    fn half_texels_decode() {
        let mut bytes = Vec::new();
        for v in [0.5f32, 1.0, 2.0, 1.0] {
            bytes.extend_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        assert_eq!(decode_texel(&bytes), [0.5, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn rgba8_clamps_and_forces_opaque() {
        let px = PanoramaPixels {
            width: 2,
            height: 1,
            texels: vec![[2.0, -1.0, 0.5, 0.25], [f32::NAN, 0.0, 1.0, 0.0]],
        };
        assert_eq!(px.to_rgba8(), vec![255, 0, 128, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn uv_sampling_uses_top_row_for_high_v() {
        let px = PanoramaPixels {
            width: 2,
            height: 2,
            texels: vec![[1.0; 4], [2.0; 4], [3.0; 4], [4.0; 4]],
        };
        assert_eq!(px.sample_uv(0.25, 0.75), [1.0; 4]);
        assert_eq!(px.sample_uv(0.75, 0.25), [4.0; 4]);
        assert_eq!(px.sample_uv(1.0, 0.0), [4.0; 4]);
    }

    // ── file output ──────────────────────────────────────────────────────

    #[test]
    fn png_written_with_expected_dimensions() {
        let dir = std::env::temp_dir().join(format!("omnicap-export-{}", std::process::id()));
        let path = dir.join("out.png");
        let px = PanoramaPixels {
            width: 4,
            height: 2,
            texels: vec![[0.0, 0.2, 0.4, 1.0]; 8],
        };
        write_png(&path, &px).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (4, 2));
        assert_eq!(img.get_pixel(3, 1).0, [0, 51, 102, 255]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
