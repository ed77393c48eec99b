use glam::{UVec2, Vec2};

use crate::error::{CaptureError, Result};

pub const EQUIRECT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Output size of the panorama. Always exactly 2:1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct EquirectSize {
    width: u32,
    height: u32,
}

impl EquirectSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if height == 0 || width != height.saturating_mul(2) {
            return Err(CaptureError::InvalidOutputSize { width, height });
        }
        Ok(Self { width, height })
    }

    /// `2 * height` by `height`.
    pub fn from_height(height: u32) -> Result<Self> {
        Self::new(height.saturating_mul(2), height)
    }

    /// Size that keeps roughly one output texel per cube texel at the equator.
    pub fn for_face_size(face_size: u32) -> Result<Self> {
        Self::from_height(face_size.saturating_mul(2))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn as_uvec2(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }

    /// One texel in uv units.
    #[inline]
    pub fn texel(&self) -> Vec2 {
        Vec2::ONE / self.as_uvec2().as_vec2()
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        2.0
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl Default for EquirectSize {
    fn default() -> Self {
        Self {
            width: 4096,
            height: 2048,
        }
    }
}

impl std::fmt::Display for EquirectSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The published panorama texture.
///
/// Sampled by the preview and by consumers, and copied out for export.
pub struct EquirectTarget {
    size: EquirectSize,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    /// Bumped on every reallocation so dependents can rebuild bind groups.
    generation: u64,
}

impl EquirectTarget {
    pub fn new(device: &wgpu::Device, size: EquirectSize) -> Result<Self> {
        let (texture, view) = allocate(device, size)?;
        Ok(Self {
            size,
            texture,
            view,
            generation: 0,
        })
    }

    /// Reallocates when `size` differs from the current size.
    ///
    /// Returns `true` when a new texture was created.
    pub fn ensure_size(&mut self, device: &wgpu::Device, size: EquirectSize) -> Result<bool> {
        if size == self.size {
            return Ok(false);
        }
        let (texture, view) = allocate(device, size)?;
        self.texture = texture;
        self.view = view;
        self.size = size;
        self.generation = self.generation.wrapping_add(1);
        Ok(true)
    }

    #[inline]
    pub fn size(&self) -> EquirectSize {
        self.size
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn allocate(device: &wgpu::Device, size: EquirectSize) -> Result<(wgpu::Texture, wgpu::TextureView)> {
    let limit = device.limits().max_texture_dimension_2d;
    if size.width > limit {
        return Err(CaptureError::InvalidOutputSize {
            width: size.width,
            height: size.height,
        });
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("omnicap equirect"),
        size: size.extent(),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: EQUIRECT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    log::info!("equirect target allocated: {size}");
    Ok((texture, view))
}
