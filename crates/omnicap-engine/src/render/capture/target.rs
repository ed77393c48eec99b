//! Six-layer color + depth target written by the capture pass.

use crate::error::ResourceValidationError;

use super::views::FACE_COUNT;

pub const CUBE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const CUBE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Shape of one layered attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttachmentDesc {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: wgpu::TextureFormat,
}

impl AttachmentDesc {
    fn of(texture: &wgpu::Texture) -> Self {
        Self {
            width: texture.width(),
            height: texture.height(),
            layers: texture.depth_or_array_layers(),
            format: texture.format(),
        }
    }

    fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.layers,
        }
    }
}

/// Color/depth pair that must stay compatible for a layered pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CubeTargetDesc {
    pub color: AttachmentDesc,
    pub depth: AttachmentDesc,
}

impl CubeTargetDesc {
    pub fn new(face_size: u32) -> Self {
        Self {
            color: AttachmentDesc {
                width: face_size,
                height: face_size,
                layers: FACE_COUNT as u32,
                format: CUBE_COLOR_FORMAT,
            },
            depth: AttachmentDesc {
                width: face_size,
                height: face_size,
                layers: FACE_COUNT as u32,
                format: CUBE_DEPTH_FORMAT,
            },
        }
    }

    #[inline]
    pub fn face_size(&self) -> u32 {
        self.color.width
    }

    /// Checks the pair is complete: six square layers on both attachments,
    /// matching extents, a renderable color format, a depth format, and a
    /// face size within `max_dimension`.
    pub fn validate(&self, max_dimension: u32) -> Result<(), ResourceValidationError> {
        let (c, d) = (&self.color, &self.depth);

        if c.width == 0 || c.height == 0 || d.width == 0 || d.height == 0 {
            return Err(ResourceValidationError::ZeroFaceSize);
        }
        if c.width != c.height {
            return Err(ResourceValidationError::NonSquareFace {
                width: c.width,
                height: c.height,
            });
        }
        if c.width > max_dimension {
            return Err(ResourceValidationError::FaceSizeExceedsLimit {
                size: c.width,
                limit: max_dimension,
            });
        }
        if c.layers != FACE_COUNT as u32 {
            return Err(ResourceValidationError::ColorLayerCount(c.layers));
        }
        if d.layers != c.layers {
            return Err(ResourceValidationError::LayerCountMismatch {
                color: c.layers,
                depth: d.layers,
            });
        }
        if (c.width, c.height) != (d.width, d.height) {
            return Err(ResourceValidationError::ExtentMismatch {
                color_w: c.width,
                color_h: c.height,
                depth_w: d.width,
                depth_h: d.height,
            });
        }
        if !is_renderable_color(c.format) {
            return Err(ResourceValidationError::ColorFormat(c.format));
        }
        if !d.format.has_depth_aspect() {
            return Err(ResourceValidationError::DepthFormat(d.format));
        }
        Ok(())
    }
}

fn is_renderable_color(format: wgpu::TextureFormat) -> bool {
    let features = format.guaranteed_format_features(wgpu::Features::empty());
    !format.has_depth_aspect()
        && !format.has_stencil_aspect()
        && features
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING)
}

/// Allocated cube target.
///
/// Holds two views of the color texture: a 2D-array view used as the
/// multiview attachment, and a cube view used for sampling.
pub struct CubeCaptureTarget {
    desc: CubeTargetDesc,
    max_dimension: u32,

    color: wgpu::Texture,
    depth: wgpu::Texture,

    color_layers: wgpu::TextureView,
    depth_layers: wgpu::TextureView,
    cube_view: wgpu::TextureView,
}

impl CubeCaptureTarget {
    /// Validates and allocates a target with `face_size` square faces.
    ///
    /// Nothing is allocated when validation fails.
    pub fn new(device: &wgpu::Device, face_size: u32) -> Result<Self, ResourceValidationError> {
        Self::from_desc(device, CubeTargetDesc::new(face_size))
    }

    pub fn from_desc(
        device: &wgpu::Device,
        desc: CubeTargetDesc,
    ) -> Result<Self, ResourceValidationError> {
        let max_dimension = device.limits().max_texture_dimension_2d;
        desc.validate(max_dimension)?;
        Ok(Self::allocate(device, desc, max_dimension))
    }

    /// Allocates `desc` as given, so tests can hold an incomplete target.
    /// Every view created here stays valid for any six-layer pair.
    #[cfg(test)]
    pub(crate) fn allocate_unchecked(device: &wgpu::Device, desc: CubeTargetDesc) -> Self {
        let max_dimension = device.limits().max_texture_dimension_2d;
        Self::allocate(device, desc, max_dimension)
    }

    fn allocate(device: &wgpu::Device, desc: CubeTargetDesc, max_dimension: u32) -> Self {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("omnicap cube color"),
            size: desc.color.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.color.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("omnicap cube depth"),
            size: desc.depth.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.depth.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let layers = Some(FACE_COUNT as u32);
        let color_layers = color.create_view(&wgpu::TextureViewDescriptor {
            label: Some("omnicap cube color layers"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            array_layer_count: layers,
            ..Default::default()
        });
        let depth_layers = depth.create_view(&wgpu::TextureViewDescriptor {
            label: Some("omnicap cube depth layers"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            array_layer_count: layers,
            ..Default::default()
        });
        let cube_view = color.create_view(&wgpu::TextureViewDescriptor {
            label: Some("omnicap cube sample view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: layers,
            ..Default::default()
        });

        log::info!(
            "cube target allocated: {0}x{0} x{1} layers ({2:?} + {3:?})",
            desc.face_size(),
            FACE_COUNT,
            desc.color.format,
            desc.depth.format
        );

        Self {
            desc,
            max_dimension,
            color,
            depth,
            color_layers,
            depth_layers,
            cube_view,
        }
    }

    /// Re-validates the attachments as allocated, before they are bound for
    /// a frame.
    pub fn check_complete(&self) -> Result<(), ResourceValidationError> {
        let live = CubeTargetDesc {
            color: AttachmentDesc::of(&self.color),
            depth: AttachmentDesc::of(&self.depth),
        };
        live.validate(self.max_dimension)
    }

    #[inline]
    pub fn desc(&self) -> &CubeTargetDesc {
        &self.desc
    }

    #[inline]
    pub fn face_size(&self) -> u32 {
        self.desc.face_size()
    }

    /// Layered color attachment (all six faces).
    #[inline]
    pub fn color_layers(&self) -> &wgpu::TextureView {
        &self.color_layers
    }

    /// Layered depth attachment (all six faces).
    #[inline]
    pub fn depth_layers(&self) -> &wgpu::TextureView {
        &self.depth_layers
    }

    /// Cube view over the color layers, for sampling.
    #[inline]
    pub fn cube_view(&self) -> &wgpu::TextureView {
        &self.cube_view
    }
}
