//! On-screen preview of the panorama.
//!
//! The panorama is blitted into the largest centred 2:1 rectangle that fits
//! the window; the rest of the surface keeps the frame's background clear.

use crate::coords::Rect;
use crate::error::{Result, ShaderStage};
use crate::render::common::{fullscreen_primitive, linear_clamp_sampler, sampler_entry, texture_entry};
use crate::render::equirect::EquirectTarget;
use crate::render::shader::{validate_wgsl, PREVIEW_WGSL};
use crate::render::{RenderCtx, RenderTarget};

/// Letterboxed blit. The pipeline is built lazily for the surface format.
#[derive(Default)]
pub struct PreviewRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    bound_generation: Option<u64>,
    sampler: Option<wgpu::Sampler>,
}

impl PreviewRenderer {
    /// Validates the preview shader so a broken module fails at startup rather
    /// than on the first frame.
    pub fn new() -> Result<Self> {
        validate_wgsl(ShaderStage::Preview, PREVIEW_WGSL, &["vs_main", "fs_main"])?;
        Ok(Self::default())
    }

    /// Draws `source` letterboxed into `target`. Returns the rectangle used,
    /// in physical pixels, or `None` when the viewport is empty.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        source: &EquirectTarget,
    ) -> Option<Rect> {
        let rect = ctx.viewport.letterbox(source.size().aspect());
        if rect.is_empty() {
            return None;
        }

        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx, source);

        let pipeline = self.pipeline.as_ref()?;
        let bind_group = self.bind_group.as_ref()?;

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("omnicap preview pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(rect.origin.x, rect.origin.y, rect.size.x, rect.size.y, 0.0, 1.0);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);

        Some(rect)
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        // Already validated in `new`.
        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("omnicap preview shader"),
            source: wgpu::ShaderSource::Wgsl(PREVIEW_WGSL.into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("omnicap preview bgl"),
                    entries: &[
                        texture_entry(0, wgpu::TextureViewDimension::D2),
                        sampler_entry(1),
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("omnicap preview pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("omnicap preview pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: fullscreen_primitive(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.bound_generation = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>, source: &EquirectTarget) {
        if self.bind_group.is_some() && self.bound_generation == Some(source.generation()) {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_clamp_sampler(ctx.device, "omnicap preview sampler"));

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("omnicap preview bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
        self.bound_generation = Some(source.generation());
    }
}
