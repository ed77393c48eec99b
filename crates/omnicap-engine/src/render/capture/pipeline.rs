use std::num::NonZeroU32;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::error::{Result, ShaderStage};
use crate::paint::Color;
use crate::render::common::uniform_entry;
use crate::render::mesh::{GpuMesh, MeshVertex};
use crate::render::shader::{create_module, CAPTURE_WGSL};
use crate::scene::DrawList;

use super::lighting::{LightingParams, LightingUniform};
use super::target::{CubeCaptureTarget, CUBE_COLOR_FORMAT, CUBE_DEPTH_FORMAT};
use super::views::{FaceViewSet, FACE_COUNT};

/// One bit per cube face: every draw is broadcast to all six layers.
const FACE_MASK: u32 = (1 << FACE_COUNT) - 1;

/// Lifecycle of one capture pass.
///
/// `Idle -> Bound -> Shading -> Submitted -> Idle`. Dropping a pass early
/// (from `Bound` or `Shading`) also returns to `Idle`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Layered attachments bound and cleared.
    Bound,
    /// Pipeline, uniforms and instance data bound; draws may be recorded.
    Shading,
    /// All draws recorded.
    Submitted,
}

impl CaptureState {
    pub fn can_transition(self, next: CaptureState) -> bool {
        use CaptureState::*;
        matches!(
            (self, next),
            (Idle, Bound) | (Bound, Shading) | (Shading, Submitted) | (_, Idle)
        ) && self != next
    }

    fn advance(&mut self, next: CaptureState) {
        debug_assert!(self.can_transition(next), "capture state {self:?} -> {next:?}");
        log::trace!("capture state {self:?} -> {next:?}");
        *self = next;
    }
}

/// Multiview capture pipeline.
///
/// Owns the uniform blocks for the face views and lighting, plus a per-draw
/// instance buffer carrying model matrices. Depth testing is part of this
/// pipeline only; the reprojection and preview passes run without depth.
pub struct CapturePipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    views_ubo: wgpu::Buffer,
    lighting_ubo: wgpu::Buffer,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,

    state: CaptureState,
}

impl CapturePipeline {
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        let shader = create_module(
            device,
            ShaderStage::Capture,
            "omnicap capture shader",
            CAPTURE_WGSL,
        )?;

        let stages = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("omnicap capture bgl"),
            entries: &[
                uniform_entry::<ViewsUniform>(0, stages),
                uniform_entry::<LightingUniform>(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("omnicap capture pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("omnicap capture pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), ModelInstance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: CUBE_COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            // The face projection flips Y, which flips winding.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: CUBE_DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: NonZeroU32::new(FACE_MASK),
            cache: None,
        });

        let views_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("omnicap capture views ubo"),
            size: std::mem::size_of::<ViewsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lighting_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("omnicap capture lighting ubo"),
            size: std::mem::size_of::<LightingUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("omnicap capture bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: views_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_ubo.as_entire_binding(),
                },
            ],
        });

        Ok(Self {
            pipeline,
            bind_group,
            views_ubo,
            lighting_ubo,
            instance_vbo: None,
            instance_capacity: 0,
            state: CaptureState::Idle,
        })
    }

    #[inline]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Uploads the shared projection and the six face views.
    pub fn write_views(&self, queue: &wgpu::Queue, projection: Mat4, views: &FaceViewSet) {
        let u = ViewsUniform::new(projection, views);
        queue.write_buffer(&self.views_ubo, 0, bytemuck::bytes_of(&u));
    }

    pub fn write_lighting(&self, queue: &wgpu::Queue, lighting: &LightingParams) {
        queue.write_buffer(&self.lighting_ubo, 0, bytemuck::bytes_of(&lighting.to_uniform()));
    }

    /// Records the whole capture: uploads model matrices, opens the layered
    /// pass, draws every item once, and closes the pass.
    ///
    /// Every layer is cleared first, so an empty draw list yields six layers
    /// of `clear`.
    pub fn capture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &CubeCaptureTarget,
        draws: &DrawList<'_>,
        clear: Color,
    ) {
        self.upload_instances(device, queue, draws);

        let mut pass = self.begin(encoder, target, clear);
        for (i, item) in draws.iter().enumerate() {
            pass.draw(item.mesh, i as u32);
        }
        pass.finish();
    }

    /// Opens the layered pass. The returned guard ends the pass (and releases
    /// the depth attachment) when dropped.
    pub fn begin<'p>(
        &'p mut self,
        encoder: &'p mut wgpu::CommandEncoder,
        target: &CubeCaptureTarget,
        clear: Color,
    ) -> CapturePass<'p> {
        let Self {
            pipeline,
            bind_group,
            instance_vbo,
            state,
            ..
        } = self;

        if *state != CaptureState::Idle {
            log::warn!("capture pass opened from {state:?}; resetting");
            *state = CaptureState::Idle;
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("omnicap capture pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_layers(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_layers(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: NonZeroU32::new(FACE_MASK),
        });
        state.advance(CaptureState::Bound);

        let face = target.face_size() as f32;
        pass.set_viewport(0.0, 0.0, face, face, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &*bind_group, &[]);
        if let Some(vbo) = instance_vbo.as_ref() {
            pass.set_vertex_buffer(1, vbo.slice(..));
        }
        state.advance(CaptureState::Shading);

        CapturePass { pass, state }
    }

    fn upload_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, draws: &DrawList<'_>) {
        if draws.is_empty() {
            return;
        }
        self.ensure_instance_capacity(device, draws.len());
        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };

        let raw: Vec<ModelInstance> = draws.iter().map(|d| ModelInstance::new(d.model)).collect();
        queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<ModelInstance>()) as u64;

        self.instance_vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("omnicap capture instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

/// Open capture pass. Ends the render pass on drop.
pub struct CapturePass<'p> {
    pass: wgpu::RenderPass<'p>,
    state: &'p mut CaptureState,
}

impl CapturePass<'_> {
    /// Draws `mesh` with the model matrix uploaded at `instance`.
    pub fn draw(&mut self, mesh: &GpuMesh, instance: u32) {
        self.pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
        self.pass
            .set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
        self.pass
            .draw_indexed(0..mesh.index_count(), 0, instance..instance + 1);
    }

    pub fn finish(self) {
        self.state.advance(CaptureState::Submitted);
    }
}

impl Drop for CapturePass<'_> {
    fn drop(&mut self) {
        self.state.advance(CaptureState::Idle);
    }
}

/// std140 image of `CaptureUniforms` in `capture.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewsUniform {
    proj: [[f32; 4]; 4],
    views: [[[f32; 4]; 4]; FACE_COUNT],
    eye: [f32; 4],
}

impl ViewsUniform {
    fn new(projection: Mat4, views: &FaceViewSet) -> Self {
        Self {
            proj: projection.to_cols_array_2d(),
            views: (*views.views()).map(|v| v.to_cols_array_2d()),
            eye: views.origin().extend(1.0).to_array(),
        }
    }
}

/// Per-draw model matrix, one column per attribute.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ModelInstance {
    cols: [[f32; 4]; 4],
}

impl ModelInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4
    ];

    fn new(model: Mat4) -> Self {
        Self {
            cols: model.to_cols_array_2d(),
        }
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}
