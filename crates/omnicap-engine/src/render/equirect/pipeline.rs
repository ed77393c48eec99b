use bytemuck::{Pod, Zeroable};

use crate::error::{Result, ShaderStage};
use crate::render::capture::CubeCaptureTarget;
use crate::render::common::{
    fullscreen_primitive, linear_clamp_sampler, sampler_entry, texture_entry, uniform_entry,
};
use crate::render::shader::{create_module, EQUIRECT_WGSL};

use super::target::{EquirectSize, EquirectTarget, EQUIRECT_FORMAT};

/// Full-screen reprojection from the cube target into the equirect target.
///
/// Runs without depth; every output texel is written exactly once.
pub struct EquirectPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    params_ubo: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl EquirectPipeline {
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        let shader = create_module(
            device,
            ShaderStage::Equirect,
            "omnicap equirect shader",
            EQUIRECT_WGSL,
        )?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("omnicap equirect bgl"),
            entries: &[
                uniform_entry::<ParamsUniform>(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::Cube),
                sampler_entry(2),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("omnicap equirect pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("omnicap equirect pipeline"),
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
                    format: EQUIRECT_FORMAT,
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

        let params_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("omnicap equirect params ubo"),
            size: std::mem::size_of::<ParamsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
            params_ubo,
            sampler: linear_clamp_sampler(device, "omnicap cube sampler"),
        })
    }

    /// Binds `cube` as the sampling source. Call again after the cube target
    /// is reallocated.
    pub fn bind_source(&mut self, device: &wgpu::Device, cube: &CubeCaptureTarget) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("omnicap equirect bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(cube.cube_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
    }

    /// Uploads the one-texel clamp margin for `size`.
    pub fn write_output_size(&self, queue: &wgpu::Queue, size: EquirectSize) {
        let texel = size.texel();
        let u = ParamsUniform {
            texel: [texel.x, texel.y, 0.0, 0.0],
        };
        queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&u));
    }

    /// Records the reprojection pass into `target`.
    pub fn record(&self, encoder: &mut wgpu::CommandEncoder, target: &EquirectTarget) {
        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("equirect pass skipped: no cube source bound");
            return;
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("omnicap equirect pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let size = target.size();
        rpass.set_viewport(0.0, 0.0, size.width() as f32, size.height() as f32, 0.0, 1.0);
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ParamsUniform {
    texel: [f32; 4],
}
