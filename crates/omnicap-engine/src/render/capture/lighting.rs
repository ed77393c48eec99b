use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::paint::Color;

/// Point light + material for the capture shader.
///
/// Lighting is Blinn-Phong against a single point light with
/// `1 / (1 + falloff * d²)` attenuation; the eye is the capture origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightingParams {
    pub light_position: Vec3,
    pub light_color: Vec3,
    pub ambient: Vec3,
    pub base_color: Color,
    pub specular_power: f32,
    pub specular_strength: f32,
    pub falloff: f32,
}

impl Default for LightingParams {
    fn default() -> Self {
        Self {
            light_position: Vec3::ZERO,
            light_color: Vec3::splat(2.0),
            ambient: Vec3::splat(0.04),
            base_color: Color::WHITE,
            specular_power: 32.0,
            specular_strength: 0.25,
            falloff: 0.001,
        }
    }
}

impl LightingParams {
    pub(crate) fn to_uniform(&self) -> LightingUniform {
        LightingUniform {
            light_pos: self.light_position.extend(1.0).to_array(),
            light_color: self.light_color.extend(0.0).to_array(),
            ambient: self.ambient.extend(0.0).to_array(),
            base_color: self.base_color.to_array(),
            params: [
                self.specular_power,
                self.specular_strength,
                self.falloff.max(0.0),
                0.0,
            ],
        }
    }
}

/// std140 image of the `Lighting` block in `capture.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct LightingUniform {
    pub light_pos: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    pub base_color: [f32; 4],
    pub params: [f32; 4],
}
