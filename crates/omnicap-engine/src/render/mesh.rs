//! Indexed triangle meshes and their GPU upload.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

/// Vertex layout consumed by the capture pipeline (location 0/1).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// CPU-side mesh. Triangles are counter-clockwise when seen from outside.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Unit icosphere centred at the origin.
    ///
    /// Each subdivision splits every triangle into four and pushes the new
    /// vertices onto the sphere. Normals equal positions.
    pub fn icosphere(subdivisions: u32) -> Self {
        let t = (1.0 + 5.0f32.sqrt()) * 0.5;

        let mut positions: Vec<Vec3> = [
            Vec3::new(-1.0, t, 0.0),
            Vec3::new(1.0, t, 0.0),
            Vec3::new(-1.0, -t, 0.0),
            Vec3::new(1.0, -t, 0.0),
            Vec3::new(0.0, -1.0, t),
            Vec3::new(0.0, 1.0, t),
            Vec3::new(0.0, -1.0, -t),
            Vec3::new(0.0, 1.0, -t),
            Vec3::new(t, 0.0, -1.0),
            Vec3::new(t, 0.0, 1.0),
            Vec3::new(-t, 0.0, -1.0),
            Vec3::new(-t, 0.0, 1.0),
        ]
        .into_iter()
        .map(Vec3::normalize)
        .collect();

        let mut faces: Vec<[u32; 3]> = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        for _ in 0..subdivisions {
            let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
            let mut next = Vec::with_capacity(faces.len() * 4);

            for [a, b, c] in faces {
                let ab = midpoint(&mut positions, &mut midpoints, a, b);
                let bc = midpoint(&mut positions, &mut midpoints, b, c);
                let ca = midpoint(&mut positions, &mut midpoints, c, a);
                next.push([a, ab, ca]);
                next.push([b, bc, ab]);
                next.push([c, ca, bc]);
                next.push([ab, bc, ca]);
            }
            faces = next;
        }

        let vertices = positions
            .iter()
            .map(|p| MeshVertex {
                position: p.to_array(),
                normal: p.to_array(),
            })
            .collect();
        let indices = faces.into_iter().flatten().collect();

        Self { vertices, indices }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn midpoint(
    positions: &mut Vec<Vec3>,
    cache: &mut HashMap<(u32, u32), u32>,
    a: u32,
    b: u32,
) -> u32 {
    let key = if a < b { (a, b) } else { (b, a) };
    *cache.entry(key).or_insert_with(|| {
        let p = (positions[a as usize] + positions[b as usize]).normalize();
        positions.push(p);
        (positions.len() - 1) as u32
    })
}

/// Mesh resident on the GPU.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }

    #[inline]
    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    #[inline]
    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(mesh: &Mesh, i: u32) -> Vec3 {
        Vec3::from_array(mesh.vertices[i as usize].position)
    }

    // ── icosphere topology ───────────────────────────────────────────────

    #[test]
    fn icosahedron_counts() {
        let m = Mesh::icosphere(0);
        assert_eq!(m.vertices.len(), 12);
        assert_eq!(m.triangle_count(), 20);
    }

    #[test]
    fn subdivision_shares_midpoints() {
        for n in 1..=3u32 {
            let m = Mesh::icosphere(n);
            let f = 4usize.pow(n);
            assert_eq!(m.triangle_count(), 20 * f);
            assert_eq!(m.vertices.len(), 10 * f + 2);
        }
    }

    #[test]
    fn indices_in_range() {
        let m = Mesh::icosphere(2);
        let n = m.vertices.len() as u32;
        assert!(m.indices.iter().all(|&i| i < n));
    }

    // ── geometry ─────────────────────────────────────────────────────────

    #[test]
    fn vertices_on_unit_sphere_with_radial_normals() {
        let m = Mesh::icosphere(3);
        for v in &m.vertices {
            let p = Vec3::from_array(v.position);
            assert!((p.length() - 1.0).abs() < 1e-5);
            assert_eq!(v.position, v.normal);
        }
    }

    #[test]
    fn triangles_wind_outward() {
        for n in [0, 2] {
            let m = Mesh::icosphere(n);
            for tri in m.indices.chunks_exact(3) {
                let (a, b, c) = (vertex(&m, tri[0]), vertex(&m, tri[1]), vertex(&m, tri[2]));
                let normal = (b - a).cross(c - a);
                assert!(normal.dot(a + b + c) > 0.0);
            }
        }
    }
}
