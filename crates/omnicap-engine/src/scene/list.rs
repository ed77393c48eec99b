use glam::Mat4;

use crate::render::GpuMesh;

/// A single drawable: world transform + mesh.
#[derive(Clone, Copy)]
pub struct DrawItem<'a> {
    pub model: Mat4,
    pub mesh: &'a GpuMesh,
}

/// Drawables recorded for one capture, in submission order.
///
/// Draw order carries no meaning for the result (depth testing resolves
/// visibility), but it is preserved so instance slots are deterministic.
#[derive(Default)]
pub struct DrawList<'a> {
    items: Vec<DrawItem<'a>>,
}

impl<'a> DrawList<'a> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn push(&mut self, model: Mat4, mesh: &'a GpuMesh) {
        self.items.push(DrawItem { model, mesh });
    }

    #[inline]
    pub fn items(&self) -> &[DrawItem<'a>] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &DrawItem<'a>> {
        self.items.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
