//! Scene contribution interface.
//!
//! The capture pipeline does not know what it draws. Once per frame it asks a
//! [`SceneProvider`] to fill a [`DrawList`] of (model matrix, mesh) pairs, then
//! renders that list into every cube face in a single pass. Providers see the
//! list only; pipeline state is never exposed to them.

mod list;

pub use list::{DrawItem, DrawList};

/// Supplies geometry for one capture.
pub trait SceneProvider {
    /// Appends this frame's drawables. `time` is seconds since startup.
    ///
    /// Drawables pushed here are rendered into all six faces exactly once.
    fn contribute<'a>(&'a self, time: f32, draws: &mut DrawList<'a>);
}

/// Scene with no geometry; captures come out as the clear color.
#[derive(Debug, Default, Copy, Clone)]
pub struct EmptyScene;

impl SceneProvider for EmptyScene {
    fn contribute<'a>(&'a self, _time: f32, _draws: &mut DrawList<'a>) {}
}
