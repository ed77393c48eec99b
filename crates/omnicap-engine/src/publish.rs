//! Hand-off of each finished panorama to an external consumer.
//!
//! After every successful frame the pipeline calls [`PublishSink::publish`]
//! with a view of the equirect texture. The sink is invoked after the frame's
//! GPU work has been submitted, so anything it records on the same queue is
//! ordered after the reprojection.

use crate::render::equirect::{EquirectSize, EquirectTarget};

/// One published panorama.
pub struct PublishedFrame<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub target: &'a EquirectTarget,
    /// Monotonic index of successful captures.
    pub frame_index: u64,
}

impl PublishedFrame<'_> {
    #[inline]
    pub fn size(&self) -> EquirectSize {
        self.target.size()
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        self.target.texture()
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        self.target.view()
    }
}

/// Receives every finished panorama.
pub trait PublishSink {
    fn publish(&mut self, frame: &PublishedFrame<'_>);
}

impl<F> PublishSink for F
where
    F: FnMut(&PublishedFrame<'_>),
{
    fn publish(&mut self, frame: &PublishedFrame<'_>) {
        self(frame)
    }
}

/// Sink that drops every frame.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullSink;

impl PublishSink for NullSink {
    fn publish(&mut self, _frame: &PublishedFrame<'_>) {}
}

/// Sink that announces a named stream and logs periodic heartbeats.
#[derive(Debug)]
pub struct NamedSink {
    name: String,
    published: u64,
    last_size: Option<EquirectSize>,
}

impl NamedSink {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        log::info!("publishing panorama stream \"{name}\"");
        Self {
            name,
            published: 0,
            last_size: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl PublishSink for NamedSink {
    fn publish(&mut self, frame: &PublishedFrame<'_>) {
        let size = frame.size();
        if self.last_size != Some(size) {
            log::info!("stream \"{}\" now {size}", self.name);
            self.last_size = Some(size);
        }
        self.published += 1;
        if self.published % 600 == 0 {
            log::debug!("stream \"{}\": {} frames published", self.name, self.published);
        }
    }
}
