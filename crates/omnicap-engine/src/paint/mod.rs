//! Color values shared by the capture pipeline, lighting and the preview.

pub mod color;

pub use color::Color;
