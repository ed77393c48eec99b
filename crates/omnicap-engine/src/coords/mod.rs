//! Window-space geometry shared by the preview and the runtime.
//!
//! Canonical space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down

mod rect;
mod viewport;

pub use rect::Rect;
pub use viewport::Viewport;
