//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code is responsible for translating platform events into `InputEvent`s.
//! Only keyboard and focus input are tracked; the preview window has no pointer UI.

mod event;
mod frame;
mod state;

pub use frame::InputFrame;
pub use state::InputState;
pub use event::{InputEvent, Key, KeyState, Modifiers};
