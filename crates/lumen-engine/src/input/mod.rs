//! Keyboard input.
//!
//! Public API does not expose winit types; the runtime translates platform
//! key events into `KeyEvent`s through `platform::winit`.

pub(crate) mod platform;
mod types;

pub use types::{Key, KeyEvent, KeyState};
