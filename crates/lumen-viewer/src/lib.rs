//! Render-mode viewer: draws a trapezoid with one of seven primitive
//! topologies, switchable from the keyboard.

pub mod application;
pub mod config;
pub mod headless;
pub mod keys;
pub mod render_mode;
pub mod shaders;
pub mod viewer;

pub use application::{AppSettings, AppState, Application, InitError};
pub use config::{Invocation, ViewerConfig};
pub use render_mode::RenderMode;
pub use viewer::ViewerApp;
