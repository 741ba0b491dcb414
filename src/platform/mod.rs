//! Platform abstraction layer
//!
//! Narrow interfaces to the outside world:
//! - Render target (sprites, text, debug outlines)
//! - Pointer/touch input and screen-to-world unprojection
//! - Orthographic camera
//!
//! `headless` provides recording/scripted implementations used by the native
//! binary and the tests.

pub mod camera;
pub mod headless;
pub mod input;
pub mod render;

pub use camera::Camera;
pub use headless::{DrawCall, RecordingTarget, ScriptedInput};
pub use input::{InputDevice, PressLatch};
pub use render::{Color, RenderTarget, Sprite, TextureId};
