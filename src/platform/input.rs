//! Pointer/touch input

use glam::Vec2;

use super::Camera;

/// A pointer or touch device
pub trait InputDevice {
    /// Latch device state for this frame. Called once per frame.
    fn poll(&mut self) {}

    /// True while the pointer/touch is held down
    fn is_pressed(&self) -> bool;

    /// Pointer position in screen pixels (origin top-left)
    fn pointer(&self) -> Vec2;

    /// Pointer position in world units
    fn unproject(&self, camera: &Camera) -> Vec2 {
        camera.unproject(self.pointer())
    }
}

/// Edge detector that turns a held input into a single press
///
/// Rearms only on a frame where the input is released.
#[derive(Debug, Clone)]
pub struct PressLatch {
    ready: bool,
}

impl Default for PressLatch {
    fn default() -> Self {
        Self { ready: true }
    }
}

impl PressLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed this frame's pressed state; true on a fresh press
    pub fn sample(&mut self, pressed: bool) -> bool {
        if !pressed {
            self.ready = true;
            return false;
        }
        if self.ready {
            self.ready = false;
            return true;
        }
        false
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}
