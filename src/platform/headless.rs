//! Headless collaborators
//!
//! Cheap clones share the same state, so a caller can hand one copy to the
//! game and keep another to inspect or drive it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::{Mat4, Vec2};

use super::input::InputDevice;
use super::render::{Color, RenderTarget, Sprite, TextureId};

/// A recorded render call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear(Color),
    Begin,
    End,
    Sprite { texture: TextureId, pos: Vec2 },
    Text(String),
    Outline { min: Vec2, max: Vec2 },
}

#[derive(Debug, Default)]
struct Recording {
    calls: Vec<DrawCall>,
    textures: Vec<String>,
    released: Vec<TextureId>,
    projection: Option<Mat4>,
    in_batch: bool,
}

/// Render target that records every call instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingTarget {
    inner: Rc<RefCell<Recording>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded since the last `take_calls`
    pub fn calls(&self) -> Vec<DrawCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<DrawCall> {
        std::mem::take(&mut self.inner.borrow_mut().calls)
    }

    /// Names of every texture loaded so far
    pub fn loaded_textures(&self) -> Vec<String> {
        self.inner.borrow().textures.clone()
    }

    pub fn released_textures(&self) -> Vec<TextureId> {
        self.inner.borrow().released.clone()
    }

    pub fn projection(&self) -> Option<Mat4> {
        self.inner.borrow().projection
    }

    fn record(&self, call: DrawCall) {
        let mut rec = self.inner.borrow_mut();
        if !rec.in_batch && matches!(call, DrawCall::Sprite { .. } | DrawCall::Text(_)) {
            log::warn!("Draw call outside begin/end: {:?}", call);
        }
        rec.calls.push(call);
    }
}

impl RenderTarget for RecordingTarget {
    fn set_projection(&mut self, projection: Mat4) {
        self.inner.borrow_mut().projection = Some(projection);
    }

    fn clear(&mut self, color: Color) {
        self.record(DrawCall::Clear(color));
    }

    fn begin(&mut self) {
        self.inner.borrow_mut().in_batch = true;
        self.record(DrawCall::Begin);
    }

    fn end(&mut self) {
        self.record(DrawCall::End);
        self.inner.borrow_mut().in_batch = false;
    }

    fn draw(&mut self, sprite: &Sprite) {
        self.record(DrawCall::Sprite {
            texture: sprite.texture,
            pos: sprite.pos,
        });
    }

    fn draw_text(&mut self, _pos: Vec2, text: &str) {
        self.record(DrawCall::Text(text.to_string()));
    }

    fn draw_outline(&mut self, min: Vec2, max: Vec2, _color: Color) {
        self.record(DrawCall::Outline { min, max });
    }

    fn load_texture(&mut self, name: &str) -> TextureId {
        let mut rec = self.inner.borrow_mut();
        rec.textures.push(name.to_string());
        TextureId(rec.textures.len() as u32)
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.inner.borrow_mut().released.push(texture);
    }
}

#[derive(Debug, Default)]
struct InputScript {
    pressed: bool,
    pointer: Vec2,
    queued: VecDeque<Option<Vec2>>,
}

/// Input device driven by code
///
/// Either set the state directly (`press`/`release`) or queue one entry per
/// frame; `Some(pos)` is a press at `pos`, `None` a released frame.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    inner: Rc<RefCell<InputScript>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, pointer: Vec2) {
        let mut script = self.inner.borrow_mut();
        script.pressed = true;
        script.pointer = pointer;
    }

    pub fn release(&self) {
        self.inner.borrow_mut().pressed = false;
    }

    pub fn queue<I: IntoIterator<Item = Option<Vec2>>>(&self, frames: I) {
        self.inner.borrow_mut().queued.extend(frames);
    }

    pub fn queued_frames(&self) -> usize {
        self.inner.borrow().queued.len()
    }
}

impl InputDevice for ScriptedInput {
    fn poll(&mut self) {
        let mut script = self.inner.borrow_mut();
        if let Some(frame) = script.queued.pop_front() {
            match frame {
                Some(pointer) => {
                    script.pressed = true;
                    script.pointer = pointer;
                }
                None => script.pressed = false,
            }
        }
    }

    fn is_pressed(&self) -> bool {
        self.inner.borrow().pressed
    }

    fn pointer(&self) -> Vec2 {
        self.inner.borrow().pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_target_shares_state() {
        let target = RecordingTarget::new();
        let mut handle = target.clone();

        let tex = handle.load_texture("saucer.png");
        handle.begin();
        handle.draw(&Sprite::new(tex, Vec2::ONE, Vec2::ONE));
        handle.end();
        handle.release_texture(tex);

        assert_eq!(target.calls().len(), 3);
        assert_eq!(target.loaded_textures(), vec!["saucer.png".to_string()]);
        assert_eq!(target.released_textures(), vec![tex]);
        assert_eq!(target.take_calls().len(), 3);
        assert!(target.calls().is_empty());
    }

    #[test]
    fn test_scripted_input_replays_queue() {
        let input = ScriptedInput::new();
        let mut device = input.clone();
        input.queue([Some(Vec2::new(3.0, 4.0)), None]);

        device.poll();
        assert!(device.is_pressed());
        assert_eq!(device.pointer(), Vec2::new(3.0, 4.0));

        device.poll();
        assert!(!device.is_pressed());

        // Queue exhausted: state holds
        device.poll();
        assert!(!device.is_pressed());
        assert_eq!(input.queued_frames(), 0);
    }
}
