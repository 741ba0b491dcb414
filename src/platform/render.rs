//! Render target interface

use glam::{Mat4, Vec2};

/// RGBA color, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Daytime sky behind the world layer
    pub const SKY: Color = Color::rgb(0.57, 0.77, 0.85);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    /// Debug outline colors by body kind
    pub const DEBUG_STATIC: Color = Color::rgb(0.5, 0.9, 0.5);
    pub const DEBUG_KINEMATIC: Color = Color::rgb(0.5, 0.5, 0.9);
    pub const DEBUG_DYNAMIC: Color = Color::rgb(0.9, 0.7, 0.7);
}

/// Texture owned by a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// A textured quad in world units
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    /// Center position
    pub pos: Vec2,
    pub size: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
}

impl Sprite {
    pub fn new(texture: TextureId, pos: Vec2, size: Vec2) -> Self {
        Self {
            texture,
            pos,
            size,
            rotation: 0.0,
        }
    }
}

/// Where frames are drawn
///
/// Draw calls are only valid between `begin` and `end`.
pub trait RenderTarget {
    fn set_projection(&mut self, projection: Mat4);
    fn clear(&mut self, color: Color);
    fn begin(&mut self);
    fn end(&mut self);
    fn draw(&mut self, sprite: &Sprite);
    fn draw_text(&mut self, pos: Vec2, text: &str);
    fn draw_outline(&mut self, min: Vec2, max: Vec2, color: Color);
    fn load_texture(&mut self, name: &str) -> TextureId;
    fn release_texture(&mut self, texture: TextureId);
}
