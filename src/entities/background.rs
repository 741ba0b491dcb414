//! Static backdrop

use glam::Vec2;

use super::{CreateContext, GameObject, release};
use crate::platform::{Camera, RenderTarget, Sprite, TextureId};
use crate::sim::World;

#[derive(Debug, Default)]
pub struct Background {
    texture: Option<TextureId>,
    size: Vec2,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameObject for Background {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        self.texture = Some(ctx.target.load_texture("background.png"));
        self.size = ctx.camera.viewport();
    }

    fn pre_render(&mut self, _camera: &Camera, _world: &mut World) {}

    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera) {
        if let Some(texture) = self.texture {
            target.draw(&Sprite::new(texture, camera.position, self.size));
        }
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        release(&mut self.texture, target);
    }
}
