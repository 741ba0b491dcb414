//! Debug wireframe overlay
//!
//! Outlines every body in the world plus the level bounds, colored by body
//! kind. Drawn after the main pass with the camera's combined matrix.

use glam::Mat4;

use super::world::{BodyKind, World};
use crate::platform::{Color, RenderTarget};

#[derive(Debug, Default)]
pub struct DebugRenderer {
    frames: u64,
    disposed: bool,
}

fn kind_color(kind: BodyKind) -> Color {
    match kind {
        BodyKind::Static => Color::DEBUG_STATIC,
        BodyKind::Kinematic => Color::DEBUG_KINEMATIC,
        BodyKind::Dynamic => Color::DEBUG_DYNAMIC,
    }
}

impl DebugRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, world: &World, projection: Mat4, target: &mut dyn RenderTarget) {
        if self.disposed {
            return;
        }
        target.set_projection(projection);
        target.begin();
        if let Some(bounds) = world.bounds() {
            target.draw_outline(bounds.min, bounds.max, Color::WHITE);
        }
        for (_, body) in world.bodies() {
            let aabb = body.aabb();
            target.draw_outline(aabb.min, aabb.max, kind_color(body.kind));
        }
        target.end();
        self.frames += 1;
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Safe to call more than once
    pub fn dispose(&mut self) {
        if !self.disposed {
            log::debug!("Disposing debug renderer after {} frames", self.frames);
            self.disposed = true;
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{DrawCall, RecordingTarget};
    use crate::sim::Aabb;
    use glam::Vec2;

    #[test]
    fn test_outlines_bounds_and_bodies() {
        let mut world = World::new(Vec2::ZERO);
        world.set_bounds(Aabb::new(Vec2::ZERO, Vec2::new(80.0, 48.0)));
        world.create_body(BodyKind::Dynamic, Vec2::new(10.0, 10.0), Vec2::ONE);
        world.create_body(BodyKind::Kinematic, Vec2::new(20.0, 10.0), Vec2::ONE);

        let mut target = RecordingTarget::new();
        let mut debug = DebugRenderer::new();
        debug.render(&world, Mat4::IDENTITY, &mut target);

        let outlines = target
            .calls()
            .iter()
            .filter(|c| matches!(c, DrawCall::Outline { .. }))
            .count();
        assert_eq!(outlines, 3);
        assert_eq!(target.calls().first(), Some(&DrawCall::Begin));
        assert_eq!(target.projection(), Some(Mat4::IDENTITY));
        assert_eq!(debug.frames_rendered(), 1);
    }

    #[test]
    fn test_disposed_renderer_draws_nothing() {
        let world = World::new(Vec2::ZERO);
        let mut target = RecordingTarget::new();
        let mut debug = DebugRenderer::new();
        debug.dispose();
        debug.dispose();
        debug.render(&world, Mat4::IDENTITY, &mut target);
        assert!(target.calls().is_empty());
        assert!(debug.is_disposed());
    }
}
