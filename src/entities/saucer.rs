//! The player's flying saucer

use glam::Vec2;

use super::{CreateContext, GameObject, release};
use crate::persistence::{BodyRecord, EntityRecord};
use crate::platform::{Camera, RenderTarget, Sprite, TextureId};
use crate::sim::{BodyHandle, BodyKind, World};

/// Half size of the saucer's collision box
pub const SAUCER_HALF_EXTENTS: Vec2 = Vec2::new(2.0, 1.0);
/// Upward speed set by a jump
pub const JUMP_SPEED: f32 = 12.0;

/// Result of [`Saucer::take_damage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Still flying with this much health
    Absorbed { remaining: u32 },
    /// This hit took the last point of health
    Destroyed,
    /// Health was already gone
    AlreadyDestroyed,
}

#[derive(Debug)]
pub struct Saucer {
    body: Option<BodyHandle>,
    texture: Option<TextureId>,
    max_health: u32,
    health: u32,
    score: u64,
    /// Position as of the last pre-render, for drawing
    pos: Vec2,
}

impl Saucer {
    pub fn new(max_health: u32) -> Self {
        Self {
            body: None,
            texture: None,
            max_health,
            health: max_health,
            score: 0,
            pos: Vec2::ZERO,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    /// Teleport and stop
    pub fn set_position(&mut self, pos: Vec2, world: &mut World) {
        if let Some(body) = self.body {
            world.set_position(body, pos);
            world.set_velocity(body, Vec2::ZERO);
        }
        self.pos = pos;
    }

    /// Kick upward, keeping horizontal velocity
    pub fn jump(&mut self, world: &mut World) {
        let Some(body) = self.body else { return };
        let vel = world.velocity(body).unwrap_or(Vec2::ZERO);
        world.set_velocity(body, Vec2::new(vel.x, JUMP_SPEED));
    }

    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.health == 0 {
            return DamageOutcome::AlreadyDestroyed;
        }
        self.health = self.health.saturating_sub(amount);
        log::debug!("Saucer hit for {}, {} health left", amount, self.health);
        if self.health == 0 {
            DamageOutcome::Destroyed
        } else {
            DamageOutcome::Absorbed {
                remaining: self.health,
            }
        }
    }
}

impl GameObject for Saucer {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        self.texture = Some(ctx.target.load_texture("saucer.png"));
        self.pos = ctx.camera.viewport_center();
        self.body = Some(
            ctx.world
                .create_body(BodyKind::Dynamic, self.pos, SAUCER_HALF_EXTENTS),
        );
    }

    fn pre_render(&mut self, _camera: &Camera, world: &mut World) {
        if let Some(pos) = self.body.and_then(|b| world.position(b)) {
            self.pos = pos;
        }
    }

    fn render(&self, target: &mut dyn RenderTarget, _camera: &Camera) {
        if let Some(texture) = self.texture {
            target.draw(&Sprite::new(texture, self.pos, SAUCER_HALF_EXTENTS * 2.0));
        }
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        release(&mut self.texture, target);
    }

    fn reset(&mut self, _world: &mut World) {
        self.health = self.max_health;
        self.score = 0;
    }

    fn snapshot(&self, world: &World) -> Option<EntityRecord> {
        let body = world.body(self.body?)?;
        Some(EntityRecord::Player {
            body: BodyRecord {
                pos: body.pos,
                vel: body.vel,
            },
            health: self.health,
            score: self.score,
        })
    }

    fn restore(&mut self, record: &EntityRecord, world: &mut World) -> bool {
        let EntityRecord::Player {
            body: saved,
            health,
            score,
        } = record
        else {
            return false;
        };
        if let Some(body) = self.body {
            world.set_position(body, saved.pos);
            world.set_velocity(body, saved.vel);
        }
        self.pos = saved.pos;
        self.health = (*health).min(self.max_health);
        self.score = *score;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RecordingTarget;

    fn created() -> (Saucer, World) {
        let mut world = World::new(Vec2::new(0.0, -10.0));
        let mut target = RecordingTarget::new();
        let camera = Camera::orthographic(80.0, 48.0);
        let mut saucer = Saucer::new(3);
        saucer.create(&mut CreateContext {
            target: &mut target,
            camera: &camera,
            world: &mut world,
        });
        (saucer, world)
    }

    #[test]
    fn test_created_at_viewport_center() {
        let (saucer, world) = created();
        assert_eq!(saucer.position(), Vec2::new(40.0, 24.0));
        assert_eq!(world.position(saucer.body().unwrap()), Some(Vec2::new(40.0, 24.0)));
    }

    #[test]
    fn test_damage_until_destroyed() {
        let mut saucer = Saucer::new(3);
        assert_eq!(saucer.take_damage(1), DamageOutcome::Absorbed { remaining: 2 });
        assert_eq!(saucer.take_damage(1), DamageOutcome::Absorbed { remaining: 1 });
        assert_eq!(saucer.take_damage(1), DamageOutcome::Destroyed);
        assert_eq!(saucer.take_damage(1), DamageOutcome::AlreadyDestroyed);
        assert!(saucer.is_destroyed());
    }

    #[test]
    fn test_overkill_destroys() {
        let mut saucer = Saucer::new(3);
        assert_eq!(saucer.take_damage(10), DamageOutcome::Destroyed);
    }

    #[test]
    fn test_jump_sets_upward_velocity() {
        let (mut saucer, mut world) = created();
        saucer.jump(&mut world);
        assert_eq!(world.velocity(saucer.body().unwrap()).unwrap().y, JUMP_SPEED);
    }

    #[test]
    fn test_snapshot_restore() {
        let (mut saucer, mut world) = created();
        saucer.take_damage(1);
        saucer.add_score(4);
        let record = saucer.snapshot(&world).unwrap();

        saucer.reset(&mut world);
        saucer.set_position(Vec2::new(1.0, 1.0), &mut world);
        assert!(saucer.restore(&record, &mut world));

        assert_eq!(saucer.health(), 2);
        assert_eq!(saucer.score(), 4);
        assert_eq!(saucer.position(), Vec2::new(40.0, 24.0));
    }
}
