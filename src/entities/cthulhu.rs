//! Cthulhu, lurking in the corner and punching at wherever the player taps

use glam::Vec2;

use super::{CreateContext, GameObject, release};
use crate::persistence::{BodyRecord, EntityRecord};
use crate::platform::{Camera, RenderTarget, Sprite, TextureId};
use crate::sim::{BodyHandle, BodyKind, World};

/// Half size of the fist's collision box
pub const FIST_HALF_EXTENTS: Vec2 = Vec2::new(1.5, 1.5);
/// Strike speed; the fist returns at half this
pub const PUNCH_SPEED: f32 = 40.0;
const ARRIVE_DISTANCE: f32 = 0.5;

/// Phase of the current punch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Punch {
    Idle,
    Striking { target: Vec2 },
    Returning,
}

#[derive(Debug)]
pub struct Cthulhu {
    body: Option<BodyHandle>,
    texture: Option<TextureId>,
    home: Vec2,
    punch: Punch,
    pos: Vec2,
}

impl Default for Cthulhu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cthulhu {
    pub fn new() -> Self {
        Self {
            body: None,
            texture: None,
            home: Vec2::ZERO,
            punch: Punch::Idle,
            pos: Vec2::ZERO,
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn punch_phase(&self) -> Punch {
        self.punch
    }

    pub fn home(&self) -> Vec2 {
        self.home
    }

    /// Throw a punch at `target` (world units). Ignored mid-punch.
    pub fn punch(&mut self, target: Vec2, world: &mut World) -> bool {
        let Some(body) = self.body else { return false };
        if self.punch != Punch::Idle {
            return false;
        }
        let pos = world.position(body).unwrap_or(self.home);
        let dir = (target - pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            return false;
        }
        world.set_velocity(body, dir * PUNCH_SPEED);
        self.punch = Punch::Striking { target };
        true
    }

    fn park(&mut self, body: BodyHandle, world: &mut World) {
        world.set_position(body, self.home);
        world.set_velocity(body, Vec2::ZERO);
        self.pos = self.home;
        self.punch = Punch::Idle;
    }
}

/// True once `pos` reached `goal` or moved past it along `vel`
fn arrived(pos: Vec2, vel: Vec2, goal: Vec2) -> bool {
    pos.distance(goal) <= ARRIVE_DISTANCE || (goal - pos).dot(vel) <= 0.0
}

impl GameObject for Cthulhu {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        self.texture = Some(ctx.target.load_texture("cthulhu.png"));
        let viewport = ctx.camera.viewport();
        self.home = Vec2::new(viewport.x * 0.1, viewport.y * 0.2);
        self.pos = self.home;
        self.body = Some(
            ctx.world
                .create_body(BodyKind::Kinematic, self.home, FIST_HALF_EXTENTS),
        );
    }

    fn pre_render(&mut self, _camera: &Camera, world: &mut World) {
        let Some(body) = self.body else { return };
        let Some((pos, vel)) = world.body(body).map(|b| (b.pos, b.vel)) else {
            return;
        };
        self.pos = pos;

        match self.punch {
            Punch::Idle => {}
            Punch::Striking { target } => {
                if arrived(pos, vel, target) {
                    let back = (self.home - pos).normalize_or_zero();
                    if back == Vec2::ZERO {
                        self.park(body, world);
                    } else {
                        world.set_velocity(body, back * PUNCH_SPEED * 0.5);
                        self.punch = Punch::Returning;
                    }
                }
            }
            Punch::Returning => {
                if arrived(pos, vel, self.home) {
                    self.park(body, world);
                }
            }
        }
    }

    fn render(&self, target: &mut dyn RenderTarget, _camera: &Camera) {
        if let Some(texture) = self.texture {
            target.draw(&Sprite::new(texture, self.pos, FIST_HALF_EXTENTS * 2.0));
        }
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        release(&mut self.texture, target);
    }

    fn reset(&mut self, world: &mut World) {
        match self.body {
            Some(body) => self.park(body, world),
            None => self.punch = Punch::Idle,
        }
    }

    fn snapshot(&self, world: &World) -> Option<EntityRecord> {
        let body = world.body(self.body?)?;
        let target = match self.punch {
            Punch::Striking { target } => Some(target),
            _ => None,
        };
        Some(EntityRecord::Antagonist {
            body: BodyRecord {
                pos: body.pos,
                vel: body.vel,
            },
            target,
            returning: self.punch == Punch::Returning,
        })
    }

    fn restore(&mut self, record: &EntityRecord, world: &mut World) -> bool {
        let EntityRecord::Antagonist {
            body: saved,
            target,
            returning,
        } = record
        else {
            return false;
        };
        if let Some(body) = self.body {
            world.set_position(body, saved.pos);
            world.set_velocity(body, saved.vel);
        }
        self.pos = saved.pos;
        self.punch = match (target, returning) {
            (Some(target), _) => Punch::Striking { target: *target },
            (None, true) => Punch::Returning,
            (None, false) => Punch::Idle,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::RecordingTarget;
    use crate::sim::PhysicsWorld;

    fn created() -> (Cthulhu, World, Camera) {
        let mut world = World::new(Vec2::new(0.0, -10.0));
        let mut target = RecordingTarget::new();
        let camera = Camera::orthographic(80.0, 48.0);
        let mut cthulhu = Cthulhu::new();
        cthulhu.create(&mut CreateContext {
            target: &mut target,
            camera: &camera,
            world: &mut world,
        });
        (cthulhu, world, camera)
    }

    #[test]
    fn test_punch_strikes_and_returns_home() {
        let (mut cthulhu, mut world, camera) = created();
        let target = Vec2::new(30.0, 20.0);

        assert!(cthulhu.punch(target, &mut world));
        // A second punch mid-strike is ignored
        assert!(!cthulhu.punch(Vec2::new(70.0, 40.0), &mut world));

        let mut saw_return = false;
        for _ in 0..600 {
            world.step(1.0 / 60.0, 6, 2);
            cthulhu.pre_render(&camera, &mut world);
            saw_return |= cthulhu.punch_phase() == Punch::Returning;
            if saw_return && cthulhu.punch_phase() == Punch::Idle {
                break;
            }
        }

        assert!(saw_return);
        assert_eq!(cthulhu.punch_phase(), Punch::Idle);
        assert_eq!(world.position(cthulhu.body().unwrap()), Some(cthulhu.home()));
    }

    #[test]
    fn test_punch_at_own_position_is_ignored() {
        let (mut cthulhu, mut world, _camera) = created();
        let home = cthulhu.home();
        assert!(!cthulhu.punch(home, &mut world));
        assert_eq!(cthulhu.punch_phase(), Punch::Idle);
    }

    #[test]
    fn test_snapshot_keeps_strike_target() {
        let (mut cthulhu, mut world, _camera) = created();
        cthulhu.punch(Vec2::new(30.0, 20.0), &mut world);
        let record = cthulhu.snapshot(&world).unwrap();

        cthulhu.reset(&mut world);
        assert_eq!(cthulhu.punch_phase(), Punch::Idle);

        assert!(cthulhu.restore(&record, &mut world));
        assert_eq!(
            cthulhu.punch_phase(),
            Punch::Striking {
                target: Vec2::new(30.0, 20.0)
            }
        );
    }
}
