//! Game objects
//!
//! Every object implements the [`GameObject`] capability set. The registry
//! stores them as the closed [`Entity`] enum; typed access goes through
//! [`Variant`] so the coordinator never needs runtime type checks.

pub mod background;
pub mod cthulhu;
pub mod hud;
pub mod obstacles;
pub mod saucer;

pub use background::Background;
pub use cthulhu::{Cthulhu, Punch};
pub use hud::{Hud, HudStatus};
pub use obstacles::Obstacles;
pub use saucer::{DamageOutcome, Saucer};

use crate::persistence::EntityRecord;
use crate::platform::{Camera, RenderTarget, TextureId};
use crate::sim::World;

/// Everything an object may touch while it is being created
pub struct CreateContext<'a> {
    pub target: &'a mut dyn RenderTarget,
    pub camera: &'a Camera,
    pub world: &'a mut World,
}

/// Capability set shared by all game objects
pub trait GameObject {
    /// Acquire textures and physics bodies
    fn create(&mut self, ctx: &mut CreateContext<'_>);

    /// Per-frame bookkeeping before drawing (RUN only)
    fn pre_render(&mut self, camera: &Camera, world: &mut World);

    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera);

    /// Release owned resources. Must tolerate objects never created.
    fn dispose(&mut self, target: &mut dyn RenderTarget);

    /// Back to the state of a fresh run
    fn reset(&mut self, _world: &mut World) {}

    /// Mutable state worth persisting, if any
    fn snapshot(&self, _world: &World) -> Option<EntityRecord> {
        None
    }

    /// Apply a persisted record; false when the record does not fit
    fn restore(&mut self, _record: &EntityRecord, _world: &mut World) -> bool {
        false
    }
}

/// Release a texture slot exactly once
pub(crate) fn release(texture: &mut Option<TextureId>, target: &mut dyn RenderTarget) {
    if let Some(texture) = texture.take() {
        target.release_texture(texture);
    }
}

/// A registered game object
pub enum Entity {
    Background(Background),
    Obstacles(Obstacles),
    Player(Saucer),
    Antagonist(Cthulhu),
    Hud(Hud),
}

macro_rules! dispatch {
    ($entity:expr, $inner:ident => $call:expr) => {
        match $entity {
            Entity::Background($inner) => $call,
            Entity::Obstacles($inner) => $call,
            Entity::Player($inner) => $call,
            Entity::Antagonist($inner) => $call,
            Entity::Hud($inner) => $call,
        }
    };
}

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Background(_) => "background",
            Entity::Obstacles(_) => "obstacles",
            Entity::Player(_) => "player",
            Entity::Antagonist(_) => "antagonist",
            Entity::Hud(_) => "hud",
        }
    }
}

impl GameObject for Entity {
    fn create(&mut self, ctx: &mut CreateContext<'_>) {
        dispatch!(self, e => e.create(ctx))
    }

    fn pre_render(&mut self, camera: &Camera, world: &mut World) {
        dispatch!(self, e => e.pre_render(camera, world))
    }

    fn render(&self, target: &mut dyn RenderTarget, camera: &Camera) {
        dispatch!(self, e => e.render(target, camera))
    }

    fn dispose(&mut self, target: &mut dyn RenderTarget) {
        dispatch!(self, e => e.dispose(target))
    }

    fn reset(&mut self, world: &mut World) {
        dispatch!(self, e => e.reset(world))
    }

    fn snapshot(&self, world: &World) -> Option<EntityRecord> {
        dispatch!(self, e => e.snapshot(world))
    }

    fn restore(&mut self, record: &EntityRecord, world: &mut World) -> bool {
        dispatch!(self, e => e.restore(record, world))
    }
}

/// A concrete object type stored inside [`Entity`]
pub trait Variant: GameObject + Sized {
    fn wrap(self) -> Entity;
    fn peek(entity: &Entity) -> Option<&Self>;
    fn peek_mut(entity: &mut Entity) -> Option<&mut Self>;
}

macro_rules! variant {
    ($ty:ty, $name:ident) => {
        impl Variant for $ty {
            fn wrap(self) -> Entity {
                Entity::$name(self)
            }

            fn peek(entity: &Entity) -> Option<&Self> {
                match entity {
                    Entity::$name(inner) => Some(inner),
                    _ => None,
                }
            }

            fn peek_mut(entity: &mut Entity) -> Option<&mut Self> {
                match entity {
                    Entity::$name(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

variant!(Background, Background);
variant!(Obstacles, Obstacles);
variant!(Saucer, Player);
variant!(Cthulhu, Antagonist);
variant!(Hud, Hud);
