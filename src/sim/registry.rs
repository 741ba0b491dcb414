//! Ordered entity registry
//!
//! Keys are unique; iteration follows insertion order, which is also draw
//! order. Registration hands back a typed [`Handle`] so callers can reach the
//! concrete object without matching on the enum themselves.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::entities::{CreateContext, Entity, GameObject, Variant};
use crate::persistence::Snapshot;
use crate::platform::{Camera, RenderTarget};

use super::World;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two entities registered under the same key (configuration error)
    #[error("duplicate entity key `{0}`")]
    DuplicateKey(String),

    #[error("no entity registered under `{0}`")]
    NotFound(String),
}

/// Typed reference to a registered entity
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Registered,
    Created,
    Disposed,
}

struct Slot {
    key: String,
    entity: Entity,
    phase: Phase,
}

#[derive(Default)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Variant>(&mut self, key: &str, entity: T) -> Result<Handle<T>, RegistryError> {
        if self.index.contains_key(key) {
            return Err(RegistryError::DuplicateKey(key.to_string()));
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            key: key.to_string(),
            entity: entity.wrap(),
            phase: Phase::Registered,
        });
        self.index.insert(key.to_string(), index);
        Ok(Handle {
            index,
            _marker: PhantomData,
        })
    }

    pub fn lookup(&self, key: &str) -> Result<&Entity, RegistryError> {
        self.index
            .get(key)
            .map(|&i| &self.slots[i].entity)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    pub fn lookup_mut(&mut self, key: &str) -> Result<&mut Entity, RegistryError> {
        match self.index.get(key) {
            Some(&i) => Ok(&mut self.slots[i].entity),
            None => Err(RegistryError::NotFound(key.to_string())),
        }
    }

    pub fn get<T: Variant>(&self, handle: Handle<T>) -> Option<&T> {
        self.slots.get(handle.index).and_then(|s| T::peek(&s.entity))
    }

    pub fn get_mut<T: Variant>(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index)
            .and_then(|s| T::peek_mut(&mut s.entity))
    }

    /// Entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entity)> {
        self.slots.iter().map(|s| (s.key.as_str(), &s.entity))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Create every entity not created yet, in order
    pub fn create_all(&mut self, ctx: &mut CreateContext<'_>) {
        for slot in &mut self.slots {
            if slot.phase == Phase::Registered {
                slot.entity.create(ctx);
                slot.phase = Phase::Created;
            }
        }
    }

    pub fn pre_render_all(&mut self, camera: &Camera, world: &mut World) {
        for slot in &mut self.slots {
            if slot.phase == Phase::Created {
                slot.entity.pre_render(camera, world);
            }
        }
    }

    /// Draw every live entity except the one at `skip`, in order
    pub fn render_all<T>(&self, target: &mut dyn RenderTarget, camera: &Camera, skip: Option<Handle<T>>) {
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.phase != Phase::Created || skip.is_some_and(|h| h.index == i) {
                continue;
            }
            slot.entity.render(target, camera);
        }
    }

    /// Draw one entity
    pub fn render_one<T>(&self, handle: Handle<T>, target: &mut dyn RenderTarget, camera: &Camera) {
        if let Some(slot) = self.slots.get(handle.index) {
            if slot.phase == Phase::Created {
                slot.entity.render(target, camera);
            }
        }
    }

    pub fn reset_all(&mut self, world: &mut World) {
        for slot in &mut self.slots {
            if slot.phase == Phase::Created {
                slot.entity.reset(world);
            }
        }
    }

    /// Persistable state of every entity, keyed like the registry
    pub fn snapshot(&self, session: &str, world: &World) -> Snapshot {
        let mut snapshot = Snapshot::new(session);
        for slot in &self.slots {
            if let Some(record) = slot.entity.snapshot(world) {
                snapshot.insert(slot.key.clone(), record);
            }
        }
        snapshot
    }

    /// Apply a snapshot; returns how many entities took a record
    pub fn restore(&mut self, snapshot: &Snapshot, world: &mut World) -> usize {
        let mut restored = 0;
        for (key, record) in &snapshot.entities {
            match self.lookup_mut(key) {
                Ok(entity) => {
                    if entity.restore(record, world) {
                        restored += 1;
                    } else {
                        log::warn!("Entity '{}' rejected its snapshot record", key);
                    }
                }
                Err(e) => log::warn!("Skipping snapshot record: {}", e),
            }
        }
        restored
    }

    /// Release every entity exactly once, in order
    ///
    /// Entities that were never created are disposed too (they must cope);
    /// entities already disposed are skipped, so repeated calls are no-ops.
    pub fn dispose_all(&mut self, target: &mut dyn RenderTarget) {
        for slot in &mut self.slots {
            if slot.phase != Phase::Disposed {
                log::debug!("Disposing entity '{}'", slot.key);
                slot.entity.dispose(target);
                slot.phase = Phase::Disposed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Background, Hud, Saucer};
    use crate::platform::{DrawCall, RecordingTarget};
    use glam::Vec2;

    fn registry() -> (EntityRegistry, Handle<Saucer>, Handle<Hud>) {
        let mut registry = EntityRegistry::new();
        registry.register("background", Background::new()).unwrap();
        let player = registry.register("player", Saucer::new(3)).unwrap();
        let hud = registry.register("gui", Hud::new()).unwrap();
        (registry, player, hud)
    }

    fn create(registry: &mut EntityRegistry, target: &mut RecordingTarget, world: &mut World) {
        let camera = Camera::orthographic(80.0, 48.0);
        registry.create_all(&mut CreateContext {
            target,
            camera: &camera,
            world,
        });
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let (mut registry, _, _) = registry();
        assert_eq!(
            registry.register("player", Saucer::new(1)).unwrap_err(),
            RegistryError::DuplicateKey("player".to_string())
        );
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_lookup_missing_key() {
        let (registry, _, _) = registry();
        assert_eq!(
            registry.lookup("cthulhu").err(),
            Some(RegistryError::NotFound("cthulhu".to_string()))
        );
        assert_eq!(registry.lookup("player").unwrap().kind(), "player");
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let (registry, _, _) = registry();
        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(keys, vec!["background", "player", "gui"]);
        // Restartable
        assert_eq!(registry.iter().count(), 3);
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_typed_handle_reaches_concrete_object() {
        let (mut registry, player, _) = registry();
        registry.get_mut(player).unwrap().add_score(5);
        assert_eq!(registry.get(player).unwrap().score(), 5);
    }

    #[test]
    fn test_render_skips_hud_and_keeps_order() {
        let (mut registry, _, hud) = registry();
        let mut target = RecordingTarget::new();
        let mut world = World::new(Vec2::ZERO);
        create(&mut registry, &mut target, &mut world);

        let camera = Camera::orthographic(80.0, 48.0);
        let mut draw = target.clone();
        draw.begin();
        registry.render_all(&mut draw, &camera, Some(hud));
        draw.end();

        let sprites: Vec<_> = target
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                DrawCall::Sprite { texture, .. } => Some(texture.0),
                _ => None,
            })
            .collect();
        // background.png then saucer.png, no HUD text
        assert_eq!(sprites, vec![1, 2]);
        assert!(!target.calls().iter().any(|c| matches!(c, DrawCall::Text(_))));
    }

    #[test]
    fn test_dispose_all_once_even_if_never_created() {
        let (mut registry, _, _) = registry();
        let mut target = RecordingTarget::new();

        // Never created: nothing to release, but must not panic
        registry.dispose_all(&mut target);
        assert!(target.released_textures().is_empty());

        let (mut registry, _, _) = self::registry();
        let mut world = World::new(Vec2::ZERO);
        create(&mut registry, &mut target, &mut world);
        registry.dispose_all(&mut target);
        registry.dispose_all(&mut target);

        assert_eq!(target.loaded_textures().len(), 3);
        assert_eq!(target.released_textures().len(), 3);
    }

    #[test]
    fn test_snapshot_and_restore_by_key() {
        let (mut registry, player, _) = registry();
        let mut target = RecordingTarget::new();
        let mut world = World::new(Vec2::ZERO);
        create(&mut registry, &mut target, &mut world);

        registry.get_mut(player).unwrap().add_score(9);
        let snapshot = registry.snapshot("local", &world);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("player").is_some());

        registry.reset_all(&mut world);
        assert_eq!(registry.get(player).unwrap().score(), 0);

        assert_eq!(registry.restore(&snapshot, &mut world), 1);
        assert_eq!(registry.get(player).unwrap().score(), 9);
    }
}
