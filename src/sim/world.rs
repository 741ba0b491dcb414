//! Axis-aligned box physics world
//!
//! A deliberately small solver: gravity on dynamic bodies, velocity and
//! position projection against the level borders, and begin-contact
//! reporting. Bodies are kept in a `BTreeMap` so iteration order (and
//! therefore stepping) is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::stepper::PhysicsWorld;

/// Slack used when deciding whether a box rests against a border
const CONTACT_EPSILON: f32 = 1e-4;

/// Stable identifier of a body inside a [`World`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(u32);

impl BodyHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// How the solver treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Never moves
    Static,
    /// Moves with its velocity, ignores gravity and borders
    Kinematic,
    /// Full simulation
    Dynamic,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict overlap; boxes sharing an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// A simulated box
#[derive(Debug, Clone)]
pub struct Body {
    pub kind: BodyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub half_extents: Vec2,
}

impl Body {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.pos, self.half_extents)
    }
}

/// One side of the level bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Border {
    Floor,
    Ceiling,
    Left,
    Right,
}

/// A contact that began during the last step(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Contact {
    /// Two bodies started overlapping (lower handle first)
    Bodies(BodyHandle, BodyHandle),
    /// A dynamic body reached a level border
    Border(BodyHandle, Border),
}

impl Contact {
    fn between(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Contact::Bodies(a, b)
        } else {
            Contact::Bodies(b, a)
        }
    }

    /// True when `body` takes part in this contact
    pub fn involves(&self, body: BodyHandle) -> bool {
        match *self {
            Contact::Bodies(a, b) => a == body || b == body,
            Contact::Border(a, _) => a == body,
        }
    }

    /// The other participant of a body/body contact
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        match *self {
            Contact::Bodies(a, b) if a == body => Some(b),
            Contact::Bodies(a, b) if b == body => Some(a),
            _ => None,
        }
    }
}

/// The physics world
#[derive(Debug)]
pub struct World {
    gravity: Vec2,
    bodies: BTreeMap<BodyHandle, Body>,
    next_id: u32,
    bounds: Option<Aabb>,
    touching: BTreeSet<Contact>,
    contacts: Vec<Contact>,
    steps: u64,
    disposed: bool,
}

impl World {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: BTreeMap::new(),
            next_id: 1,
            bounds: None,
            touching: BTreeSet::new(),
            contacts: Vec::new(),
            steps: 0,
            disposed: false,
        }
    }

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Enclose the level; dynamic bodies are kept inside and report contacts
    /// when they reach a side.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = Some(bounds);
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn create_body(&mut self, kind: BodyKind, pos: Vec2, half_extents: Vec2) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.insert(
            handle,
            Body {
                kind,
                pos,
                vel: Vec2::ZERO,
                half_extents,
            },
        );
        handle
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(&handle)
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.pos)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.vel)
    }

    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pos = pos;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.vel = vel;
        }
    }

    /// Bodies in handle order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter().map(|(h, b)| (*h, b))
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Contacts that began since the last drain
    pub fn take_contacts(&mut self) -> Vec<Contact> {
        std::mem::take(&mut self.contacts)
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Release every body. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        log::debug!("Disposing physics world ({} bodies)", self.bodies.len());
        self.bodies.clear();
        self.touching.clear();
        self.contacts.clear();
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancel velocity pushing dynamic bodies through a border they rest on
    fn solve_velocities(&mut self) {
        let Some(bounds) = self.bounds else { return };
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            let aabb = body.aabb();
            if aabb.min.y <= bounds.min.y + CONTACT_EPSILON && body.vel.y < 0.0 {
                body.vel.y = 0.0;
            }
            if aabb.max.y >= bounds.max.y - CONTACT_EPSILON && body.vel.y > 0.0 {
                body.vel.y = 0.0;
            }
            if aabb.min.x <= bounds.min.x + CONTACT_EPSILON && body.vel.x < 0.0 {
                body.vel.x = 0.0;
            }
            if aabb.max.x >= bounds.max.x - CONTACT_EPSILON && body.vel.x > 0.0 {
                body.vel.x = 0.0;
            }
        }
    }

    /// Project dynamic bodies back inside the borders
    fn solve_positions(&mut self) {
        let Some(bounds) = self.bounds else { return };
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            let lo = bounds.min + body.half_extents;
            let hi = bounds.max - body.half_extents;
            // max/min rather than clamp: a box wider than the level must not panic
            body.pos = body.pos.max(lo).min(hi);
        }
    }

    fn detect_contacts(&mut self) {
        let mut current = BTreeSet::new();

        for (&handle, body) in &self.bodies {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            let aabb = body.aabb();

            if let Some(bounds) = self.bounds {
                if aabb.min.y <= bounds.min.y + CONTACT_EPSILON {
                    current.insert(Contact::Border(handle, Border::Floor));
                }
                if aabb.max.y >= bounds.max.y - CONTACT_EPSILON {
                    current.insert(Contact::Border(handle, Border::Ceiling));
                }
                if aabb.min.x <= bounds.min.x + CONTACT_EPSILON {
                    current.insert(Contact::Border(handle, Border::Left));
                }
                if aabb.max.x >= bounds.max.x - CONTACT_EPSILON {
                    current.insert(Contact::Border(handle, Border::Right));
                }
            }

            for (&other, other_body) in &self.bodies {
                if other == handle || (other_body.kind == BodyKind::Dynamic && other < handle) {
                    continue;
                }
                if aabb.overlaps(&other_body.aabb()) {
                    current.insert(Contact::between(handle, other));
                }
            }
        }

        self.contacts
            .extend(current.difference(&self.touching).copied());
        self.touching = current;
    }
}

impl PhysicsWorld for World {
    fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        if self.disposed {
            return;
        }

        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            if body.kind == BodyKind::Dynamic {
                body.vel += gravity * dt;
            }
        }

        for _ in 0..velocity_iterations {
            self.solve_velocities();
        }

        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Static {
                body.pos += body.vel * dt;
            }
        }

        for _ in 0..position_iterations {
            self.solve_positions();
        }

        self.detect_contacts();
        self.steps += 1;
    }
}
