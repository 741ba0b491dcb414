//! Simulation module
//!
//! Everything the coordinator advances or owns per frame:
//! - Fixed timestep only (`stepper`)
//! - Deterministic body iteration order (`world`)
//! - Stable entity order (`registry`)
//! - No process-global state (`state`)

pub mod debug;
pub mod registry;
pub mod state;
pub mod stepper;
pub mod world;

pub use debug::DebugRenderer;
pub use registry::{EntityRegistry, Handle, RegistryError};
pub use state::{GameState, NetState};
pub use stepper::{PhysicsStepper, PhysicsWorld};
pub use world::{Aabb, Body, BodyHandle, BodyKind, Border, Contact, World};
