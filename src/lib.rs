//! Deterministic 2D rigid-body physics engine.
//!
//! The engine is split into the same layers a typed embedding and a flat
//! host embedding both need: [`core`] holds the data model (bodies, shapes,
//! constraints), [`collision`] and [`dynamics`] implement the simulation
//! pipeline, [`world`] assembles them into one [`world::PhysicsWorld`], and
//! [`facade`] exposes that world as a handle-based API over primitive
//! numbers for a non-Rust host.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod facade;
pub mod utils;
pub mod world;

pub use core::soa::{BodyMut, BodyRef};

pub use collision::{
    broadphase::BroadPhase,
    contact::{ManifoldCache, ManifoldDebugInfo, ManifoldPoint, ManifoldPointDebugInfo, PersistentManifold},
    queries::{query_aabb, raycast, RaycastHit, RaycastQuery},
};
pub use core::{
    constraints::{Compliance, Joint},
    rigidbody::{BodyKind, RigidBody},
    shape::{CollisionFilter, ColliderShape, ShapeError},
    types::{MassProperties, Material, Rotation2, Transform2, Velocity2},
};
pub use dynamics::{IslandManager, Solver, SolverStepMetrics};
pub use utils::allocator::{Arena, EntityId, GenerationalId};
pub use world::{BodyState, ContactRow, PhysicsWorld, WorldError};
