//! Collision detection: shape geometry helpers, broad phase, narrow phase,
//! persistent contact manifolds, and spatial queries.

pub mod broadphase;
pub mod clipping;
pub mod contact;
pub mod narrowphase;
pub mod queries;
pub mod shapes;

pub use broadphase::{BroadPhase, SpatialGrid};
pub use contact::{ManifoldCache, ManifoldDebugInfo, ManifoldPoint, ManifoldPointDebugInfo, PersistentManifold};
pub use narrowphase::{generate as generate_contact, ContactGeometry};
pub use queries::{query_aabb, raycast, RaycastHit, RaycastQuery};
