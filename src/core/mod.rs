//! Core types describing bodies, shapes, constraints, and shared math.

pub mod constraints;
pub mod rigidbody;
pub mod shape;
pub mod soa;
pub mod types;

pub use constraints::{Compliance, Joint};
pub use rigidbody::{BodyKind, RigidBody};
pub use shape::{CollisionFilter, ColliderShape, ShapeError};
pub use types::{MassProperties, Material, Rotation2, Transform2, Velocity2};
