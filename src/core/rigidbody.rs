use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::shape::{CollisionFilter, ColliderShape};
use super::types::{self, MassProperties, Material, Transform2, Velocity2};
use crate::utils::allocator::EntityId;

/// Static bodies never move and have zero inverse mass; kinematic bodies move
/// under their own velocity but ignore forces, impulses, and contact/position
/// correction from the solver (§9 open question, resolved: they do not in
/// most engines, and this crate matches that convention); dynamic bodies are
/// fully simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Static,
    Dynamic,
    Kinematic,
}

/// Full description of a rigid body, used both as the `createBody` payload
/// and as the owned representation inserted into [`super::soa::BodiesSoA`].
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub id: EntityId,
    pub kind: BodyKind,
    pub transform: Transform2,
    pub velocity: Velocity2,
    pub force_accum: DVec2,
    pub torque_accum: f64,
    pub shape: ColliderShape,
    pub mass_properties: MassProperties,
    pub material: Material,
    pub filter: CollisionFilter,
    pub is_awake: bool,
    pub sleep_time: f64,
    pub inverse_mass: f64,
    pub inverse_inertia: f64,
}

impl RigidBody {
    pub fn new(id: EntityId, kind: BodyKind, shape: ColliderShape) -> Self {
        let mut body = Self {
            id,
            kind,
            transform: Transform2::default(),
            velocity: Velocity2::default(),
            force_accum: DVec2::ZERO,
            torque_accum: 0.0,
            shape,
            mass_properties: MassProperties::default(),
            material: Material::default(),
            filter: CollisionFilter::default(),
            is_awake: true,
            sleep_time: 0.0,
            inverse_mass: 1.0,
            inverse_inertia: 1.0,
        };
        body.recompute_mass();
        body
    }

    pub fn builder(id: EntityId, kind: BodyKind, shape: ColliderShape) -> RigidBodyBuilder {
        RigidBodyBuilder::new(id, kind, shape)
    }

    /// Recomputes `inverse_mass`/`inverse_inertia` from `mass_properties` and
    /// `shape`. Static and kinematic bodies always carry zero inverse mass
    /// per the invariant in §3.
    pub fn recompute_mass(&mut self) {
        if self.kind != BodyKind::Dynamic {
            self.inverse_mass = 0.0;
            self.inverse_inertia = 0.0;
            return;
        }

        let mass = self.mass_properties.mass.max(1e-9);
        self.inverse_mass = 1.0 / mass;

        let inertia = match &self.shape {
            ColliderShape::Circle { radius } => types::inertia_circle(mass, *radius),
            ColliderShape::Aabb { half_extents } => {
                types::inertia_aabb(mass, half_extents.x, half_extents.y)
            }
            ColliderShape::Polygon { vertices, .. } => types::inertia_polygon(mass, vertices),
        };
        self.mass_properties.inertia = inertia;
        self.inverse_inertia = if inertia.abs() < 1e-12 { 0.0 } else { 1.0 / inertia };
    }

    pub fn apply_force(&mut self, force: DVec2) {
        if self.kind != BodyKind::Dynamic {
            return;
        }
        self.force_accum += force;
        self.is_awake = true;
        self.sleep_time = 0.0;
    }

    pub fn apply_impulse(&mut self, impulse: DVec2) {
        if self.kind != BodyKind::Dynamic {
            return;
        }
        self.velocity.linear += impulse * self.inverse_mass;
        self.is_awake = true;
        self.sleep_time = 0.0;
    }

    pub fn wake(&mut self) {
        self.is_awake = true;
        self.sleep_time = 0.0;
    }
}

pub struct RigidBodyBuilder {
    body: RigidBody,
}

impl RigidBodyBuilder {
    pub fn new(id: EntityId, kind: BodyKind, shape: ColliderShape) -> Self {
        Self {
            body: RigidBody::new(id, kind, shape),
        }
    }

    pub fn position(mut self, position: DVec2) -> Self {
        self.body.transform.position = position;
        self
    }

    pub fn angle(mut self, angle: f64) -> Self {
        self.body.transform.rotation = types::Rotation2::new(angle);
        self
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.body.mass_properties.mass = mass;
        self.body.recompute_mass();
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.body.material = material;
        self
    }

    pub fn filter(mut self, filter: CollisionFilter) -> Self {
        self.body.filter = filter;
        self
    }

    pub fn velocity(mut self, linear: DVec2, angular: f64) -> Self {
        self.body.velocity = Velocity2 { linear, angular };
        self
    }

    pub fn build(self) -> RigidBody {
        self.body
    }
}
