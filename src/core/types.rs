//! Pure math and material types shared across the engine. No state, no I/O.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D rotation stored as an angle in radians.
///
/// Kept as a scalar rather than a 2x2 matrix or complex number because every
/// consumer in this crate needs the angle itself (for `getBodyState`) as much
/// as it needs to rotate vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation2 {
    pub angle: f64,
}

impl Default for Rotation2 {
    fn default() -> Self {
        Self { angle: 0.0 }
    }
}

impl Rotation2 {
    pub fn new(angle: f64) -> Self {
        Self { angle }
    }

    pub fn cos_sin(&self) -> (f64, f64) {
        (self.angle.cos(), self.angle.sin())
    }

    /// Rotates a local-space vector into world space.
    pub fn rotate(&self, v: DVec2) -> DVec2 {
        let (c, s) = self.cos_sin();
        DVec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
    }

    /// Rotates a world-space vector back into local space (inverse rotation).
    pub fn unrotate(&self, v: DVec2) -> DVec2 {
        let (c, s) = self.cos_sin();
        DVec2::new(c * v.x + s * v.y, -s * v.x + c * v.y)
    }
}

/// Position and orientation of a body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Transform2 {
    pub position: DVec2,
    pub rotation: Rotation2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            rotation: Rotation2::default(),
        }
    }
}

impl Transform2 {
    pub fn new(position: DVec2, angle: f64) -> Self {
        Self {
            position,
            rotation: Rotation2::new(angle),
        }
    }

    /// Maps a body-local point into world space.
    pub fn point_to_world(&self, local: DVec2) -> DVec2 {
        self.position + self.rotation.rotate(local)
    }

    /// Maps a world-space point into this transform's local space.
    pub fn point_to_local(&self, world: DVec2) -> DVec2 {
        self.rotation.unrotate(world - self.position)
    }
}

/// Linear and angular velocity of a rigid body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Velocity2 {
    pub linear: DVec2,
    pub angular: f64,
}

impl Velocity2 {
    /// Velocity of the material point at world-space offset `r` from the body origin.
    pub fn point_velocity(&self, r: DVec2) -> DVec2 {
        self.linear + self.angular * DVec2::new(-r.y, r.x)
    }
}

/// Mass and (scalar, since 2D) moment of inertia about the body origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: f64,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: 1.0,
        }
    }
}

/// Surface coefficients used at a contact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f64,
    pub friction: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: crate::config::DEFAULT_RESTITUTION,
            friction: crate::config::DEFAULT_FRICTION,
        }
    }
}

impl Material {
    /// Combines two materials into the pair coefficients used by a contact.
    ///
    /// Restitution takes the combination that best preserves bounce (max);
    /// friction is averaged. Both are the conventional choices in production
    /// solvers and are simple, symmetric, and order-independent.
    pub fn combine_pair(a: &Material, b: &Material) -> MaterialPairProperties {
        MaterialPairProperties {
            restitution: a.restitution.max(b.restitution),
            friction: 0.5 * (a.friction + b.friction),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialPairProperties {
    pub restitution: f64,
    pub friction: f64,
}

/// Circle/AABB/polygon inertia formulas about the body origin, matching §4.2.
pub fn inertia_circle(mass: f64, radius: f64) -> f64 {
    0.5 * mass * radius * radius
}

pub fn inertia_aabb(mass: f64, half_w: f64, half_h: f64) -> f64 {
    (mass / 12.0) * (4.0 * half_w * half_w + 4.0 * half_h * half_h)
}

/// Area-weighted second moment of a convex polygon given in CCW local-space
/// vertices, about the body origin (the polygon's vertices are defined
/// relative to it, not necessarily its centroid).
pub fn inertia_polygon(mass: f64, vertices: &[DVec2]) -> f64 {
    let mut area2 = 0.0;
    let mut numerator = 0.0;
    let n = vertices.len();
    for i in 0..n {
        let p0 = vertices[i];
        let p1 = vertices[(i + 1) % n];
        let cross = p0.x * p1.y - p1.x * p0.y;
        area2 += cross;
        numerator += cross
            * (p0.x * p0.x + p0.x * p1.x + p1.x * p1.x + p0.y * p0.y + p0.y * p1.y + p1.y * p1.y);
    }
    let area = 0.5 * area2.abs();
    if area < 1e-12 {
        return mass;
    }
    let density = mass / area;
    (density * numerator / 12.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_round_trips_through_world_space() {
        let rot = Rotation2::new(std::f64::consts::FRAC_PI_4);
        let v = DVec2::new(1.0, 0.0);
        let world = rot.rotate(v);
        let back = rot.unrotate(world);
        assert!((back - v).length() < 1e-9);
    }

    #[test]
    fn square_inertia_matches_box_formula() {
        let verts = vec![
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ];
        let from_polygon = inertia_polygon(4.0, &verts);
        let from_box = inertia_aabb(4.0, 1.0, 1.0);
        assert!((from_polygon - from_box).abs() < 1e-6);
    }

    #[test]
    fn restitution_combines_via_max() {
        let a = Material {
            restitution: 0.2,
            friction: 0.4,
        };
        let b = Material {
            restitution: 0.8,
            friction: 0.2,
        };
        let pair = Material::combine_pair(&a, &b);
        assert!((pair.restitution - 0.8).abs() < 1e-12);
        assert!((pair.friction - 0.3).abs() < 1e-12);
    }
}
