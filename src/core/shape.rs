//! Fixed, immutable geometry attached to a body.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::MAX_POLYGON_VERTICES;

/// Errors returned while constructing a shape from host-supplied data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    TooFewVertices,
    TooManyVertices,
    NotConvexOrCcw,
}

/// Tagged shape variant. Immutable once attached to a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ColliderShape {
    Circle {
        radius: f64,
    },
    Aabb {
        half_extents: DVec2,
    },
    /// CCW, convex, local-space vertices (at most [`MAX_POLYGON_VERTICES`]),
    /// with precomputed outward edge normals of matching length.
    Polygon {
        vertices: Vec<DVec2>,
        normals: Vec<DVec2>,
    },
}

impl ColliderShape {
    pub fn circle(radius: f64) -> Self {
        ColliderShape::Circle { radius }
    }

    pub fn aabb(half_w: f64, half_h: f64) -> Self {
        ColliderShape::Aabb {
            half_extents: DVec2::new(half_w, half_h),
        }
    }

    /// Builds a polygon from CCW vertices, rejecting degenerate or
    /// non-convex input per §4.2's `InvalidShape` contract.
    pub fn polygon(vertices: Vec<DVec2>) -> Result<Self, ShapeError> {
        if vertices.len() < 3 {
            return Err(ShapeError::TooFewVertices);
        }
        if vertices.len() > MAX_POLYGON_VERTICES {
            return Err(ShapeError::TooManyVertices);
        }
        if !is_convex_ccw(&vertices) {
            return Err(ShapeError::NotConvexOrCcw);
        }

        let n = vertices.len();
        let normals = (0..n)
            .map(|i| {
                let edge = vertices[(i + 1) % n] - vertices[i];
                DVec2::new(edge.y, -edge.x).normalize_or_zero()
            })
            .collect();

        Ok(ColliderShape::Polygon { vertices, normals })
    }

    /// Conservative bounding radius about the body origin, used by the
    /// broad phase to size the AABB it inserts into the grid.
    pub fn bounding_radius(&self) -> f64 {
        match self {
            ColliderShape::Circle { radius } => *radius,
            ColliderShape::Aabb { half_extents } => half_extents.length(),
            ColliderShape::Polygon { vertices, .. } => {
                vertices.iter().map(|v| v.length()).fold(0.0, f64::max)
            }
        }
    }

    /// World-space AABB (min, max) for a body at the given transform.
    ///
    /// AABBs never rotate per the engine's Non-goals: an `Aabb` shape's
    /// half-extents are used verbatim regardless of body orientation.
    pub fn world_aabb(&self, transform: &super::types::Transform2) -> (DVec2, DVec2) {
        match self {
            ColliderShape::Circle { radius } => (
                transform.position - DVec2::splat(*radius),
                transform.position + DVec2::splat(*radius),
            ),
            ColliderShape::Aabb { half_extents } => (
                transform.position - *half_extents,
                transform.position + *half_extents,
            ),
            ColliderShape::Polygon { vertices, .. } => {
                let mut min = DVec2::splat(f64::INFINITY);
                let mut max = DVec2::splat(f64::NEG_INFINITY);
                for v in vertices {
                    let world = transform.point_to_world(*v);
                    min = min.min(world);
                    max = max.max(world);
                }
                (min, max)
            }
        }
    }

    /// Support point in world space along `direction` (need not be normalized).
    pub fn support_world(&self, transform: &super::types::Transform2, direction: DVec2) -> DVec2 {
        match self {
            ColliderShape::Circle { radius } => {
                transform.position + direction.normalize_or_zero() * *radius
            }
            ColliderShape::Aabb { half_extents } => {
                let local = DVec2::new(
                    if direction.x >= 0.0 {
                        half_extents.x
                    } else {
                        -half_extents.x
                    },
                    if direction.y >= 0.0 {
                        half_extents.y
                    } else {
                        -half_extents.y
                    },
                );
                transform.point_to_world(local)
            }
            ColliderShape::Polygon { vertices, .. } => {
                let local_dir = transform.rotation.unrotate(direction);
                let best = vertices
                    .iter()
                    .copied()
                    .max_by(|a, b| a.dot(local_dir).partial_cmp(&b.dot(local_dir)).unwrap())
                    .unwrap_or(DVec2::ZERO);
                transform.point_to_world(best)
            }
        }
    }

    /// World-space polygon vertices, treating an AABB as a 4-vertex polygon
    /// per §4.4's "treat AABB as a 4-vertex polygon" rule.
    pub fn world_polygon(&self, transform: &super::types::Transform2) -> Vec<DVec2> {
        match self {
            ColliderShape::Aabb { half_extents } => vec![
                transform.point_to_world(DVec2::new(-half_extents.x, -half_extents.y)),
                transform.point_to_world(DVec2::new(half_extents.x, -half_extents.y)),
                transform.point_to_world(DVec2::new(half_extents.x, half_extents.y)),
                transform.point_to_world(DVec2::new(-half_extents.x, half_extents.y)),
            ],
            ColliderShape::Polygon { vertices, .. } => {
                vertices.iter().map(|v| transform.point_to_world(*v)).collect()
            }
            ColliderShape::Circle { .. } => Vec::new(),
        }
    }

    /// World-space outward edge normals, aligned index-for-index with
    /// [`ColliderShape::world_polygon`].
    pub fn world_normals(&self, transform: &super::types::Transform2) -> Vec<DVec2> {
        match self {
            ColliderShape::Aabb { .. } => vec![
                DVec2::new(0.0, -1.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(0.0, 1.0),
                DVec2::new(-1.0, 0.0),
            ],
            ColliderShape::Polygon { normals, .. } => {
                normals.iter().map(|n| transform.rotation.rotate(*n)).collect()
            }
            ColliderShape::Circle { .. } => Vec::new(),
        }
    }
}

fn is_convex_ccw(vertices: &[DVec2]) -> bool {
    let n = vertices.len();
    let mut saw_positive = false;
    let mut saw_negative = false;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        let cross = (b - a).perp_dot(c - b);
        if cross.abs() < 1e-12 {
            continue;
        }
        if cross > 0.0 {
            saw_positive = true;
        } else {
            saw_negative = true;
        }
        if saw_positive && saw_negative {
            return false;
        }
    }
    // A CCW polygon has all-positive cross products (glam's perp_dot follows
    // the right-hand convention used throughout this crate).
    saw_positive
}

/// Collision layer/mask bitfields; the pair test is symmetric (see §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub layer: u16,
    pub mask: u16,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            layer: crate::config::DEFAULT_FILTER_LAYER,
            mask: crate::config::DEFAULT_FILTER_MASK,
        }
    }
}

impl CollisionFilter {
    pub fn collides_with(&self, other: &CollisionFilter) -> bool {
        (self.layer & other.mask) != 0 && (other.layer & self.mask) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_few_vertices() {
        let result = ColliderShape::polygon(vec![DVec2::ZERO, DVec2::X]);
        assert_eq!(result.unwrap_err(), ShapeError::TooFewVertices);
    }

    #[test]
    fn rejects_non_convex_polygon() {
        let verts = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
        ];
        assert_eq!(
            ColliderShape::polygon(verts).unwrap_err(),
            ShapeError::NotConvexOrCcw
        );
    }

    #[test]
    fn accepts_ccw_square() {
        let verts = vec![
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ];
        assert!(ColliderShape::polygon(verts).is_ok());
    }

    #[test]
    fn filter_symmetry_blocks_disjoint_masks() {
        let a = CollisionFilter { layer: 0b01, mask: 0b10 };
        let b = CollisionFilter { layer: 0b10, mask: 0b01 };
        assert!(a.collides_with(&b));
        let c = CollisionFilter { layer: 0b100, mask: 0xFFFF };
        assert!(!a.collides_with(&c));
    }
}
