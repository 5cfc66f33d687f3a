//! Spatial queries: AABB overlap and raycasting against the current body set.

use glam::DVec2;

use crate::core::shape::ColliderShape;
use crate::core::soa::BodiesSoA;
use crate::utils::allocator::EntityId;

#[derive(Debug, Clone, Copy)]
pub struct RaycastQuery {
    pub origin: DVec2,
    pub direction: DVec2,
    pub max_distance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RaycastHit {
    pub body_id: EntityId,
    pub point: DVec2,
    pub normal: DVec2,
    pub distance: f64,
}

/// Every body whose world AABB overlaps the query box, per §4.9.
pub fn query_aabb(bodies: &BodiesSoA, min: DVec2, max: DVec2) -> Vec<EntityId> {
    let mut hits = Vec::new();
    for body in bodies.iter() {
        let (body_min, body_max) = body.shape().world_aabb(body.transform());
        let overlaps = body_min.x <= max.x
            && body_max.x >= min.x
            && body_min.y <= max.y
            && body_max.y >= min.y;
        if overlaps {
            hits.push(body.id());
        }
    }
    hits
}

/// Casts a ray against every body and returns the nearest hit within
/// `query.max_distance`, if any.
pub fn raycast(bodies: &BodiesSoA, query: &RaycastQuery) -> Option<RaycastHit> {
    let direction = query.direction.normalize_or_zero();
    if direction == DVec2::ZERO {
        return None;
    }

    let mut closest: Option<RaycastHit> = None;

    for body in bodies.iter() {
        let hit = match body.shape() {
            ColliderShape::Circle { radius } => {
                ray_vs_circle(query.origin, direction, body.transform().position, *radius)
            }
            ColliderShape::Aabb { half_extents } => {
                ray_vs_aabb(query.origin, direction, body.transform().position, *half_extents)
            }
            ColliderShape::Polygon { .. } => {
                let verts = body.shape().world_polygon(body.transform());
                let normals = body.shape().world_normals(body.transform());
                ray_vs_polygon(query.origin, direction, &verts, &normals)
            }
        };

        if let Some((point, normal, distance)) = hit {
            if distance < 0.0 || distance > query.max_distance {
                continue;
            }
            let better = match &closest {
                Some(current) => distance < current.distance,
                None => true,
            };
            if better {
                closest = Some(RaycastHit {
                    body_id: body.id(),
                    point,
                    normal,
                    distance,
                });
            }
        }
    }

    closest
}

fn ray_vs_circle(origin: DVec2, direction: DVec2, center: DVec2, radius: f64) -> Option<(DVec2, DVec2, f64)> {
    let to_center = center - origin;
    let proj = to_center.dot(direction);
    let closest_approach2 = to_center.length_squared() - proj * proj;
    let radius2 = radius * radius;
    if closest_approach2 > radius2 {
        return None;
    }
    let half_chord = (radius2 - closest_approach2).sqrt();
    let t_near = proj - half_chord;
    let t = if t_near >= 0.0 { t_near } else { proj + half_chord };
    if t < 0.0 {
        return None;
    }
    let point = origin + direction * t;
    let normal = (point - center).normalize_or_zero();
    Some((point, normal, t))
}

fn ray_vs_aabb(origin: DVec2, direction: DVec2, center: DVec2, half_extents: DVec2) -> Option<(DVec2, DVec2, f64)> {
    let min = center - half_extents;
    let max = center + half_extents;

    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    let mut normal = DVec2::ZERO;

    for axis in 0..2 {
        let (o, d, lo, hi) = if axis == 0 {
            (origin.x, direction.x, min.x, max.x)
        } else {
            (origin.y, direction.y, min.y, max.y)
        };

        if d.abs() < 1e-12 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut t1 = (lo - o) * inv_d;
        let mut t2 = (hi - o) * inv_d;
        let mut axis_normal_sign = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            axis_normal_sign = 1.0;
        }
        if t1 > t_min {
            t_min = t1;
            normal = if axis == 0 {
                DVec2::new(axis_normal_sign, 0.0)
            } else {
                DVec2::new(0.0, axis_normal_sign)
            };
        }
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    let t = if t_min >= 0.0 { t_min } else { t_max };
    if t < 0.0 {
        return None;
    }
    Some((origin + direction * t, normal, t))
}

fn ray_vs_polygon(
    origin: DVec2,
    direction: DVec2,
    verts: &[DVec2],
    normals: &[DVec2],
) -> Option<(DVec2, DVec2, f64)> {
    let n = verts.len();
    let mut best: Option<(DVec2, DVec2, f64)> = None;

    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let edge = b - a;
        let denom = direction.perp_dot(edge);
        if denom.abs() < 1e-12 {
            continue;
        }
        let diff = a - origin;
        let t = diff.perp_dot(edge) / denom;
        let u = diff.perp_dot(direction) / denom;
        if t < 0.0 || !(0.0..=1.0).contains(&u) {
            continue;
        }
        if normals[i].dot(direction) >= 0.0 {
            continue;
        }
        let point = origin + direction * t;
        if best.map(|(_, _, best_t)| t < best_t).unwrap_or(true) {
            best = Some((point, normals[i], t));
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BodyKind, ColliderShape, RigidBody};

    #[test]
    fn raycast_hits_circle_head_on() {
        let mut bodies = BodiesSoA::new();
        let mut body = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::circle(1.0));
        body.transform.position = DVec2::new(5.0, 0.0);
        bodies.insert(body);

        let query = RaycastQuery {
            origin: DVec2::ZERO,
            direction: DVec2::X,
            max_distance: 100.0,
        };
        let hit = raycast(&bodies, &query).unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn raycast_misses_when_pointed_away() {
        let mut bodies = BodiesSoA::new();
        let mut body = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::circle(1.0));
        body.transform.position = DVec2::new(5.0, 0.0);
        bodies.insert(body);

        let query = RaycastQuery {
            origin: DVec2::ZERO,
            direction: DVec2::NEG_X,
            max_distance: 100.0,
        };
        assert!(raycast(&bodies, &query).is_none());
    }

    #[test]
    fn query_aabb_reports_overlapping_bodies() {
        let mut bodies = BodiesSoA::new();
        let mut body = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::aabb(0.5, 0.5));
        body.transform.position = DVec2::ZERO;
        let id = bodies.insert(body);

        let hits = query_aabb(&bodies, DVec2::splat(-1.0), DVec2::splat(1.0));
        assert_eq!(hits, vec![id]);
    }
}
