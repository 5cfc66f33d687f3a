//! Per-shape-pair contact generation. Six generators dispatched from shape
//! tags, each returning a normal (pointing from shape A to shape B) and up to
//! two world-space contact points with penetration depth, per §4.4.

use glam::DVec2;

use super::clipping::{clip_segment, Plane};
use super::shapes::{closest_point_on_aabb, closest_point_on_polygon, point_inside_polygon};
use crate::core::shape::ColliderShape;
use crate::core::types::Transform2;

pub struct ContactPointGeometry {
    pub point: DVec2,
    pub depth: f64,
}

pub struct ContactGeometry {
    pub normal: DVec2,
    pub points: Vec<ContactPointGeometry>,
}

/// Dispatches to the correct generator for the pair of shape tags. `None`
/// means the shapes do not currently overlap.
pub fn generate(
    shape_a: &ColliderShape,
    transform_a: &Transform2,
    shape_b: &ColliderShape,
    transform_b: &Transform2,
) -> Option<ContactGeometry> {
    use ColliderShape::*;
    match (shape_a, shape_b) {
        (Circle { radius: ra }, Circle { radius: rb }) => {
            circle_circle(transform_a.position, *ra, transform_b.position, *rb)
        }
        (Circle { radius }, Aabb { half_extents }) => {
            circle_aabb(transform_a.position, *radius, transform_b.position, *half_extents, false)
        }
        (Aabb { half_extents }, Circle { radius }) => {
            circle_aabb(transform_b.position, *radius, transform_a.position, *half_extents, true)
        }
        (Aabb { half_extents: ha }, Aabb { half_extents: hb }) => {
            aabb_aabb(transform_a.position, *ha, transform_b.position, *hb)
        }
        (Circle { radius }, Polygon { .. }) => {
            let verts = shape_b.world_polygon(transform_b);
            circle_polygon(transform_a.position, *radius, &verts, false)
        }
        (Polygon { .. }, Circle { radius }) => {
            let verts = shape_a.world_polygon(transform_a);
            circle_polygon(transform_b.position, *radius, &verts, true)
        }
        (Polygon { .. }, Polygon { .. })
        | (Polygon { .. }, Aabb { .. })
        | (Aabb { .. }, Polygon { .. }) => polygon_polygon(
            &shape_a.world_polygon(transform_a),
            &shape_a.world_normals(transform_a),
            &shape_b.world_polygon(transform_b),
            &shape_b.world_normals(transform_b),
        ),
    }
}

fn circle_circle(ca: DVec2, ra: f64, cb: DVec2, rb: f64) -> Option<ContactGeometry> {
    let delta = cb - ca;
    let dist = delta.length();
    let penetration = ra + rb - dist;
    if penetration <= 0.0 {
        return None;
    }
    let normal = if dist > 1e-9 { delta / dist } else { DVec2::X };
    let point = ca + normal * ra;
    Some(ContactGeometry {
        normal,
        points: vec![ContactPointGeometry { point, depth: penetration }],
    })
}

/// `flipped` means the caller logically wants (AABB, circle) with the AABB as
/// shape A; the geometry below is always computed circle-relative-to-box and
/// the normal is negated at the end when `flipped`.
fn circle_aabb(
    circle_pos: DVec2,
    radius: f64,
    aabb_pos: DVec2,
    half_extents: DVec2,
    flipped: bool,
) -> Option<ContactGeometry> {
    let min = aabb_pos - half_extents;
    let max = aabb_pos + half_extents;
    let closest = closest_point_on_aabb(circle_pos, min, max);
    let delta = circle_pos - closest;
    let dist2 = delta.length_squared();

    let (normal_circle_to_box, penetration) = if dist2 > 1e-18 {
        let dist = dist2.sqrt();
        if dist >= radius {
            return None;
        }
        (-delta / dist, radius - dist)
    } else {
        let local = circle_pos - aabb_pos;
        let overlap_x = half_extents.x - local.x.abs();
        let overlap_y = half_extents.y - local.y.abs();
        if overlap_x < overlap_y {
            (DVec2::new(-local.x.signum(), 0.0), overlap_x + radius)
        } else {
            (DVec2::new(0.0, -local.y.signum()), overlap_y + radius)
        }
    };

    let normal_a_to_b = if flipped {
        normal_circle_to_box
    } else {
        -normal_circle_to_box
    };
    let point = circle_pos - normal_circle_to_box * radius;
    Some(ContactGeometry {
        normal: normal_a_to_b,
        points: vec![ContactPointGeometry { point, depth: penetration }],
    })
}

fn aabb_aabb(pos_a: DVec2, half_a: DVec2, pos_b: DVec2, half_b: DVec2) -> Option<ContactGeometry> {
    let delta = pos_b - pos_a;
    let overlap_x = half_a.x + half_b.x - delta.x.abs();
    let overlap_y = half_a.y + half_b.y - delta.y.abs();
    if overlap_x <= 0.0 || overlap_y <= 0.0 {
        return None;
    }

    let (normal, penetration) = if overlap_x < overlap_y {
        (DVec2::new(delta.x.signum(), 0.0), overlap_x)
    } else {
        (DVec2::new(0.0, delta.y.signum()), overlap_y)
    };

    let min_a = pos_a - half_a;
    let max_a = pos_a + half_a;
    let min_b = pos_b - half_b;
    let max_b = pos_b + half_b;

    let points = if normal.x.abs() > 0.5 {
        let y_lo = min_a.y.max(min_b.y);
        let y_hi = max_a.y.min(max_b.y);
        let x = if normal.x > 0.0 { max_a.x } else { min_a.x };
        vec![
            ContactPointGeometry { point: DVec2::new(x, y_lo), depth: penetration },
            ContactPointGeometry { point: DVec2::new(x, y_hi), depth: penetration },
        ]
    } else {
        let x_lo = min_a.x.max(min_b.x);
        let x_hi = max_a.x.min(max_b.x);
        let y = if normal.y > 0.0 { max_a.y } else { min_a.y };
        vec![
            ContactPointGeometry { point: DVec2::new(x_lo, y), depth: penetration },
            ContactPointGeometry { point: DVec2::new(x_hi, y), depth: penetration },
        ]
    };

    Some(ContactGeometry { normal, points })
}

fn circle_polygon(circle_pos: DVec2, radius: f64, verts: &[DVec2], flipped: bool) -> Option<ContactGeometry> {
    let normals: Vec<DVec2> = (0..verts.len())
        .map(|i| {
            let edge = verts[(i + 1) % verts.len()] - verts[i];
            DVec2::new(edge.y, -edge.x).normalize_or_zero()
        })
        .collect();

    if point_inside_polygon(circle_pos, verts, &normals) {
        let (closest, edge_normal) = closest_point_on_polygon(circle_pos, verts);
        let penetration = radius + (closest - circle_pos).length();
        let normal_a_to_b = if flipped { -edge_normal } else { edge_normal };
        return Some(ContactGeometry {
            normal: normal_a_to_b,
            points: vec![ContactPointGeometry { point: closest, depth: penetration }],
        });
    }

    let (closest, _) = closest_point_on_polygon(circle_pos, verts);
    let delta = circle_pos - closest;
    let dist = delta.length();
    if dist >= radius {
        return None;
    }
    let normal_poly_to_circle = if dist > 1e-9 { delta / dist } else { DVec2::X };
    let normal_a_to_b = if flipped { -normal_poly_to_circle } else { normal_poly_to_circle };
    Some(ContactGeometry {
        normal: normal_a_to_b,
        points: vec![ContactPointGeometry { point: closest, depth: radius - dist }],
    })
}

/// SAT against all edge normals of both polygons; on no separating axis, the
/// axis of least penetration becomes the reference face and the incident
/// edge is clipped against its side planes (Sutherland-Hodgman).
fn polygon_polygon(
    verts_a: &[DVec2],
    normals_a: &[DVec2],
    verts_b: &[DVec2],
    normals_b: &[DVec2],
) -> Option<ContactGeometry> {
    let (best_pen_a, best_idx_a) = max_separation(verts_a, normals_a, verts_b)?;
    let (best_pen_b, best_idx_b) = max_separation(verts_b, normals_b, verts_a)?;

    if best_pen_a < 0.0 || best_pen_b < 0.0 {
        return None;
    }

    let (ref_verts, ref_normals, ref_idx, inc_verts, flip) = if best_pen_a <= best_pen_b {
        (verts_a, normals_a, best_idx_a, verts_b, false)
    } else {
        (verts_b, normals_b, best_idx_b, verts_a, true)
    };

    let ref_normal = ref_normals[ref_idx];
    let ref_v1 = ref_verts[ref_idx];
    let ref_v2 = ref_verts[(ref_idx + 1) % ref_verts.len()];

    let inc_len = inc_verts.len();
    let inc_idx = (0..inc_len)
        .map(|i| {
            let edge = inc_verts[(i + 1) % inc_len] - inc_verts[i];
            let n = DVec2::new(edge.y, -edge.x).normalize_or_zero();
            (i, n.dot(ref_normal))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .map(|(i, _)| i)?;

    let inc_v1 = inc_verts[inc_idx];
    let inc_v2 = inc_verts[(inc_idx + 1) % inc_len];

    let tangent = DVec2::new(-ref_normal.y, ref_normal.x);
    let side_planes = [
        Plane::from_point_normal(ref_v1, -tangent),
        Plane::from_point_normal(ref_v2, tangent),
    ];

    let clipped = clip_segment(&[inc_v1, inc_v2], &side_planes);
    if clipped.len() < 2 {
        return None;
    }

    let face_plane = Plane::from_point_normal(ref_v1, ref_normal);
    let mut points = Vec::new();
    for p in clipped {
        let separation = face_plane.normal.dot(p) - face_plane.distance;
        if separation <= 0.0 {
            points.push(ContactPointGeometry { point: p, depth: -separation });
        }
    }
    if points.is_empty() {
        return None;
    }
    points.truncate(2);

    let normal = if flip { -ref_normal } else { ref_normal };
    Some(ContactGeometry { normal, points })
}

fn max_separation(verts: &[DVec2], normals: &[DVec2], other: &[DVec2]) -> Option<(f64, usize)> {
    let mut best_sep = f64::NEG_INFINITY;
    let mut best_idx = 0;
    for (i, &normal) in normals.iter().enumerate() {
        let face_point = verts[i];
        let min_support = other
            .iter()
            .map(|&v| normal.dot(v - face_point))
            .fold(f64::INFINITY, f64::min);
        if min_support > 0.0 {
            return None;
        }
        let separation = -min_support;
        if separation > best_sep {
            best_sep = separation;
            best_idx = i;
        }
    }
    Some((best_sep, best_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_circle_detects_overlap() {
        let g = circle_circle(DVec2::ZERO, 1.0, DVec2::new(1.5, 0.0), 1.0).unwrap();
        assert!(g.points[0].depth > 0.0);
        assert!(g.normal.x > 0.0);
    }

    #[test]
    fn circle_circle_no_contact_when_apart() {
        assert!(circle_circle(DVec2::ZERO, 1.0, DVec2::new(5.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn aabb_aabb_overlap_produces_two_points() {
        let g = aabb_aabb(DVec2::ZERO, DVec2::splat(0.5), DVec2::new(0.3, 0.0), DVec2::splat(0.5)).unwrap();
        assert_eq!(g.points.len(), 2);
        assert!(g.normal.x > 0.0);
    }

    #[test]
    fn polygon_polygon_box_overlap_detects_contact() {
        let verts_a = vec![
            DVec2::new(-0.5, -0.5),
            DVec2::new(0.5, -0.5),
            DVec2::new(0.5, 0.5),
            DVec2::new(-0.5, 0.5),
        ];
        let normals_a: Vec<DVec2> = (0..4)
            .map(|i| {
                let edge = verts_a[(i + 1) % 4] - verts_a[i];
                DVec2::new(edge.y, -edge.x).normalize_or_zero()
            })
            .collect();
        let verts_b: Vec<DVec2> = verts_a.iter().map(|v| *v + DVec2::new(0.3, 0.0)).collect();
        let g = polygon_polygon(&verts_a, &normals_a, &verts_b, &normals_a).unwrap();
        assert!(!g.points.is_empty());
        assert!(g.normal.x > 0.0);
    }

    #[test]
    fn circle_polygon_detects_overlap_from_outside() {
        let verts = vec![
            DVec2::new(-0.5, -0.5),
            DVec2::new(0.5, -0.5),
            DVec2::new(0.5, 0.5),
            DVec2::new(-0.5, 0.5),
        ];
        let g = circle_polygon(DVec2::new(0.9, 0.0), 0.5, &verts, false).unwrap();
        assert!(g.points[0].depth > 0.0);
    }
}
