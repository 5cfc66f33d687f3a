//! Closest-point and support helpers shared by the narrow-phase generators.
//! Pure geometry, no state.

use glam::DVec2;

/// Closest point on an axis-aligned box (given as min/max corners) to `point`.
pub fn closest_point_on_aabb(point: DVec2, min: DVec2, max: DVec2) -> DVec2 {
    DVec2::new(point.x.clamp(min.x, max.x), point.y.clamp(min.y, max.y))
}

/// Closest point on the segment `a..b` to `point`, along with the parametric `t`.
pub fn closest_point_on_segment(point: DVec2, a: DVec2, b: DVec2) -> (DVec2, f64) {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 < 1e-18 {
        return (a, 0.0);
    }
    let t = ((point - a).dot(ab) / len2).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Closest point on a convex polygon's boundary (CCW `vertices`) to `point`,
/// along with the outward normal of the edge it lies on. Used by the
/// circle-polygon generator's closest-feature fallback.
pub fn closest_point_on_polygon(point: DVec2, vertices: &[DVec2]) -> (DVec2, DVec2) {
    let n = vertices.len();
    let mut best_dist2 = f64::INFINITY;
    let mut best_point = vertices[0];
    let mut best_normal = DVec2::X;

    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let (closest, _) = closest_point_on_segment(point, a, b);
        let dist2 = (closest - point).length_squared();
        if dist2 < best_dist2 {
            best_dist2 = dist2;
            best_point = closest;
            let edge = b - a;
            best_normal = DVec2::new(edge.y, -edge.x).normalize_or_zero();
        }
    }

    (best_point, best_normal)
}

/// True if `point` lies inside (or on) the convex polygon, assuming CCW winding
/// and that every interior point has a non-positive signed distance to every
/// edge's outward normal.
pub fn point_inside_polygon(point: DVec2, vertices: &[DVec2], normals: &[DVec2]) -> bool {
    for i in 0..vertices.len() {
        if normals[i].dot(point - vertices[i]) > 1e-9 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_on_aabb_clamps_into_box() {
        let p = closest_point_on_aabb(DVec2::new(5.0, 0.0), DVec2::new(-1.0, -1.0), DVec2::new(1.0, 1.0));
        assert_eq!(p, DVec2::new(1.0, 0.0));
    }

    #[test]
    fn point_inside_unit_square() {
        let verts = vec![
            DVec2::new(-1.0, -1.0),
            DVec2::new(1.0, -1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(-1.0, 1.0),
        ];
        let normals: Vec<DVec2> = (0..4)
            .map(|i| {
                let a = verts[i];
                let b = verts[(i + 1) % 4];
                let edge = b - a;
                DVec2::new(edge.y, -edge.x).normalize_or_zero()
            })
            .collect();
        assert!(point_inside_polygon(DVec2::ZERO, &verts, &normals));
        assert!(!point_inside_polygon(DVec2::new(5.0, 0.0), &verts, &normals));
    }
}
