//! Sutherland-Hodgman polygon clipping against a pair of side planes, used by
//! the polygon-polygon and polygon-AABB contact generators to cut the
//! incident edge down to the reference face.

use glam::DVec2;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: DVec2,
    pub distance: f64,
}

impl Plane {
    pub fn from_point_normal(point: DVec2, normal: DVec2) -> Self {
        let n = normal.normalize_or_zero();
        Self {
            normal: n,
            distance: n.dot(point),
        }
    }

    fn signed_distance(&self, point: DVec2) -> f64 {
        self.normal.dot(point) - self.distance
    }
}

/// Clips a (2-point) segment against a list of planes, keeping points whose
/// signed distance is `<= 0`. Returns at most 2 points, appropriate for
/// clipping the incident edge of a 2D manifold.
pub fn clip_segment(segment: &[DVec2], planes: &[Plane]) -> Vec<DVec2> {
    let mut output = segment.to_vec();
    for plane in planes {
        output = clip_against_plane(&output, *plane);
        if output.len() < 2 {
            break;
        }
    }
    output
}

fn clip_against_plane(points: &[DVec2], plane: Plane) -> Vec<DVec2> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let mut out = Vec::new();
    for i in 0..points.len() - 1 {
        let current = points[i];
        let next = points[i + 1];

        let d_current = plane.signed_distance(current);
        let d_next = plane.signed_distance(next);

        let current_inside = d_current <= EPSILON;
        let next_inside = d_next <= EPSILON;

        if current_inside {
            out.push(current);
        }
        if current_inside != next_inside {
            if let Some(hit) = line_plane_intersection(current, next, d_current, d_next) {
                out.push(hit);
            }
        }
    }
    let last = points[points.len() - 1];
    if plane.signed_distance(last) <= EPSILON {
        out.push(last);
    }
    out
}

fn line_plane_intersection(start: DVec2, end: DVec2, d_start: f64, d_end: f64) -> Option<DVec2> {
    let denom = d_start - d_end;
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = d_start / denom;
    Some(start + (end - start) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_segment_crossing_one_plane() {
        let segment = [DVec2::new(-2.0, 0.0), DVec2::new(2.0, 0.0)];
        let plane = Plane::from_point_normal(DVec2::new(1.0, 0.0), DVec2::X);
        let clipped = clip_segment(&segment, &[plane]);
        assert_eq!(clipped.len(), 2);
        assert!(clipped.iter().all(|p| p.x <= 1.0 + 1e-6));
    }
}
