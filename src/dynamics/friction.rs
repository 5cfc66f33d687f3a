//! 2D Coulomb friction. Rolling and torsional friction from the teacher's 3D
//! solver have no counterpart here: a circle/AABB/polygon contact point has
//! no meaningful spin axis perpendicular to the 2D plane to resist.

use glam::DVec2;

use crate::core::soa::BodyMut;

/// Applies tangential (Coulomb) friction at a single contact point, clamping
/// the tangent impulse to `friction * normal_impulse` per §4.6 step 2's
/// friction-cone description. `tangent_impulse` is the running accumulator
/// for this point, carried across solver iterations by the caller.
pub fn apply_friction(
    body_a: &mut BodyMut,
    body_b: &mut BodyMut,
    world_point: DVec2,
    normal: DVec2,
    normal_impulse: f64,
    friction: f64,
    tangent_impulse: &mut f64,
) {
    if normal_impulse <= 0.0 {
        *tangent_impulse = 0.0;
        return;
    }

    let r_a = world_point - body_a.transform.position;
    let r_b = world_point - body_b.transform.position;

    let v_a = body_a.velocity.point_velocity(r_a);
    let v_b = body_b.velocity.point_velocity(r_b);
    let relative_vel = v_b - v_a;

    let tangent = DVec2::new(-normal.y, normal.x);
    let relative_tangent_speed = relative_vel.dot(tangent);

    let tangent_r_a = r_a.perp_dot(tangent);
    let tangent_r_b = r_b.perp_dot(tangent);
    let effective_mass_inv = *body_a.inverse_mass
        + *body_b.inverse_mass
        + tangent_r_a * tangent_r_a * (*body_a.inverse_inertia)
        + tangent_r_b * tangent_r_b * (*body_b.inverse_inertia);
    if effective_mass_inv <= 1e-12 {
        return;
    }

    let lambda = -relative_tangent_speed / effective_mass_inv;
    let max_friction = friction * normal_impulse;
    let new_impulse = (*tangent_impulse + lambda).clamp(-max_friction, max_friction);
    let delta = new_impulse - *tangent_impulse;
    *tangent_impulse = new_impulse;

    let impulse = tangent * delta;
    body_a.apply_impulse_at(-impulse, world_point);
    body_b.apply_impulse_at(impulse, world_point);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::soa::BodiesSoA;
    use crate::core::{BodyKind, ColliderShape, RigidBody};
    use crate::utils::allocator::EntityId;

    #[test]
    fn friction_opposes_sliding_without_exceeding_cone() {
        let mut bodies = BodiesSoA::new();
        let mut a = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5));
        a.velocity.linear = DVec2::new(2.0, 0.0);
        let id_a = bodies.insert(a);
        let b = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::aabb(1.0, 1.0));
        let id_b = bodies.insert(b);

        let (mut body_a, mut body_b) = bodies.get2_mut(id_a, id_b).unwrap();
        let mut tangent_impulse = 0.0;
        apply_friction(
            &mut body_a,
            &mut body_b,
            DVec2::new(0.0, -0.5),
            DVec2::new(0.0, 1.0),
            1.0,
            0.5,
            &mut tangent_impulse,
        );
        assert!(tangent_impulse.abs() <= 0.5 + 1e-9);
        assert!(body_a.velocity.linear.x < 2.0);
    }
}
