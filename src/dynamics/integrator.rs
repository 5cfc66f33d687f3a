//! Semi-implicit (symplectic) Euler integration of forces and positions,
//! the first and last steps of the sub-step pipeline in §4.6.

use crate::core::soa::BodiesSoA;

/// Applies accumulated force/torque and gravity to every dynamic body's
/// velocity, then clears the accumulators. Static and kinematic bodies are
/// skipped (`BodyMut::apply_force` already no-ops for them, but gravity is
/// applied here directly so the skip is explicit).
pub fn integrate_forces(bodies: &mut BodiesSoA, gravity: glam::DVec2, h: f64) {
    for id in bodies.ids().collect::<Vec<_>>() {
        if let Some(mut body) = bodies.get_mut(id) {
            if !body.is_dynamic() || !body.flags.is_awake {
                *body.force_accum = glam::DVec2::ZERO;
                *body.torque_accum = 0.0;
                continue;
            }

            let linear_accel = *body.force_accum * (*body.inverse_mass) + gravity;
            body.velocity.linear += linear_accel * h;
            body.velocity.angular += (*body.torque_accum) * (*body.inverse_inertia) * h;

            *body.force_accum = glam::DVec2::ZERO;
            *body.torque_accum = 0.0;
        }
    }
}

/// Advances every awake dynamic or kinematic body's transform by its current
/// velocity.
pub fn integrate_positions(bodies: &mut BodiesSoA, h: f64) {
    for id in bodies.ids().collect::<Vec<_>>() {
        if let Some(mut body) = bodies.get_mut(id) {
            if body.is_static() || !body.flags.is_awake {
                continue;
            }
            body.transform.position += body.velocity.linear * h;
            body.transform.rotation.angle += body.velocity.angular * h;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BodyKind, ColliderShape, RigidBody};
    use crate::utils::allocator::EntityId;
    use glam::DVec2;

    #[test]
    fn free_fall_gains_downward_velocity() {
        let mut bodies = BodiesSoA::new();
        let body = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(1.0));
        let id = bodies.insert(body);

        integrate_forces(&mut bodies, DVec2::new(0.0, -9.81), 1.0 / 60.0);
        let after = bodies.get(id).unwrap();
        assert!(after.velocity().linear.y < 0.0);
    }

    #[test]
    fn static_bodies_never_move() {
        let mut bodies = BodiesSoA::new();
        let body = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::circle(1.0));
        let id = bodies.insert(body);

        integrate_forces(&mut bodies, DVec2::new(0.0, -9.81), 1.0 / 60.0);
        integrate_positions(&mut bodies, 1.0 / 60.0);
        let after = bodies.get(id).unwrap();
        assert_eq!(after.velocity().linear, DVec2::ZERO);
        assert_eq!(after.transform().position, DVec2::ZERO);
    }
}
