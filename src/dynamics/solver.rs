//! Sub-stepped TGS-Soft / Sequential-Impulses velocity solver plus a
//! Nonlinear-Gauss-Seidel position correction pass, per §4.6 steps 2-3 and 5.

use glam::{DMat2, DVec2};

use super::friction::apply_friction;
use crate::collision::contact::{pair_is_dormant, ManifoldCache};
use crate::config::WorldConfig;
use crate::core::constraints::Joint;
use crate::core::soa::BodiesSoA;
use crate::utils::allocator::{Arena, EntityId};

/// Mirrors [`pair_is_dormant`] for a joint's two endpoints: a joint between
/// two sleeping (or one sleeping, one static) bodies must not be re-solved
/// every substep, or its accumulated impulse would wake them right back up.
fn joint_is_dormant(bodies: &BodiesSoA, a: EntityId, b: EntityId) -> bool {
    match (bodies.get(a), bodies.get(b)) {
        (Some(a), Some(b)) => pair_is_dormant(&a, &b),
        _ => true,
    }
}

/// Summary of one `solve_velocities` pass, for the host's diagnostic logging
/// (§5's wall-time/solver observability hook). No per-island breakdown: this
/// solver runs a single global pass rather than the teacher's per-island
/// parallel dispatch, so there's nothing to attribute per-island here.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolverStepMetrics {
    pub contacts_solved: usize,
    pub joints_solved: usize,
    pub normal_impulse_sum: f64,
    pub tangent_impulse_sum: f64,
}

impl SolverStepMetrics {
    pub fn merge(&mut self, other: &SolverStepMetrics) {
        self.contacts_solved += other.contacts_solved;
        self.joints_solved += other.joints_solved;
        self.normal_impulse_sum += other.normal_impulse_sum;
        self.tangent_impulse_sum += other.tangent_impulse_sum;
    }
}

pub struct Solver {
    velocity_iterations: u32,
    position_iterations: u32,
    slop: f64,
    correction_rate: f64,
    restitution_velocity_threshold: f64,
}

impl Solver {
    pub fn new(config: &WorldConfig) -> Self {
        Self {
            velocity_iterations: config.velocity_iterations,
            position_iterations: config.position_iterations,
            slop: config.slop,
            correction_rate: config.position_correction_rate,
            restitution_velocity_threshold: config.restitution_velocity_threshold,
        }
    }

    /// Warm-starts then runs the velocity-iteration loop (§4.6 steps 5),
    /// leaving position integration (step 6) to the caller before
    /// [`Solver::correct_positions`] (step 7) runs.
    pub fn solve_velocities(&self, bodies: &mut BodiesSoA, manifolds: &mut ManifoldCache, joints: &mut Arena<Joint>, h: f64) {
        self.warm_start(bodies, manifolds, joints);

        for _ in 0..self.velocity_iterations {
            self.solve_contacts(bodies, manifolds, h);
            self.solve_joints(bodies, joints, h);
        }
    }

    /// Snapshot of the impulses currently accumulated in `manifolds`/`joints`,
    /// taken after a `solve_velocities` pass. Used only for diagnostics.
    pub fn collect_metrics(&self, manifolds: &ManifoldCache, joints: &Arena<Joint>) -> SolverStepMetrics {
        let mut metrics = SolverStepMetrics::default();
        for manifold in manifolds.iter() {
            metrics.contacts_solved += manifold.points.len();
            for point in &manifold.points {
                metrics.normal_impulse_sum += point.normal_impulse.abs();
                metrics.tangent_impulse_sum += point.tangent_impulse.abs();
            }
        }
        metrics.joints_solved = joints.len();
        metrics
    }

    /// Runs the position-correction iteration loop (§4.6 step 7).
    pub fn correct_positions(&self, bodies: &mut BodiesSoA, manifolds: &mut ManifoldCache, joints: &mut Arena<Joint>) {
        for _ in 0..self.position_iterations {
            self.correct_contact_positions(bodies, manifolds);
            self.correct_joint_positions(bodies, joints);
        }
    }

    fn warm_start(&self, bodies: &mut BodiesSoA, manifolds: &mut ManifoldCache, joints: &mut Arena<Joint>) {
        for manifold in manifolds.iter() {
            let (mut a, mut b) = match bodies.get2_mut(manifold.body_a, manifold.body_b) {
                Some(pair) => pair,
                None => continue,
            };
            for point in &manifold.points {
                let normal_impulse = manifold.normal * point.normal_impulse;
                let tangent = DVec2::new(-manifold.normal.y, manifold.normal.x);
                let tangent_impulse = tangent * point.tangent_impulse;
                let impulse = normal_impulse + tangent_impulse;
                a.apply_impulse_at(-impulse, point.world_point);
                b.apply_impulse_at(impulse, point.world_point);
            }
        }

        for joint in joints.iter_mut() {
            let (a, b) = joint.bodies();
            if joint_is_dormant(bodies, a, b) {
                continue;
            }
            warm_start_joint(bodies, joint);
        }
    }

    fn solve_contacts(&self, bodies: &mut BodiesSoA, manifolds: &mut ManifoldCache, _h: f64) {
        for manifold in manifolds.iter_mut() {
            let (mut a, mut b) = match bodies.get2_mut(manifold.body_a, manifold.body_b) {
                Some(pair) => pair,
                None => continue,
            };
            let normal = manifold.normal;
            let restitution = manifold.material.restitution;
            let friction = manifold.material.friction;

            for point in &mut manifold.points {
                let r_a = point.world_point - a.transform.position;
                let r_b = point.world_point - b.transform.position;

                let v_a = a.velocity.point_velocity(r_a);
                let v_b = b.velocity.point_velocity(r_b);
                let relative_velocity = v_b - v_a;
                let vn = relative_velocity.dot(normal);

                let rn_a = r_a.perp_dot(normal);
                let rn_b = r_b.perp_dot(normal);
                let k = *a.inverse_mass + *b.inverse_mass + rn_a * rn_a * (*a.inverse_inertia) + rn_b * rn_b * (*b.inverse_inertia);
                if k <= 1e-12 {
                    continue;
                }
                let effective_mass = 1.0 / k;

                // Restitution bias only kicks in for approaching contacts at
                // or beyond the threshold, avoiding energy injection at rest.
                let bias = if vn <= -self.restitution_velocity_threshold {
                    -restitution * vn
                } else {
                    0.0
                };

                let lambda = -(vn - bias) * effective_mass;
                let new_impulse = (point.normal_impulse + lambda).max(0.0);
                let delta = new_impulse - point.normal_impulse;
                point.normal_impulse = new_impulse;

                let impulse = normal * delta;
                a.apply_impulse_at(-impulse, point.world_point);
                b.apply_impulse_at(impulse, point.world_point);

                apply_friction(
                    &mut a,
                    &mut b,
                    point.world_point,
                    normal,
                    point.normal_impulse,
                    friction,
                    &mut point.tangent_impulse,
                );
            }
        }
    }

    fn solve_joints(&self, bodies: &mut BodiesSoA, joints: &mut Arena<Joint>, h: f64) {
        for joint in joints.iter_mut() {
            let (a, b) = joint.bodies();
            if joint_is_dormant(bodies, a, b) {
                continue;
            }
            solve_joint_velocity(bodies, joint, h);
        }
    }

    fn correct_contact_positions(&self, bodies: &mut BodiesSoA, manifolds: &mut ManifoldCache) {
        for manifold in manifolds.iter_mut() {
            let (mut a, mut b) = match bodies.get2_mut(manifold.body_a, manifold.body_b) {
                Some(pair) => pair,
                None => continue,
            };
            let normal = manifold.normal;
            for point in &mut manifold.points {
                let penetration = point.depth - self.slop;
                if penetration <= 0.0 {
                    continue;
                }
                let inv_mass_sum = *a.inverse_mass + *b.inverse_mass;
                if inv_mass_sum <= 1e-12 {
                    continue;
                }
                let correction = (penetration * self.correction_rate / inv_mass_sum).max(0.0);
                if !a.is_static() {
                    a.transform.position -= normal * (correction * (*a.inverse_mass));
                }
                if !b.is_static() {
                    b.transform.position += normal * (correction * (*b.inverse_mass));
                }
                point.depth = (point.depth - correction * inv_mass_sum).max(0.0);
            }
        }
    }

    fn correct_joint_positions(&self, bodies: &mut BodiesSoA, joints: &mut Arena<Joint>) {
        for joint in joints.iter_mut() {
            if joint.is_soft() {
                // Soft joints rely entirely on the velocity bias; adding a
                // hard NGS correction on top would fight the compliance.
                continue;
            }
            let (a, b) = joint.bodies();
            if joint_is_dormant(bodies, a, b) {
                continue;
            }
            correct_rigid_joint_position(bodies, joint, self.correction_rate);
        }
    }
}

fn anchor_world(bodies: &BodiesSoA, id: crate::utils::allocator::EntityId, local_anchor: DVec2) -> Option<DVec2> {
    bodies.get(id).map(|b| b.transform().point_to_world(local_anchor))
}

fn distance_constraint_bodies(joint: &Joint) -> Option<(crate::utils::allocator::EntityId, crate::utils::allocator::EntityId, DVec2, DVec2, f64)> {
    match joint {
        Joint::RigidDistance { body_a, body_b, anchor_a, anchor_b, rest_distance, .. }
        | Joint::SoftDistance { body_a, body_b, anchor_a, anchor_b, rest_distance, .. } => {
            Some((*body_a, *body_b, *anchor_a, *anchor_b, *rest_distance))
        }
        _ => None,
    }
}

fn warm_start_joint(bodies: &mut BodiesSoA, joint: &Joint) {
    match joint {
        Joint::RigidDistance { body_a, body_b, anchor_a, anchor_b, accumulated_impulse, .. }
        | Joint::SoftDistance { body_a, body_b, anchor_a, anchor_b, accumulated_impulse, .. } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            let n = (world_b - world_a).normalize_or_zero();
            if let Some((mut a, mut b)) = bodies.get2_mut(*body_a, *body_b) {
                let impulse = n * (*accumulated_impulse);
                a.apply_impulse_at(-impulse, world_a);
                b.apply_impulse_at(impulse, world_b);
            }
        }
        Joint::RigidRevolute { body_a, body_b, anchor_a, anchor_b, accumulated_impulse }
        | Joint::SoftRevolute { body_a, body_b, anchor_a, anchor_b, accumulated_impulse, .. } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            if let Some((mut a, mut b)) = bodies.get2_mut(*body_a, *body_b) {
                a.apply_impulse_at(-*accumulated_impulse, world_a);
                b.apply_impulse_at(*accumulated_impulse, world_b);
            }
        }
    }
}

fn k_matrix_point(inv_mass: f64, inv_inertia: f64, r: DVec2) -> DMat2 {
    let pr = DVec2::new(-r.y, r.x);
    DMat2::from_cols(
        DVec2::new(inv_mass + inv_inertia * pr.x * pr.x, inv_inertia * pr.x * pr.y),
        DVec2::new(inv_inertia * pr.x * pr.y, inv_mass + inv_inertia * pr.y * pr.y),
    )
}

fn solve_joint_velocity(bodies: &mut BodiesSoA, joint: &mut Joint, h: f64) {
    match joint {
        Joint::RigidDistance { body_a, body_b, anchor_a, anchor_b, rest_distance, accumulated_impulse } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            let (mut a, mut b) = match bodies.get2_mut(*body_a, *body_b) {
                Some(pair) => pair,
                None => return,
            };
            let delta = world_b - world_a;
            let dist = delta.length().max(1e-9);
            let n = delta / dist;

            let r_a = world_a - a.transform.position;
            let r_b = world_b - b.transform.position;
            let rn_a = r_a.perp_dot(n);
            let rn_b = r_b.perp_dot(n);
            let k = *a.inverse_mass + *b.inverse_mass + rn_a * rn_a * (*a.inverse_inertia) + rn_b * rn_b * (*b.inverse_inertia);
            if k <= 1e-12 {
                return;
            }
            let effective_mass = 1.0 / k;

            let cdot = n.dot(b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a));
            let lambda = -cdot * effective_mass;
            *accumulated_impulse += lambda;

            let impulse = n * lambda;
            a.apply_impulse_at(-impulse, world_a);
            b.apply_impulse_at(impulse, world_b);
            let _ = rest_distance;
        }
        Joint::SoftDistance { body_a, body_b, anchor_a, anchor_b, rest_distance, compliance, accumulated_impulse } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            let (mut a, mut b) = match bodies.get2_mut(*body_a, *body_b) {
                Some(pair) => pair,
                None => return,
            };
            let delta = world_b - world_a;
            let dist = delta.length().max(1e-9);
            let n = delta / dist;
            let c = dist - *rest_distance;

            let r_a = world_a - a.transform.position;
            let r_b = world_b - b.transform.position;
            let rn_a = r_a.perp_dot(n);
            let rn_b = r_b.perp_dot(n);
            let k = *a.inverse_mass + *b.inverse_mass + rn_a * rn_a * (*a.inverse_inertia) + rn_b * rn_b * (*b.inverse_inertia);
            if k <= 1e-12 {
                return;
            }

            let (beta, gamma) = compliance.bias_gamma(1.0 / k, h);
            let soft_k = k + gamma;
            if soft_k <= 1e-12 {
                return;
            }
            let soft_mass = 1.0 / soft_k;

            let cdot = n.dot(b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a));
            let bias = beta * c;
            let lambda = -soft_mass * (cdot + bias) - gamma * soft_mass * (*accumulated_impulse);
            *accumulated_impulse += lambda;

            let impulse = n * lambda;
            a.apply_impulse_at(-impulse, world_a);
            b.apply_impulse_at(impulse, world_b);
        }
        Joint::RigidRevolute { body_a, body_b, anchor_a, anchor_b, accumulated_impulse } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            let (mut a, mut b) = match bodies.get2_mut(*body_a, *body_b) {
                Some(pair) => pair,
                None => return,
            };
            let r_a = world_a - a.transform.position;
            let r_b = world_b - b.transform.position;
            let k = k_matrix_point(*a.inverse_mass, *a.inverse_inertia, r_a) + k_matrix_point(*b.inverse_mass, *b.inverse_inertia, r_b);
            if k.determinant().abs() <= 1e-12 {
                return;
            }
            let k_inv = k.inverse();

            let cdot = b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a);
            let impulse = k_inv * (-cdot);
            *accumulated_impulse += impulse;

            a.apply_impulse_at(-impulse, world_a);
            b.apply_impulse_at(impulse, world_b);
        }
        Joint::SoftRevolute { body_a, body_b, anchor_a, anchor_b, compliance, accumulated_impulse } => {
            let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
            let (mut a, mut b) = match bodies.get2_mut(*body_a, *body_b) {
                Some(pair) => pair,
                None => return,
            };
            let r_a = world_a - a.transform.position;
            let r_b = world_b - b.transform.position;
            let k = k_matrix_point(*a.inverse_mass, *a.inverse_inertia, r_a) + k_matrix_point(*b.inverse_mass, *b.inverse_inertia, r_b);

            let trace_k = k.x_axis.x + k.y_axis.y;
            let (beta, gamma) = compliance.bias_gamma(2.0 / trace_k.max(1e-9), h);
            let soft_k = DMat2::from_cols(
                DVec2::new(k.x_axis.x + gamma, k.x_axis.y),
                DVec2::new(k.y_axis.x, k.y_axis.y + gamma),
            );
            if soft_k.determinant().abs() <= 1e-12 {
                return;
            }
            let soft_k_inv = soft_k.inverse();

            let c = world_b - world_a;
            let cdot = b.velocity.point_velocity(r_b) - a.velocity.point_velocity(r_a);
            let bias = c * beta;
            let impulse = soft_k_inv * (-(cdot + bias)) - *accumulated_impulse * gamma;
            *accumulated_impulse += impulse;

            a.apply_impulse_at(-impulse, world_a);
            b.apply_impulse_at(impulse, world_b);
        }
    }
}

fn correct_rigid_joint_position(bodies: &mut BodiesSoA, joint: &Joint, correction_rate: f64) {
    if let Some((body_a, body_b, anchor_a, anchor_b, rest_distance)) = distance_constraint_bodies(joint) {
        let (Some(world_a), Some(world_b)) = (anchor_world(bodies, body_a, anchor_a), anchor_world(bodies, body_b, anchor_b)) else { return };
        let delta = world_b - world_a;
        let dist = delta.length().max(1e-9);
        let c = dist - rest_distance;
        if c.abs() < 1e-6 {
            return;
        }
        let n = delta / dist;
        correct_point_pair(bodies, body_a, body_b, n * c * correction_rate);
        return;
    }

    if let Joint::RigidRevolute { body_a, body_b, anchor_a, anchor_b, .. } = joint {
        let (Some(world_a), Some(world_b)) = (anchor_world(bodies, *body_a, *anchor_a), anchor_world(bodies, *body_b, *anchor_b)) else { return };
        let c = world_b - world_a;
        if c.length_squared() < 1e-12 {
            return;
        }
        correct_point_pair(bodies, *body_a, *body_b, c * correction_rate);
    }
}

fn correct_point_pair(bodies: &mut BodiesSoA, body_a: crate::utils::allocator::EntityId, body_b: crate::utils::allocator::EntityId, error: DVec2) {
    let (mut a, mut b) = match bodies.get2_mut(body_a, body_b) {
        Some(pair) => pair,
        None => return,
    };
    let inv_mass_sum = *a.inverse_mass + *b.inverse_mass;
    if inv_mass_sum <= 1e-12 {
        return;
    }
    if !a.is_static() {
        a.transform.position += error * (*a.inverse_mass / inv_mass_sum);
    }
    if !b.is_static() {
        b.transform.position -= error * (*b.inverse_mass / inv_mass_sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::core::{BodyKind, ColliderShape, RigidBody};
    use crate::utils::allocator::EntityId;

    #[test]
    fn resting_circle_on_static_floor_stops_penetrating() {
        let config = WorldConfig::default();
        let solver = Solver::new(&config);

        let mut bodies = BodiesSoA::new();
        let mut floor = RigidBody::new(EntityId::default(), BodyKind::Static, ColliderShape::aabb(5.0, 0.5));
        floor.transform.position = DVec2::new(0.0, -0.5);
        let floor_id = bodies.insert(floor);

        let mut ball = RigidBody::new(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5));
        ball.transform.position = DVec2::new(0.0, 0.2);
        let ball_id = bodies.insert(ball);

        let mut manifolds = ManifoldCache::new();
        let mut joints: Arena<Joint> = Arena::new();
        manifolds.refresh(&bodies, &[(floor_id.min(ball_id), floor_id.max(ball_id))]);

        let h = 1.0 / 60.0;
        solver.solve_velocities(&mut bodies, &mut manifolds, &mut joints, h);
        crate::dynamics::integrator::integrate_positions(&mut bodies, h);
        solver.correct_positions(&mut bodies, &mut manifolds, &mut joints);

        let after = bodies.get(ball_id).unwrap();
        assert!(after.velocity().linear.y >= -1e-6);
    }
}
