//! Central simulation container: owns body storage, the broad/narrow phase,
//! the contact cache, the constraint solver, and the island/sleep system,
//! and drives the fixed-sub-step pipeline that advances them together.

use std::time::{Duration, Instant};

use glam::DVec2;
use log::{debug, trace};

use crate::collision::broadphase::BroadPhase;
use crate::collision::contact::{ManifoldCache, ManifoldDebugInfo, PersistentManifold};
use crate::collision::queries::{self, RaycastHit, RaycastQuery};
use crate::config::{MAX_BODIES, MAX_CONSTRAINTS, WorldConfig};
use crate::core::constraints::Joint;
use crate::core::rigidbody::{BodyKind, RigidBody};
use crate::core::soa::BodiesSoA;
use crate::dynamics::island::IslandManager;
use crate::dynamics::integrator::{integrate_forces, integrate_positions};
use crate::dynamics::solver::{Solver, SolverStepMetrics};
use crate::utils::allocator::{Arena, EntityId};
use crate::utils::logging::warn_if_frame_budget_exceeded;
use crate::utils::profiling::{PhysicsProfiler, ScopedTimer};

/// Snapshot of one body's kinematic state, returned by [`PhysicsWorld::body_state`].
///
/// The all-zero value (the `Default`) is what an unknown or removed body id
/// reports: read access never fails, it just reports nothing happened here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyState {
    pub position: DVec2,
    pub angle: f64,
    pub linear_velocity: DVec2,
    pub angular_velocity: f64,
    pub sleeping: bool,
}

/// A single contact point, flattened out of the manifold cache for read access.
#[derive(Debug, Clone, Copy)]
pub struct ContactRow {
    pub body_a: EntityId,
    pub body_b: EntityId,
    pub point: DVec2,
    pub normal: DVec2,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    CapacityExceeded,
}

/// Central simulation container orchestrating all subsystems.
pub struct PhysicsWorld {
    bodies: BodiesSoA,
    joints: Arena<Joint>,
    broadphase: BroadPhase,
    manifolds: ManifoldCache,
    islands: IslandManager,
    solver: Solver,
    config: WorldConfig,
    accumulator: f64,
    /// Creation order of every body ever inserted, including since-removed
    /// ones; `all_body_states` filters this down to the live set so a slot
    /// reused by a later `createBody` doesn't reorder earlier bodies.
    insertion_order: Vec<EntityId>,
    pub profiler: PhysicsProfiler,
    manifold_debug_logging: bool,
    solver_metrics_logging: bool,
    last_solver_metrics: SolverStepMetrics,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl PhysicsWorld {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            bodies: BodiesSoA::new(),
            joints: Arena::new(),
            broadphase: BroadPhase::new(config.broadphase_cell_size),
            manifolds: ManifoldCache::new(),
            islands: IslandManager::new(),
            solver: Solver::new(&config),
            config,
            accumulator: 0.0,
            insertion_order: Vec::new(),
            profiler: PhysicsProfiler::default(),
            manifold_debug_logging: false,
            solver_metrics_logging: false,
            last_solver_metrics: SolverStepMetrics::default(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    // -- body lifecycle -----------------------------------------------------

    /// Inserts a fully-built body. Returns `None` if the live body count is
    /// already at [`MAX_BODIES`].
    pub fn create_body(&mut self, body: RigidBody) -> Result<EntityId, WorldError> {
        if self.bodies.len() >= MAX_BODIES {
            return Err(WorldError::CapacityExceeded);
        }
        let was_static = body.kind == BodyKind::Static;
        let id = self.bodies.insert(body);
        self.insertion_order.push(id);
        if was_static {
            self.broadphase.mark_static_dirty();
        }
        Ok(id)
    }

    /// Removes a body, dropping every joint and cached manifold that
    /// referenced it. Returns `false` for an unknown or already-removed id.
    pub fn remove_body(&mut self, id: EntityId) -> bool {
        let was_static = match self.bodies.get(id) {
            Some(body) => body.is_static(),
            None => return false,
        };

        if !self.bodies.remove(id) {
            return false;
        }

        self.manifolds.remove_body(id);

        let stale_joints: Vec<EntityId> = self
            .joints
            .ids()
            .filter(|&jid| {
                self.joints
                    .get(jid)
                    .map(|j| {
                        let (a, b) = j.bodies();
                        a == id || b == id
                    })
                    .unwrap_or(false)
            })
            .collect();
        for jid in stale_joints {
            self.joints.remove(jid);
        }

        if was_static {
            self.broadphase.mark_static_dirty();
        }
        true
    }

    pub fn body_state(&self, id: EntityId) -> BodyState {
        match self.bodies.get(id) {
            Some(body) => BodyState {
                position: body.transform().position,
                angle: body.transform().rotation.angle,
                linear_velocity: body.velocity().linear,
                angular_velocity: body.velocity().angular,
                sleeping: !body.is_awake(),
            },
            None => BodyState::default(),
        }
    }

    /// Every live body's state, in the order each was first created.
    pub fn all_body_states(&self) -> Vec<(EntityId, BodyState)> {
        self.insertion_order
            .iter()
            .filter(|&&id| self.bodies.is_valid(id))
            .map(|&id| (id, self.body_state(id)))
            .collect()
    }

    /// Teleports a body. No-op on static bodies and unknown ids. Wakes the body.
    pub fn set_body_position(&mut self, id: EntityId, position: DVec2) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            if body.is_static() {
                return;
            }
            body.transform.position = position;
            body.wake();
        }
    }

    pub fn set_body_velocity(&mut self, id: EntityId, velocity: DVec2) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            if body.is_static() {
                return;
            }
            body.velocity.linear = velocity;
            body.wake();
        }
    }

    pub fn set_body_angular_velocity(&mut self, id: EntityId, angular: f64) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            if body.is_static() {
                return;
            }
            body.velocity.angular = angular;
            body.wake();
        }
    }

    pub fn apply_force(&mut self, id: EntityId, force: DVec2) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            body.apply_force(force);
        }
    }

    pub fn apply_impulse(&mut self, id: EntityId, impulse: DVec2) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            body.apply_impulse(impulse);
        }
    }

    pub fn set_collision_layers(&mut self, id: EntityId, layer: u16, mask: u16) {
        if let Some(mut body) = self.bodies.get_mut(id) {
            body.filter.layer = layer;
            body.filter.mask = mask;
        }
    }

    // -- joints ---------------------------------------------------------

    fn wake_pair(&mut self, a: EntityId, b: EntityId) {
        if let Some(mut body) = self.bodies.get_mut(a) {
            body.wake();
        }
        if let Some(mut body) = self.bodies.get_mut(b) {
            body.wake();
        }
    }

    /// Distance joint pinned between the two bodies' local origins, held
    /// rigidly at `rest_distance`. Silently drops the request (no error,
    /// no-op) if either body is unknown or the constraint table is full.
    pub fn create_rigid_distance_joint(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        rest_distance: f64,
    ) -> Option<EntityId> {
        if self.joints.len() >= MAX_CONSTRAINTS
            || self.bodies.get(body_a).is_none()
            || self.bodies.get(body_b).is_none()
        {
            return None;
        }
        let joint = Joint::new_rigid_distance(body_a, body_b, DVec2::ZERO, DVec2::ZERO, rest_distance);
        let id = self.joints.insert(joint);
        self.wake_pair(body_a, body_b);
        Some(id)
    }

    pub fn create_soft_distance_joint(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        rest_distance: f64,
        frequency_hz: f64,
        damping_ratio: f64,
    ) -> Option<EntityId> {
        if self.joints.len() >= MAX_CONSTRAINTS
            || self.bodies.get(body_a).is_none()
            || self.bodies.get(body_b).is_none()
        {
            return None;
        }
        let joint = Joint::new_soft_distance(
            body_a,
            body_b,
            DVec2::ZERO,
            DVec2::ZERO,
            rest_distance,
            frequency_hz,
            damping_ratio,
        );
        let id = self.joints.insert(joint);
        self.wake_pair(body_a, body_b);
        Some(id)
    }

    /// Revolute joint pinning both bodies to the world-space `pivot`,
    /// converted to a body-local anchor on each at creation time.
    pub fn create_rigid_revolute_joint(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        pivot: DVec2,
    ) -> Option<EntityId> {
        if self.joints.len() >= MAX_CONSTRAINTS {
            return None;
        }
        let (anchor_a, anchor_b) = {
            let a = self.bodies.get(body_a)?;
            let b = self.bodies.get(body_b)?;
            (a.transform().point_to_local(pivot), b.transform().point_to_local(pivot))
        };
        let joint = Joint::new_rigid_revolute(body_a, body_b, anchor_a, anchor_b);
        let id = self.joints.insert(joint);
        self.wake_pair(body_a, body_b);
        Some(id)
    }

    pub fn create_soft_revolute_joint(
        &mut self,
        body_a: EntityId,
        body_b: EntityId,
        pivot: DVec2,
        frequency_hz: f64,
        damping_ratio: f64,
    ) -> Option<EntityId> {
        if self.joints.len() >= MAX_CONSTRAINTS {
            return None;
        }
        let (anchor_a, anchor_b) = {
            let a = self.bodies.get(body_a)?;
            let b = self.bodies.get(body_b)?;
            (a.transform().point_to_local(pivot), b.transform().point_to_local(pivot))
        };
        let joint = Joint::new_soft_revolute(body_a, body_b, anchor_a, anchor_b, frequency_hz, damping_ratio);
        let id = self.joints.insert(joint);
        self.wake_pair(body_a, body_b);
        Some(id)
    }

    pub fn remove_constraint(&mut self, id: EntityId) -> bool {
        self.joints.remove(id).is_some()
    }

    // -- queries ----------------------------------------------------------

    pub fn query_aabb(&self, min: DVec2, max: DVec2) -> Vec<EntityId> {
        queries::query_aabb(&self.bodies, min, max)
    }

    pub fn raycast(&self, query: &RaycastQuery) -> Option<RaycastHit> {
        queries::raycast(&self.bodies, query)
    }

    /// One row per contact point, across every live manifold.
    pub fn contacts(&self) -> Vec<ContactRow> {
        let mut rows = Vec::new();
        for manifold in self.manifolds.iter() {
            for point in &manifold.points {
                rows.push(ContactRow {
                    body_a: manifold.body_a,
                    body_b: manifold.body_b,
                    point: point.world_point,
                    normal: manifold.normal,
                    depth: point.depth,
                });
            }
        }
        rows
    }

    pub fn manifolds(&self) -> impl Iterator<Item = &PersistentManifold> {
        self.manifolds.iter()
    }

    // -- diagnostics --------------------------------------------------------

    /// Installs (or clears, with `None`) a per-manifold debug hook, called
    /// each time a manifold is regenerated during narrow phase.
    pub fn set_manifold_debug_hook<F>(&mut self, hook: Option<F>)
    where
        F: Fn(&ManifoldDebugInfo) + Send + Sync + 'static,
    {
        self.manifolds.set_debug_hook(hook);
    }

    pub fn manifold_debug_snapshots(&self) -> Vec<ManifoldDebugInfo> {
        self.manifolds.debug_snapshots()
    }

    /// Enables or disables `log::debug!` summaries of live manifolds at the
    /// end of every `step`.
    pub fn set_manifold_debug_logging(&mut self, enabled: bool) {
        self.manifold_debug_logging = enabled;
    }

    pub fn last_solver_metrics(&self) -> &SolverStepMetrics {
        &self.last_solver_metrics
    }

    /// Enables or disables `log::debug!` summaries of solver impulse sums at
    /// the end of every `step`.
    pub fn set_solver_metrics_logging(&mut self, enabled: bool) {
        self.solver_metrics_logging = enabled;
    }

    fn log_manifolds_if_needed(&self) {
        if !self.manifold_debug_logging {
            return;
        }
        let snapshots = self.manifold_debug_snapshots();
        if snapshots.is_empty() {
            return;
        }
        for snapshot in snapshots.iter().take(5) {
            let avg_depth =
                snapshot.points.iter().map(|p| p.depth).sum::<f64>() / snapshot.points.len() as f64;
            debug!(
                "manifold {:?}-{:?}: normal {:?} avg_depth {:.4} points {}",
                snapshot.body_a,
                snapshot.body_b,
                snapshot.normal,
                avg_depth,
                snapshot.points.len()
            );
        }
        if snapshots.len() > 5 {
            debug!("manifold debug logging truncated: showing 5 of {} manifolds", snapshots.len());
        }
    }

    fn log_solver_metrics_if_needed(&self) {
        if !self.solver_metrics_logging {
            return;
        }
        let metrics = &self.last_solver_metrics;
        debug!(
            "solver metrics: contacts={} joints={} normal_sum={:.4} tangent_sum={:.4}",
            metrics.contacts_solved,
            metrics.joints_solved,
            metrics.normal_impulse_sum,
            metrics.tangent_impulse_sum
        );
    }

    // -- simulation ---------------------------------------------------------

    /// Advances the simulation by `dt`, in fixed sub-steps of
    /// `config.substep_dt`. Non-finite or non-positive `dt` is a no-op;
    /// more than `config.substep_cap` worth of accumulated time is dropped
    /// rather than spiraling the simulation further behind real time.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let frame_start = Instant::now();
        self.accumulator += dt;
        let h = self.config.substep_dt;
        let mut steps_run = 0;
        let mut timings = StageTimings::default();
        let mut metrics = SolverStepMetrics::default();
        let mut active_islands = self.profiler.active_island_count;

        while self.accumulator >= h && steps_run < self.config.substep_cap {
            self.accumulator -= h;
            active_islands = self.substep(h, &mut timings, &mut metrics);
            steps_run += 1;
        }

        if steps_run == self.config.substep_cap {
            self.accumulator = 0.0;
        }

        self.profiler.broad_phase_time = timings.broad_phase;
        self.profiler.narrow_phase_time = timings.narrow_phase;
        self.profiler.solver_time = timings.solver;
        self.profiler.integrator_time = timings.integrator;
        self.profiler.total_frame_time = frame_start.elapsed();
        self.profiler.body_count = self.bodies.len();
        self.profiler.contact_count = self.manifolds.len();
        self.profiler.active_island_count = active_islands;
        self.last_solver_metrics = metrics;

        self.profiler.report();
        warn_if_frame_budget_exceeded(self.profiler.total_frame_time, self.config.frame_budget_ms);
        self.log_manifolds_if_needed();
        self.log_solver_metrics_if_needed();
    }

    fn substep(&mut self, h: f64, timings: &mut StageTimings, metrics: &mut SolverStepMetrics) -> usize {
        {
            let _timer = ScopedTimer::new(&mut timings.integrator);
            integrate_forces(&mut self.bodies, self.config.gravity, h);
        }

        let pairs = {
            let _timer = ScopedTimer::new(&mut timings.broad_phase);
            self.broadphase.candidate_pairs(&self.bodies)
        };

        {
            let _timer = ScopedTimer::new(&mut timings.narrow_phase);
            self.manifolds.refresh(&self.bodies, &pairs);
        }

        {
            let _timer = ScopedTimer::new(&mut timings.solver);
            self.solver.solve_velocities(&mut self.bodies, &mut self.manifolds, &mut self.joints, h);
        }
        metrics.merge(&self.solver.collect_metrics(&self.manifolds, &self.joints));

        {
            let _timer = ScopedTimer::new(&mut timings.integrator);
            integrate_positions(&mut self.bodies, h);
        }

        {
            let _timer = ScopedTimer::new(&mut timings.solver);
            self.solver.correct_positions(&mut self.bodies, &mut self.manifolds, &mut self.joints);
        }

        let active_islands = self.islands.update(&mut self.bodies, &self.manifolds, &self.joints, &self.config, h);

        trace!(
            "substep h={:.5} bodies={} manifolds={} joints={}",
            h,
            self.bodies.len(),
            self.manifolds.len(),
            self.joints.len()
        );

        active_islands
    }
}

#[derive(Default)]
struct StageTimings {
    broad_phase: Duration,
    narrow_phase: Duration,
    solver: Duration,
    integrator: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::ColliderShape;

    fn falling_ball(world: &mut PhysicsWorld) -> EntityId {
        let body = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
            .position(DVec2::new(0.0, 10.0))
            .build();
        world.create_body(body).unwrap()
    }

    #[test]
    fn free_fall_accumulates_downward_velocity() {
        let mut world = PhysicsWorld::default();
        let id = falling_ball(&mut world);

        for _ in 0..10 {
            world.step(1.0 / 60.0);
        }

        let state = world.body_state(id);
        assert!(state.linear_velocity.y < 0.0);
        assert!(state.position.y < 10.0);
    }

    #[test]
    fn unknown_body_state_is_all_zero() {
        let world = PhysicsWorld::default();
        let bogus = EntityId::new(999, 0);
        assert_eq!(world.body_state(bogus), BodyState::default());
    }

    #[test]
    fn removing_a_body_drops_its_joints() {
        let mut world = PhysicsWorld::default();
        let a = falling_ball(&mut world);
        let b = falling_ball(&mut world);
        let joint_id = world.create_rigid_distance_joint(a, b, 1.0).unwrap();

        world.remove_body(a);
        assert!(!world.remove_constraint(joint_id));
    }

    #[test]
    fn ball_resting_on_floor_settles_without_sinking_through() {
        let mut world = PhysicsWorld::default();
        let floor = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::aabb(5.0, 0.5))
            .position(DVec2::new(0.0, -0.5))
            .build();
        world.create_body(floor).unwrap();

        let ball = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
            .position(DVec2::new(0.0, 3.0))
            .build();
        let ball_id = world.create_body(ball).unwrap();

        for _ in 0..180 {
            world.step(1.0 / 60.0);
        }

        let state = world.body_state(ball_id);
        assert!(state.position.y > -0.2);
    }

    #[test]
    fn large_dt_is_clamped_instead_of_spiraling() {
        let mut world = PhysicsWorld::default();
        falling_ball(&mut world);
        world.step(100.0);
        assert_eq!(world.accumulator, 0.0);
    }
}
