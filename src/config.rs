//! Global configuration constants and the per-world tunable set.

/// Default gravity vector applied in a freshly created world.
pub const DEFAULT_GRAVITY: [f64; 2] = [0.0, -9.81];

/// Duration of one fixed sub-step, in seconds.
pub const DEFAULT_SUBSTEP_DT: f64 = 1.0 / 60.0;

/// Maximum number of sub-steps run by a single `step(dt)` call.
///
/// Bounds the worst-case cost of a step and prevents the accumulator from
/// spiraling when the host falls behind real time; excess `dt` is dropped.
pub const DEFAULT_SUBSTEP_CAP: u32 = 8;

/// Velocity-iteration count of the constraint solver.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Position-correction iteration count of the constraint solver.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Penetration allowed before the position solver starts correcting it.
pub const DEFAULT_SLOP: f64 = 0.005;

/// Fraction of remaining penetration corrected per position iteration.
pub const DEFAULT_POSITION_CORRECTION_RATE: f64 = 0.2;

/// Closing speed (in world units/second) a contact must reach before the
/// solver injects a restitution bias; below it the contact is treated as
/// resting and bounces are suppressed. Compared with `<=`, since a contact
/// generated at exactly this speed (e.g. a fresh approach with no prior
/// overlap) must still bounce rather than stick.
pub const DEFAULT_RESTITUTION_VELOCITY_THRESHOLD: f64 = 1.0;

/// Linear speed below which a body is a sleep candidate.
pub const DEFAULT_SLEEP_LINEAR_THRESHOLD: f64 = 0.01;

/// Angular speed below which a body is a sleep candidate.
pub const DEFAULT_SLEEP_ANGULAR_THRESHOLD: f64 = 0.01;

/// Continuous time a whole island must stay under threshold before sleeping.
pub const DEFAULT_SLEEP_TIME_THRESHOLD: f64 = 0.5;

/// Default cell size for the broad-phase uniform grid.
pub const DEFAULT_BROADPHASE_CELL_SIZE: f64 = 5.0;

/// Wall-clock budget a `step` call is expected to stay under; exceeding it
/// logs a warning rather than affecting simulation behavior.
pub const DEFAULT_FRAME_BUDGET_MS: f32 = 16.0;

/// Maximum number of vertices a polygon shape may declare.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Default material restitution, used when a body is created without one.
pub const DEFAULT_RESTITUTION: f64 = 0.3;

/// Default material friction, used when a body is created without one.
pub const DEFAULT_FRICTION: f64 = 0.5;

/// Default collision filter layer bit.
pub const DEFAULT_FILTER_LAYER: u16 = 1;

/// Default collision filter mask (collides with everything).
pub const DEFAULT_FILTER_MASK: u16 = 0xFFFF;

/// Default raycast distance when the host does not specify one.
pub const DEFAULT_RAYCAST_DISTANCE: f64 = 1000.0;

/// Hard cap on live bodies, mirrored by the façade's `CapacityExceeded` error.
pub const MAX_BODIES: usize = 1 << 16;

/// Hard cap on live constraints.
pub const MAX_CONSTRAINTS: usize = 1 << 16;

/// Tunable parameters for one [`crate::world::PhysicsWorld`].
///
/// Built via [`WorldConfig::builder`]; a world created with
/// `PhysicsWorld::new` uses [`WorldConfig::default`].
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    pub gravity: glam::DVec2,
    pub substep_dt: f64,
    pub substep_cap: u32,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub slop: f64,
    pub position_correction_rate: f64,
    pub restitution_velocity_threshold: f64,
    pub sleep_linear_threshold: f64,
    pub sleep_angular_threshold: f64,
    pub sleep_time_threshold: f64,
    pub broadphase_cell_size: f64,
    pub frame_budget_ms: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: glam::DVec2::new(DEFAULT_GRAVITY[0], DEFAULT_GRAVITY[1]),
            substep_dt: DEFAULT_SUBSTEP_DT,
            substep_cap: DEFAULT_SUBSTEP_CAP,
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            slop: DEFAULT_SLOP,
            position_correction_rate: DEFAULT_POSITION_CORRECTION_RATE,
            restitution_velocity_threshold: DEFAULT_RESTITUTION_VELOCITY_THRESHOLD,
            sleep_linear_threshold: DEFAULT_SLEEP_LINEAR_THRESHOLD,
            sleep_angular_threshold: DEFAULT_SLEEP_ANGULAR_THRESHOLD,
            sleep_time_threshold: DEFAULT_SLEEP_TIME_THRESHOLD,
            broadphase_cell_size: DEFAULT_BROADPHASE_CELL_SIZE,
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
        }
    }
}

impl WorldConfig {
    pub fn builder() -> WorldConfigBuilder {
        WorldConfigBuilder::new()
    }
}

/// Builder for [`WorldConfig`], in the same spirit as the engine's other builders.
pub struct WorldConfigBuilder {
    config: WorldConfig,
}

impl Default for WorldConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: WorldConfig::default(),
        }
    }

    pub fn gravity(mut self, gx: f64, gy: f64) -> Self {
        self.config.gravity = glam::DVec2::new(gx, gy);
        self
    }

    pub fn substep_dt(mut self, dt: f64) -> Self {
        self.config.substep_dt = dt;
        self
    }

    pub fn substep_cap(mut self, cap: u32) -> Self {
        self.config.substep_cap = cap;
        self
    }

    pub fn velocity_iterations(mut self, iterations: u32) -> Self {
        self.config.velocity_iterations = iterations;
        self
    }

    pub fn position_iterations(mut self, iterations: u32) -> Self {
        self.config.position_iterations = iterations;
        self
    }

    pub fn sleep_thresholds(mut self, linear: f64, angular: f64, time: f64) -> Self {
        self.config.sleep_linear_threshold = linear;
        self.config.sleep_angular_threshold = angular;
        self.config.sleep_time_threshold = time;
        self
    }

    pub fn restitution_velocity_threshold(mut self, threshold: f64) -> Self {
        self.config.restitution_velocity_threshold = threshold;
        self
    }

    pub fn frame_budget_ms(mut self, budget_ms: f32) -> Self {
        self.config.frame_budget_ms = budget_ms;
        self
    }

    pub fn build(self) -> WorldConfig {
        self.config
    }
}
