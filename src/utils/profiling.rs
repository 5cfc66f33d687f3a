use std::time::{Duration, Instant};

/// Per-step timing and population counters, attached to a [`crate::world::PhysicsWorld`]
/// and refreshed at the end of every `step` call.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicsProfiler {
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub solver_time: Duration,
    pub integrator_time: Duration,
    pub total_frame_time: Duration,

    pub body_count: usize,
    pub contact_count: usize,
    pub active_island_count: usize,
}

impl PhysicsProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Emits a `log::debug!` summary of the last frame. No-op if nothing was timed.
    pub fn report(&self) {
        let total_us = self.total_frame_time.as_micros() as f64;
        if total_us < 1.0 {
            return;
        }

        log::debug!(
            "physics frame: {:.2}ms bodies={} contacts={} islands={} (broad {:.1}% narrow {:.1}% solve {:.1}% integrate {:.1}%)",
            self.total_frame_time.as_secs_f64() * 1000.0,
            self.body_count,
            self.contact_count,
            self.active_island_count,
            self.broad_phase_time.as_micros() as f64 / total_us * 100.0,
            self.narrow_phase_time.as_micros() as f64 / total_us * 100.0,
            self.solver_time.as_micros() as f64 / total_us * 100.0,
            self.integrator_time.as_micros() as f64 / total_us * 100.0,
        );
    }
}

pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
