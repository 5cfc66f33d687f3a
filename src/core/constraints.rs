use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::EntityId;

/// Frame-rate-independent spring parameterization (§4.5, glossary "Compliance").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Compliance {
    pub frequency_hz: f64,
    pub damping_ratio: f64,
}

impl Compliance {
    /// Translates (frequencyHz, dampingRatio) into the TGS-Soft bias/gamma
    /// terms used by the velocity solver, for a constraint point with
    /// effective mass `effective_mass` stepped at `h`.
    ///
    /// Standard soft-constraint derivation (as used by Box2D/Rapier-style
    /// solvers): `omega = 2*pi*f`, `c = h*omega*(2*zeta + h*omega)`,
    /// `gamma = 1 / (h*omega*c)`, `beta = h*omega / c`.
    pub fn bias_gamma(&self, effective_mass: f64, h: f64) -> (f64, f64) {
        if self.frequency_hz <= 0.0 {
            return (1.0, 0.0);
        }
        let omega = 2.0 * std::f64::consts::PI * self.frequency_hz;
        let c = h * omega * (2.0 * self.damping_ratio + h * omega);
        if c.abs() < 1e-12 {
            return (1.0, 0.0);
        }
        let beta = h * omega / c;
        let gamma = 1.0 / (c * effective_mass.max(1e-12));
        (beta, gamma)
    }
}

/// A user-created joint between two bodies. Four kinds per §4.5, each
/// reducing to a 1-DOF constraint at the solver (distance joints) or two
/// stacked 1-DOF constraints (revolute joints pin both axes of a pivot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Joint {
    RigidDistance {
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        rest_distance: f64,
        #[serde(skip)]
        accumulated_impulse: f64,
    },
    SoftDistance {
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        rest_distance: f64,
        compliance: Compliance,
        #[serde(skip)]
        accumulated_impulse: f64,
    },
    RigidRevolute {
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        #[serde(skip)]
        accumulated_impulse: DVec2,
    },
    SoftRevolute {
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        compliance: Compliance,
        #[serde(skip)]
        accumulated_impulse: DVec2,
    },
}

impl Joint {
    pub fn bodies(&self) -> (EntityId, EntityId) {
        match self {
            Joint::RigidDistance { body_a, body_b, .. }
            | Joint::SoftDistance { body_a, body_b, .. }
            | Joint::RigidRevolute { body_a, body_b, .. }
            | Joint::SoftRevolute { body_a, body_b, .. } => (*body_a, *body_b),
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, Joint::SoftDistance { .. } | Joint::SoftRevolute { .. })
    }

    pub fn new_rigid_distance(
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        rest_distance: f64,
    ) -> Self {
        Joint::RigidDistance {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            rest_distance,
            accumulated_impulse: 0.0,
        }
    }

    pub fn new_soft_distance(
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        rest_distance: f64,
        frequency_hz: f64,
        damping_ratio: f64,
    ) -> Self {
        Joint::SoftDistance {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            rest_distance,
            compliance: Compliance {
                frequency_hz,
                damping_ratio,
            },
            accumulated_impulse: 0.0,
        }
    }

    pub fn new_rigid_revolute(
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
    ) -> Self {
        Joint::RigidRevolute {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            accumulated_impulse: DVec2::ZERO,
        }
    }

    pub fn new_soft_revolute(
        body_a: EntityId,
        body_b: EntityId,
        anchor_a: DVec2,
        anchor_b: DVec2,
        frequency_hz: f64,
        damping_ratio: f64,
    ) -> Self {
        Joint::SoftRevolute {
            body_a,
            body_b,
            anchor_a,
            anchor_b,
            compliance: Compliance {
                frequency_hz,
                damping_ratio,
            },
            accumulated_impulse: DVec2::ZERO,
        }
    }
}
