//! High-level runtime engine settings
//!
//! Selects the integrator (directly, or by the step-size threshold when set
//! to `auto`) and whether the energy diagnostic runs.

use crate::configuration::config::IntegratorConfig;
use crate::simulation::integrator::{ExplicitEuler, ForwardEuler, ImplicitEuler, Integrator};

/// Step sizes up to this value run with explicit Euler under `auto`.
/// A heuristic, not the result of a stability analysis.
pub const DEFAULT_EXPLICIT_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Engine {
    pub integrator: IntegratorConfig, // auto, or a fixed scheme
    pub threshold: f64,               // auto: explicit when delta_t <= threshold
    pub energy: bool,                 // compute energy drift every step
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Auto,
            threshold: DEFAULT_EXPLICIT_THRESHOLD,
            energy: true,
        }
    }
}

/// A concrete integration scheme, after `auto` has been resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    ExplicitEuler,
    ImplicitEuler,
    ForwardEuler,
}

impl IntegratorKind {
    pub fn build(self) -> Box<dyn Integrator + Send + Sync> {
        match self {
            IntegratorKind::ExplicitEuler => Box::new(ExplicitEuler),
            IntegratorKind::ImplicitEuler => Box::new(ImplicitEuler::default()),
            IntegratorKind::ForwardEuler => Box::new(ForwardEuler),
        }
    }
}

impl Engine {
    /// Resolve the configured integrator for a given step size
    pub fn select_integrator(&self, delta_t: f64) -> IntegratorKind {
        match self.integrator {
            IntegratorConfig::Auto => select_by_threshold(delta_t, self.threshold),
            IntegratorConfig::ExplicitEuler => IntegratorKind::ExplicitEuler,
            IntegratorConfig::ImplicitEuler => IntegratorKind::ImplicitEuler,
            IntegratorConfig::ForwardEuler => IntegratorKind::ForwardEuler,
        }
    }
}

/// Explicit Euler for `delta_t <= threshold`, implicit Euler above it
pub fn select_by_threshold(delta_t: f64, threshold: f64) -> IntegratorKind {
    if delta_t <= threshold {
        IntegratorKind::ExplicitEuler
    } else {
        IntegratorKind::ImplicitEuler
    }
}
