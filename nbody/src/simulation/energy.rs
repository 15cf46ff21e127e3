//! Total mechanical energy and its drift over a run.
//!
//! Potential energy follows the same coincident-pair policy as
//! [`NewtonianGravity`](crate::simulation::forces::NewtonianGravity): pairs at
//! zero unsoftened separation contribute nothing.

use crate::simulation::forces::pair_distance;
use crate::simulation::states::Particle;

/// `Σ ½ m |v|²`
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles
        .iter()
        .map(|p| 0.5 * p.mass() * p.v.norm_squared())
        .sum()
}

/// `Σ_{i<j} -G m_i m_j / |x_j - x_i|`
#[allow(non_snake_case)]
pub fn potential_energy(particles: &[Particle], G: f64, eps2: f64) -> f64 {
    let mut potential = 0.0;
    for (i, pi) in particles.iter().enumerate() {
        for pj in &particles[i + 1..] {
            let r2 = (&pj.x - &pi.x).norm_squared();
            if let Some(dist) = pair_distance(r2, eps2) {
                potential -= G * pi.mass() * pj.mass() / dist;
            }
        }
    }
    potential
}

#[allow(non_snake_case)]
pub fn total_energy(particles: &[Particle], G: f64, eps2: f64) -> f64 {
    kinetic_energy(particles) + potential_energy(particles, G, eps2)
}

/// Tracks the relative change of total energy against the first value seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDiagnostic {
    initial: f64,
}

impl EnergyDiagnostic {
    pub fn new(initial: f64) -> Self {
        Self { initial }
    }

    pub fn initial(&self) -> f64 {
        self.initial
    }

    /// `|E - E0| / |E0|`, or NaN when the baseline is exactly zero.
    pub fn drift(&self, current: f64) -> f64 {
        if self.initial == 0.0 {
            return f64::NAN;
        }
        ((current - self.initial) / self.initial).abs()
    }
}
