//! Fixed-step time integrators for the N-body system
//!
//! Every integrator reads the force field accumulated for the current step
//! and advances positions and velocities in place. A particle's new position
//! and velocity are computed first and stored together, so no particle is
//! ever left with one updated and not the other.
//!
//! - [`ExplicitEuler`]: semi-implicit (Euler–Cromer), velocity first
//! - [`ImplicitEuler`]: bounded fixed-point relaxation against the step's forces
//! - [`ForwardEuler`]: position from the old velocity, for comparison only

use tracing::debug;

use super::states::{ForceField, NVec, Particle};

/// Advances every particle by one step of size `delta_t`
pub trait Integrator {
    fn name(&self) -> &'static str;

    fn integrate(&self, particles: &mut [Particle], forces: &ForceField, delta_t: f64);
}

/// Semi-implicit Euler.
///
/// v_n+1 = v_n + dt * F/m
/// x_n+1 = x_n + dt * v_n+1
///
/// The velocity update must come first; this ordering is what makes the
/// scheme symplectic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitEuler;

impl Integrator for ExplicitEuler {
    fn name(&self) -> &'static str {
        "explicit_euler"
    }

    fn integrate(&self, particles: &mut [Particle], forces: &ForceField, delta_t: f64) {
        for (i, p) in particles.iter_mut().enumerate() {
            // a_n = F_n / m, from the force field accumulated at x_n
            let a = &forces[i] / p.mass();

            // Kick: v_n+1 = v_n + dt * a_n
            let v_new = &p.v + &a * delta_t;

            // Drift with the velocity just updated: x_n+1 = x_n + dt * v_n+1
            let x_new = &p.x + &v_new * delta_t;

            p.v = v_new;
            p.x = x_new;
        }
    }
}

pub const IMPLICIT_TOLERANCE: f64 = 1e-5;
pub const IMPLICIT_MAX_ITERATIONS: usize = 10;

/// Implicit Euler approximated by fixed-point iteration.
///
/// Starting from the explicit estimate, the pair
/// `v = v_n + dt * F/m`, `x = x_n + dt * v` is recomputed until two successive
/// iterates differ by less than `tolerance` in every component of both
/// position and velocity, or until `max_iterations` is reached. The force is
/// the one accumulated at the start of the step; it is not re-evaluated at
/// the trial positions.
///
/// Hitting the iteration cap is not an error: the last iterate is kept.
#[derive(Debug, Clone, Copy)]
pub struct ImplicitEuler {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ImplicitEuler {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Relax one particle. Returns the final estimate and whether it converged
    fn relax(&self, p: &Particle, a: &NVec, delta_t: f64) -> (NVec, NVec, bool) {
        // Starting iterate is the explicit estimate:
        // v^0 = v_n + dt * a_n, x^0 = x_n + dt * v^0
        let mut v_new = &p.v + a * delta_t;
        let mut x_new = &p.x + &v_new * delta_t;

        for _ in 0..self.max_iterations {
            // Next iterate from the same start of step state
            // a_n is held fixed, the force is not re-evaluated at x^k
            // v^k+1 = v_n + dt * a_n
            let v_next = &p.v + a * delta_t;
            // x^k+1 = x_n + dt * v^k+1
            let x_next = &p.x + &v_next * delta_t;

            // Largest component change between successive iterates (infinity norm)
            let dv = (&v_next - &v_new).amax();
            let dx = (&x_next - &x_new).amax();

            v_new = v_next;
            x_new = x_next;

            // Both position and velocity must have settled
            if dx < self.tolerance && dv < self.tolerance {
                return (x_new, v_new, true);
            }
        }

        // Cap reached: keep the last iterate, the caller decides what to report
        (x_new, v_new, false)
    }
}

impl Default for ImplicitEuler {
    fn default() -> Self {
        Self::new(IMPLICIT_TOLERANCE, IMPLICIT_MAX_ITERATIONS)
    }
}

impl Integrator for ImplicitEuler {
    fn name(&self) -> &'static str {
        "implicit_euler"
    }

    fn integrate(&self, particles: &mut [Particle], forces: &ForceField, delta_t: f64) {
        let mut capped = 0usize;

        for (i, p) in particles.iter_mut().enumerate() {
            // a_n = F_n / m, fixed for the whole relaxation
            let a = &forces[i] / p.mass();

            // Relax x_n+1, v_n+1 for this particle; count those that ran out of iterations
            let (x_new, v_new, converged) = self.relax(p, &a, delta_t);
            if !converged {
                capped += 1;
            }

            p.v = v_new;
            p.x = x_new;
        }

        if capped > 0 {
            debug!(
                capped,
                max_iterations = self.max_iterations,
                "implicit relaxation hit the iteration cap, keeping last estimate"
            );
        }
    }
}

/// Classic forward Euler.
///
/// x_n+1 = x_n + dt * v_n
/// v_n+1 = v_n + dt * F/m
///
/// Not symplectic: energy drifts secularly on closed orbits. Never chosen by
/// the automatic selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn name(&self) -> &'static str {
        "forward_euler"
    }

    fn integrate(&self, particles: &mut [Particle], forces: &ForceField, delta_t: f64) {
        for (i, p) in particles.iter_mut().enumerate() {
            let a = &forces[i] / p.mass();

            // Drift with the old velocity: x_n+1 = x_n + dt * v_n
            let x_new = &p.x + &p.v * delta_t;

            // Kick: v_n+1 = v_n + dt * a_n
            let v_new = &p.v + &a * delta_t;

            p.v = v_new;
            p.x = x_new;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_particle() -> (Vec<Particle>, ForceField) {
        let p = Particle::from_slices(2.0, &[1.0, 0.0], &[0.0, 1.0]).unwrap();
        let mut forces = ForceField::new(1, 2);
        forces[0][0] = 4.0; // a = (2, 0)
        (vec![p], forces)
    }

    #[test]
    fn explicit_euler_updates_velocity_before_position() {
        let (mut particles, forces) = free_particle();
        ExplicitEuler.integrate(&mut particles, &forces, 0.5);

        // v = (0, 1) + 0.5 * (2, 0) = (1, 1); x = (1, 0) + 0.5 * (1, 1)
        assert!((particles[0].v[0] - 1.0).abs() < 1e-12);
        assert!((particles[0].v[1] - 1.0).abs() < 1e-12);
        assert!((particles[0].x[0] - 1.5).abs() < 1e-12);
        assert!((particles[0].x[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn forward_euler_uses_old_velocity_for_position() {
        let (mut particles, forces) = free_particle();
        ForwardEuler.integrate(&mut particles, &forces, 0.5);

        assert!((particles[0].v[0] - 1.0).abs() < 1e-12);
        assert!((particles[0].x[0] - 1.0).abs() < 1e-12);
        assert!((particles[0].x[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn implicit_relaxation_converges_to_explicit_update() {
        let (mut a, forces) = free_particle();
        let mut b = a.clone();
        ImplicitEuler::default().integrate(&mut a, &forces, 0.1);
        ExplicitEuler.integrate(&mut b, &forces, 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn implicit_relaxation_accepts_estimate_at_cap() {
        let (mut particles, forces) = free_particle();
        let integrator = ImplicitEuler::new(0.0, 3);

        let (x, v, converged) = integrator.relax(&particles[0], &(&forces[0] / 2.0), 0.5);
        assert!(!converged);

        integrator.integrate(&mut particles, &forces, 0.5);
        assert_eq!(particles[0].x, x);
        assert_eq!(particles[0].v, v);
    }

    #[test]
    fn implicit_relaxation_with_zero_cap_keeps_explicit_estimate() {
        let (mut a, forces) = free_particle();
        let mut b = a.clone();
        ImplicitEuler::new(IMPLICIT_TOLERANCE, 0).integrate(&mut a, &forces, 0.25);
        ExplicitEuler.integrate(&mut b, &forces, 0.25);
        assert_eq!(a, b);
    }
}
