//! Force contributors for the n-body engine
//!
//! Defines the `ForceLaw` trait, the `ForceSet` that sums every registered
//! law into a `ForceField`, and direct O(N²) Newtonian gravity.
//!
//! Coincident particles: with `eps2 == 0` a pair at zero separation is
//! skipped (no force, no potential). With `eps2 > 0` every separation is
//! softened to `sqrt(r² + eps2)` so the singularity can never be reached.

use crate::simulation::states::{ForceField, Particle};

/// Collection of force terms. Each term implements [`ForceLaw`] and their
/// contributions are summed into a single force vector per particle
pub struct ForceSet {
    terms: Vec<Box<dyn ForceLaw + Send + Sync>>,
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: ForceLaw + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Rebuild `out` for the current particle state.
    /// `out[i]` is zeroed, then set to the sum of contributions from all terms
    pub fn accumulate_forces(&self, particles: &[Particle], out: &mut ForceField) {
        out.zero();
        for term in &self.terms {
            term.accumulate(particles, out);
        }
    }
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

/// A force source. Implementations add their contribution into `out[i]`
/// for each particle and must not clear what is already there
pub trait ForceLaw {
    fn accumulate(&self, particles: &[Particle], out: &mut ForceField);
}

/// Direct-sum Newtonian gravity
#[allow(non_snake_case)]
#[derive(Debug, Clone)]
pub struct NewtonianGravity {
    pub G: f64,    // gravitational constant
    pub eps2: f64, // softening, 0 = skip coincident pairs
}

impl ForceLaw for NewtonianGravity {
    fn accumulate(&self, particles: &[Particle], out: &mut ForceField) {
        let n = particles.len();
        if n < 2 { // nobody to pair with, no force
            return;
        }

        // Loop over each unordered pair (q, k) with q < k, so every pair is visited once
        for q in 0..n {
            // pq: particle q (left side of the pair)
            let pq = &particles[q];
            let mq = pq.mass(); // mass of particle q

            for k in (q + 1)..n {
                // pk: particle k (right side of the pair)
                let pk = &particles[k];
                let mk = pk.mass(); // mass of particle k

                // r is the displacement vector from q to k
                // q feels a pull along +r, k feels a pull along -r
                let r = &pk.x - &pq.x;

                // Squared separation |r|^2, before softening
                let r2 = r.norm_squared();

                // Softened distance sqrt(|r|^2 + eps2)
                // A coincident pair without softening has no defined direction: skip it
                let Some(dist) = pair_distance(r2, self.eps2) else {
                    continue;
                };

                // 1 / |r_soft|^3
                let inv_r3 = (dist * dist * dist).recip();

                // Magnitude factor G m_q m_k / |r_soft|^3
                // Multiplied by r this gives G m_q m_k r / |r_soft|^3, the force on q
                let coef = self.G * mq * mk * inv_r3;

                // Newton's third law: equal and opposite contributions
                out[q].axpy(coef, &r, 1.0);  // F_q += coef * r
                out[k].axpy(-coef, &r, 1.0); // F_k -= coef * r
            }
        }
    }
}

/// Effective separation for a pair with squared distance `r2`.
/// `None` means the pair is coincident and unsoftened, and must be skipped
pub(crate) fn pair_distance(r2: f64, eps2: f64) -> Option<f64> {
    let d2 = r2 + eps2;
    if d2 == 0.0 {
        None
    } else {
        Some(d2.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(m: f64, x: &[f64]) -> Particle {
        Particle::from_slices(m, x, &vec![0.0; x.len()]).unwrap()
    }

    fn gravity(g: f64, eps2: f64) -> ForceSet {
        ForceSet::new().with(NewtonianGravity { G: g, eps2 })
    }

    #[test]
    fn coincident_pair_is_skipped() {
        let particles = vec![particle(1.0, &[1.0, 1.0]), particle(2.0, &[1.0, 1.0])];
        let mut out = ForceField::new(2, 2);
        gravity(1.0, 0.0).accumulate_forces(&particles, &mut out);
        assert!(out.iter().all(|f| f.iter().all(|c| c.is_finite() && *c == 0.0)));
    }

    #[test]
    fn coincident_pair_with_softening_is_finite() {
        let particles = vec![particle(1.0, &[0.0]), particle(1.0, &[0.0]), particle(1.0, &[2.0])];
        let mut out = ForceField::new(3, 1);
        gravity(1.0, 0.01).accumulate_forces(&particles, &mut out);
        assert!(out.iter().all(|f| f[0].is_finite()));
        // the two coincident particles exert no net force on each other
        assert!((out[0][0] - out[1][0]).abs() < 1e-12);
    }

    #[test]
    fn accumulate_overwrites_previous_step() {
        let particles = vec![particle(1.0, &[0.0]), particle(1.0, &[1.0])];
        let mut out = ForceField::new(2, 1);
        out[0][0] = 100.0;
        gravity(1.0, 0.0).accumulate_forces(&particles, &mut out);
        assert!((out[0][0] - 1.0).abs() < 1e-12);
        assert!((out[1][0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn terms_are_summed() {
        let particles = vec![particle(1.0, &[0.0]), particle(1.0, &[1.0])];
        let set = ForceSet::new()
            .with(NewtonianGravity { G: 1.0, eps2: 0.0 })
            .with(NewtonianGravity { G: 2.0, eps2: 0.0 });
        let mut out = ForceField::new(2, 1);
        set.accumulate_forces(&particles, &mut out);
        assert_eq!(set.len(), 2);
        assert!((out[0][0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_and_single_particle_sets_produce_no_force() {
        let mut out = ForceField::new(0, 2);
        gravity(1.0, 0.0).accumulate_forces(&[], &mut out);
        assert!(out.is_empty());

        let single = vec![particle(5.0, &[3.0, 4.0])];
        let mut out = ForceField::new(1, 2);
        gravity(1.0, 0.0).accumulate_forces(&single, &mut out);
        assert_eq!(out[0].norm(), 0.0);
    }
}
