//! Core state types for the N-body simulation.
//!
//! - `Particle`: a point mass with position `x` and velocity `v` in `D` dimensions
//! - `ForceField`: one accumulated force vector per particle, rebuilt every step
//! - `TimeGrid`: the fixed sequence of time stamps a run walks through
//! - `SimulationState`: everything above plus the physical parameters
//!
//! Dimensionality is a runtime value, so vectors are `nalgebra::DVector`.

use std::ops::{Index, IndexMut};

use nalgebra::DVector;

use crate::error::{Result, SimError};
use crate::simulation::params::Parameters;

pub type NVec = DVector<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    m: f64,      // mass, fixed for the lifetime of the run
    pub x: NVec, // position
    pub v: NVec, // velocity
}

impl Particle {
    /// Build a particle, rejecting non-positive mass and mismatched vectors.
    pub fn new(m: f64, x: NVec, v: NVec) -> Result<Self> {
        if !(m.is_finite() && m > 0.0) {
            return Err(SimError::config(format!("particle mass must be positive and finite, got {m}")));
        }
        if x.len() != v.len() {
            return Err(SimError::config(format!(
                "position has {} components but velocity has {}",
                x.len(),
                v.len()
            )));
        }
        if x.iter().chain(v.iter()).any(|c| !c.is_finite()) {
            return Err(SimError::config("particle state contains a non-finite component"));
        }
        Ok(Self { m, x, v })
    }

    pub fn from_slices(m: f64, x: &[f64], v: &[f64]) -> Result<Self> {
        Self::new(m, NVec::from_column_slice(x), NVec::from_column_slice(v))
    }

    pub fn mass(&self) -> f64 {
        self.m
    }

    pub fn dim(&self) -> usize {
        self.x.len()
    }
}

/// Per-particle accumulated force vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceField {
    forces: Vec<NVec>,
}

impl ForceField {
    pub fn new(n: usize, dim: usize) -> Self {
        Self {
            forces: vec![NVec::zeros(dim); n],
        }
    }

    pub fn zero(&mut self) {
        for f in self.forces.iter_mut() {
            f.fill(0.0);
        }
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NVec> {
        self.forces.iter()
    }

    /// Vector sum of every force in the field. Zero up to rounding for
    /// any internal force law.
    pub fn net(&self) -> Option<NVec> {
        let dim = self.forces.first()?.len();
        Some(self.forces.iter().fold(NVec::zeros(dim), |acc, f| acc + f))
    }
}

impl Index<usize> for ForceField {
    type Output = NVec;

    fn index(&self, i: usize) -> &NVec {
        &self.forces[i]
    }
}

impl IndexMut<usize> for ForceField {
    fn index_mut(&mut self, i: usize) -> &mut NVec {
        &mut self.forces[i]
    }
}

/// Largest time grid a scenario may ask for. The stamps are held in memory.
pub const MAX_TIME_STAMPS: usize = 100_000_000;

/// Ordered time stamps `0, dt, 2 dt, ...` up to and including `t_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    stamps: Vec<f64>,
}

impl TimeGrid {
    pub fn new(delta_t: f64, t_max: f64) -> Result<Self> {
        if !(delta_t.is_finite() && delta_t > 0.0) {
            return Err(SimError::config(format!("delta_t must be positive and finite, got {delta_t}")));
        }
        if !(t_max.is_finite() && t_max >= 0.0) {
            return Err(SimError::config(format!("t_max must be non-negative and finite, got {t_max}")));
        }

        // small slack so that t_max = k * dt keeps its last stamp after rounding
        let intervals = (t_max / delta_t + 1e-9).floor();
        // the float comparison bounds the cast below
        if !intervals.is_finite() || intervals >= MAX_TIME_STAMPS as f64 {
            return Err(SimError::config(format!(
                "t_max / delta_t = {t_max} / {delta_t} needs more than {MAX_TIME_STAMPS} time stamps"
            )));
        }
        let count = (intervals as usize)
            .checked_add(1)
            .ok_or_else(|| SimError::config("time grid size overflows"))?;
        let stamps = (0..count).map(|i| i as f64 * delta_t).collect();

        Ok(Self { stamps })
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.stamps.get(i).copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.stamps.last().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.stamps
    }
}

/// Complete mutable state threaded through one run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub particles: Vec<Particle>,
    pub forces: ForceField,
    pub time_grid: TimeGrid,
    pub parameters: Parameters,
    dim: usize,
}

impl SimulationState {
    /// Validate the particle set against the parameters and allocate the
    /// force field and time grid.
    pub fn new(particles: Vec<Particle>, parameters: Parameters) -> Result<Self> {
        let Some(first) = particles.first() else {
            return Err(SimError::config("scenario contains no particles"));
        };
        let dim = first.dim();
        if dim == 0 {
            return Err(SimError::config("particles must have at least one spatial dimension"));
        }
        if let Some((i, p)) = particles.iter().enumerate().find(|(_, p)| p.dim() != dim) {
            return Err(SimError::config(format!(
                "particle {i} has {} dimensions, expected {dim}",
                p.dim()
            )));
        }
        parameters.validate()?;

        let time_grid = TimeGrid::new(parameters.delta_t, parameters.t_max)?;
        let forces = ForceField::new(particles.len(), dim);

        Ok(Self {
            particles,
            forces,
            time_grid,
            parameters,
            dim,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_grid_includes_exact_multiple_of_dt() {
        let grid = TimeGrid::new(0.1, 1.0).unwrap();
        assert_eq!(grid.len(), 11);
        assert_eq!(grid.get(0), Some(0.0));
        assert!((grid.last().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn time_grid_never_exceeds_t_max() {
        let grid = TimeGrid::new(0.3, 1.0).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid.as_slice().iter().all(|&t| t <= 1.0));
    }

    #[test]
    fn time_grid_with_zero_t_max_has_single_stamp() {
        let grid = TimeGrid::new(0.01, 0.0).unwrap();
        assert_eq!(grid.as_slice(), &[0.0]);
    }

    #[test]
    fn time_grid_rejects_bad_step() {
        assert!(TimeGrid::new(0.0, 1.0).is_err());
        assert!(TimeGrid::new(-0.1, 1.0).is_err());
        assert!(TimeGrid::new(0.1, -1.0).is_err());
        assert!(TimeGrid::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn time_grid_rejects_unreasonably_many_steps() {
        let err = TimeGrid::new(1e-10, 1e10).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));

        // ratio overflows f64 itself
        assert!(TimeGrid::new(f64::MIN_POSITIVE, 1e300).is_err());
        assert!(TimeGrid::new(1.0, MAX_TIME_STAMPS as f64).is_err());
    }

    #[test]
    fn particle_rejects_mismatched_dimensions() {
        let err = Particle::from_slices(1.0, &[0.0, 0.0], &[0.0]).unwrap_err();
        assert!(err.to_string().contains("velocity has 1"));
    }

    #[test]
    fn particle_rejects_non_positive_mass() {
        assert!(Particle::from_slices(0.0, &[0.0], &[0.0]).is_err());
        assert!(Particle::from_slices(-2.0, &[0.0], &[0.0]).is_err());
    }

    #[test]
    fn state_rejects_mixed_dimensionality() {
        let particles = vec![
            Particle::from_slices(1.0, &[0.0, 0.0], &[0.0, 0.0]).unwrap(),
            Particle::from_slices(1.0, &[0.0, 0.0, 1.0], &[0.0, 0.0, 0.0]).unwrap(),
        ];
        let err = SimulationState::new(particles, Parameters::default()).unwrap_err();
        assert!(err.to_string().contains("particle 1 has 3 dimensions"));
    }

    #[test]
    fn state_rejects_empty_particle_set() {
        assert!(SimulationState::new(Vec::new(), Parameters::default()).is_err());
    }

    #[test]
    fn force_field_zero_resets_every_component() {
        let mut field = ForceField::new(2, 3);
        field[0][1] = 4.0;
        field[1][2] = -1.0;
        field.zero();
        assert!(field.iter().all(|f| f.iter().all(|&c| c == 0.0)));
    }
}
