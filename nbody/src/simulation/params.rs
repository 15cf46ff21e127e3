//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - step size and end time of the time grid,
//! - gravitational constant `G`,
//! - softening `eps2` (0 means coincident pairs are skipped instead)

use crate::error::{Result, SimError};

/// Gravitational constant in SI units, used when a scenario does not set one.
pub const DEFAULT_G: f64 = 6.673e-11;

#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub delta_t: f64, // step size
    pub t_max: f64,   // last admissible time stamp
    pub G: f64,       // gravitational constant
    pub eps2: f64,    // softening
}

impl Parameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.G.is_finite() && self.G >= 0.0) {
            return Err(SimError::config(format!("G must be non-negative and finite, got {}", self.G)));
        }
        if !(self.eps2.is_finite() && self.eps2 >= 0.0) {
            return Err(SimError::config(format!("eps2 must be non-negative and finite, got {}", self.eps2)));
        }
        // delta_t / t_max are checked by TimeGrid::new
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            delta_t: 0.001,
            t_max: 1.0,
            G: DEFAULT_G,
            eps2: 0.0,
        }
    }
}
