//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (file-facing) and produces a `Scenario` holding:
//! - engine settings (`Engine`)
//! - validated system state (`SimulationState` with particles at t = 0)
//! - output settings for the snapshot writer
//!
//! Every consistency check on the input happens here, so a `Scenario` that
//! exists can always be stepped.

use crate::configuration::config::{BodyConfig, OutputConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::simulation::engine::Engine;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Particle, SimulationState};

#[derive(Debug, Clone)]
pub struct Scenario {
    pub engine: Engine,
    pub state: SimulationState,
    pub output: OutputConfig,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self> {
        if let Some(n) = cfg.count {
            if n != cfg.bodies.len() {
                return Err(SimError::config(format!(
                    "N = {n} but {} particles are listed",
                    cfg.bodies.len()
                )));
            }
        }

        // Bodies: map `BodyConfig` -> runtime `Particle`, naming the culprit on failure
        let particles = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc)| build_particle(i, bc, cfg.engine.dimensions))
            .collect::<Result<Vec<_>>>()?;

        let p_cfg = cfg.resolve_parameters()?;
        let parameters = Parameters {
            delta_t: p_cfg.delta_t,
            t_max: p_cfg.t_max,
            G: p_cfg.G,
            eps2: p_cfg.eps2,
        };

        let e_cfg = cfg.engine;
        if !(e_cfg.threshold.is_finite() && e_cfg.threshold >= 0.0) {
            return Err(SimError::config(format!(
                "integrator threshold must be non-negative and finite, got {}",
                e_cfg.threshold
            )));
        }
        let engine = Engine {
            integrator: e_cfg.integrator,
            threshold: e_cfg.threshold,
            energy: e_cfg.energy,
        };

        let state = SimulationState::new(particles, parameters)?;

        Ok(Self {
            engine,
            state,
            output: cfg.output,
        })
    }
}

fn build_particle(i: usize, bc: &BodyConfig, dimensions: Option<usize>) -> Result<Particle> {
    if let Some(d) = dimensions {
        if bc.position.len() != d || bc.velocity.len() != d {
            return Err(SimError::config(format!(
                "particle {i}: expected {d} dimensions, got position {} / velocity {}",
                bc.position.len(),
                bc.velocity.len()
            )));
        }
    }

    Particle::from_slices(bc.mass, &bc.position, &bc.velocity)
        .map_err(|e| SimError::config(format!("particle {i}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::config::ParametersConfig;

    fn body(mass: f64, position: &[f64], velocity: &[f64]) -> BodyConfig {
        BodyConfig {
            mass,
            position: position.to_vec(),
            velocity: velocity.to_vec(),
        }
    }

    fn config(bodies: Vec<BodyConfig>) -> ScenarioConfig {
        ScenarioConfig {
            parameters: Some(ParametersConfig {
                delta_t: 0.01,
                t_max: 0.1,
                G: 1.0,
                eps2: 0.0,
            }),
            bodies,
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn builds_state_from_valid_config() {
        let cfg = config(vec![
            body(1.0, &[0.0, 0.0], &[0.0, 0.0]),
            body(2.0, &[1.0, 0.0], &[0.0, 1.0]),
        ]);
        let scenario = Scenario::build_scenario(cfg).unwrap();
        assert_eq!(scenario.state.len(), 2);
        assert_eq!(scenario.state.dim(), 2);
        assert_eq!(scenario.state.time_grid.len(), 11);
        assert_eq!(scenario.state.particles[1].mass(), 2.0);
    }

    #[test]
    fn count_mismatch_is_a_configuration_error() {
        let mut cfg = config(vec![body(1.0, &[0.0], &[0.0])]);
        cfg.count = Some(3);
        let err = Scenario::build_scenario(cfg).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }

    #[test]
    fn position_velocity_mismatch_names_particle() {
        let cfg = config(vec![
            body(1.0, &[0.0, 0.0], &[0.0, 0.0]),
            body(1.0, &[0.0, 0.0], &[0.0]),
        ]);
        let err = Scenario::build_scenario(cfg).unwrap_err();
        assert!(err.to_string().contains("particle 1"));
    }

    #[test]
    fn declared_dimensions_are_enforced() {
        let mut cfg = config(vec![body(1.0, &[0.0, 0.0], &[0.0, 0.0])]);
        cfg.engine.dimensions = Some(3);
        assert!(Scenario::build_scenario(cfg).is_err());
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let mut cfg = config(vec![body(1.0, &[0.0], &[0.0])]);
        if let Some(p) = cfg.parameters.as_mut() {
            p.delta_t = 0.0;
        }
        assert!(Scenario::build_scenario(cfg).is_err());
    }

    #[test]
    fn flat_parameters_build_the_same_state() {
        let mut cfg = config(vec![body(1.0, &[0.0, 0.0], &[0.0, 0.0])]);
        cfg.parameters = None;
        cfg.delta_t = Some(0.01);
        cfg.t_max = Some(0.1);
        cfg.G = Some(1.0);

        let scenario = Scenario::build_scenario(cfg).unwrap();
        assert_eq!(scenario.state.time_grid.len(), 11);
        assert_eq!(scenario.state.parameters.G, 1.0);
    }

    #[test]
    fn mixed_parameter_layouts_are_a_configuration_error() {
        let mut cfg = config(vec![body(1.0, &[0.0], &[0.0])]);
        cfg.t_max = Some(1.0);
        let err = Scenario::build_scenario(cfg).unwrap_err();
        assert!(matches!(err, SimError::Configuration(_)));
    }
}
