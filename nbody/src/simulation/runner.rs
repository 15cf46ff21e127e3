//! The simulation loop.
//!
//! A `Simulation` walks the time grid one entry at a time:
//!
//! 1. rebuild the force field from the current positions
//! 2. advance every particle with the selected integrator
//! 3. optionally compute total energy and its drift from the initial value
//! 4. hand the snapshot `(step, t_i, particles)` to the output sink
//!
//! Phases: `Configured` → `Stepping(i)` → `Completed`. A failed snapshot
//! write moves the loop to `Aborted` and the run cannot be continued.

use tracing::{debug, info};

use crate::error::Result;
use crate::output::snapshot::{Snapshot, SnapshotSink};
use crate::simulation::energy::{total_energy, EnergyDiagnostic};
use crate::simulation::forces::{ForceSet, NewtonianGravity};
use crate::simulation::integrator::Integrator;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::{Particle, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configured,
    Stepping(usize), // index of the next step to run
    Completed,
    Aborted { step: usize },
}

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub time: f64,
    pub energy: Option<f64>,
    pub drift: Option<f64>,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub final_time: f64,
    pub initial_energy: Option<f64>,
    pub final_drift: Option<f64>,
    pub max_drift: Option<f64>,
}

pub struct Simulation {
    state: SimulationState,
    forces: ForceSet,
    integrator: Box<dyn Integrator + Send + Sync>,
    energy: Option<EnergyDiagnostic>,
    phase: Phase,
}

impl Simulation {
    /// Set up a run over `state` with direct Newtonian gravity.
    /// With `track_energy` the baseline energy is taken now, before any step.
    pub fn new(state: SimulationState, integrator: Box<dyn Integrator + Send + Sync>, track_energy: bool) -> Self {
        let forces = ForceSet::new().with(NewtonianGravity {
            G: state.parameters.G,
            eps2: state.parameters.eps2,
        });
        Self::with_forces(state, forces, integrator, track_energy)
    }

    pub fn with_forces(
        state: SimulationState,
        forces: ForceSet,
        integrator: Box<dyn Integrator + Send + Sync>,
        track_energy: bool,
    ) -> Self {
        let energy = track_energy.then(|| EnergyDiagnostic::new(current_energy(&state)));

        Self {
            state,
            forces,
            integrator,
            energy,
            phase: Phase::Configured,
        }
    }

    /// Build from a scenario, resolving the integrator from its engine settings
    pub fn from_scenario(scenario: Scenario) -> Self {
        let kind = scenario.engine.select_integrator(scenario.state.parameters.delta_t);
        info!(
            integrator = ?kind,
            delta_t = scenario.state.parameters.delta_t,
            threshold = scenario.engine.threshold,
            "selected integrator"
        );
        Self::new(scenario.state, kind.build(), scenario.engine.energy)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn particles(&self) -> &[Particle] {
        &self.state.particles
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    pub fn initial_energy(&self) -> Option<f64> {
        self.energy.map(|e| e.initial())
    }

    /// Run the next step. `Ok(None)` once the loop is completed or aborted
    pub fn step(&mut self, sink: &mut dyn SnapshotSink) -> Result<Option<StepReport>> {
        let i = match self.phase {
            Phase::Configured => 0,
            Phase::Stepping(i) => i,
            Phase::Completed | Phase::Aborted { .. } => return Ok(None),
        };
        let Some(time) = self.state.time_grid.get(i) else {
            self.phase = Phase::Completed;
            return Ok(None);
        };
        self.phase = Phase::Stepping(i);

        let delta_t = self.state.parameters.delta_t;
        self.forces.accumulate_forces(&self.state.particles, &mut self.state.forces);
        self.integrator.integrate(&mut self.state.particles, &self.state.forces, delta_t);

        let (energy, drift) = match self.energy {
            Some(diag) => {
                let e = current_energy(&self.state);
                let drift = diag.drift(e);
                debug!(step = i, t = time, energy = e, drift, "energy");
                (Some(e), Some(drift))
            }
            None => (None, None),
        };

        let snapshot = Snapshot {
            step: i,
            time,
            particles: &self.state.particles,
        };
        if let Err(e) = sink.write_snapshot(&snapshot) {
            self.phase = Phase::Aborted { step: i };
            return Err(e);
        }

        self.phase = if i + 1 < self.state.time_grid.len() {
            Phase::Stepping(i + 1)
        } else {
            Phase::Completed
        };

        Ok(Some(StepReport { step: i, time, energy, drift }))
    }

    /// Step until the time grid is exhausted. Stops at the first error
    pub fn run(&mut self, sink: &mut dyn SnapshotSink) -> Result<RunSummary> {
        info!(
            particles = self.state.len(),
            dimensions = self.state.dim(),
            steps = self.state.time_grid.len(),
            integrator = self.integrator.name(),
            "starting simulation"
        );

        let mut steps = 0;
        let mut last: Option<StepReport> = None;
        let mut max_drift: Option<f64> = None;

        while let Some(report) = self.step(sink)? {
            steps += 1;
            // NaN drift (zero baseline) never becomes the maximum
            if let Some(d) = report.drift.filter(|d| !d.is_nan()) {
                max_drift = Some(max_drift.map_or(d, |m: f64| m.max(d)));
            }
            last = Some(report);
        }

        let summary = RunSummary {
            steps,
            final_time: last.map_or(0.0, |r| r.time),
            initial_energy: self.initial_energy(),
            final_drift: last.and_then(|r| r.drift),
            max_drift,
        };

        info!(
            steps = summary.steps,
            final_time = summary.final_time,
            final_drift = ?summary.final_drift,
            max_drift = ?summary.max_drift,
            "simulation completed"
        );

        Ok(summary)
    }
}

fn current_energy(state: &SimulationState) -> f64 {
    total_energy(&state.particles, state.parameters.G, state.parameters.eps2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::output::snapshot::NullSink;
    use crate::simulation::integrator::ExplicitEuler;
    use crate::simulation::params::Parameters;

    fn pair_state(t_max: f64) -> SimulationState {
        let particles = vec![
            Particle::from_slices(1.0, &[-0.5, 0.0], &[0.0, -0.5]).unwrap(),
            Particle::from_slices(1.0, &[0.5, 0.0], &[0.0, 0.5]).unwrap(),
        ];
        let parameters = Parameters {
            delta_t: 0.01,
            t_max,
            G: 1.0,
            eps2: 0.0,
        };
        SimulationState::new(particles, parameters).unwrap()
    }

    struct FailAt(usize);

    impl SnapshotSink for FailAt {
        fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
            if snapshot.step == self.0 {
                return Err(SimError::OutputWrite {
                    step: snapshot.step,
                    path: "unwritable".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn phases_advance_through_grid() {
        let mut sim = Simulation::new(pair_state(0.02), Box::new(ExplicitEuler), false);
        assert_eq!(sim.phase(), Phase::Configured);

        let r = sim.step(&mut NullSink).unwrap().unwrap();
        assert_eq!(r.step, 0);
        assert_eq!(sim.phase(), Phase::Stepping(1));

        sim.step(&mut NullSink).unwrap();
        let r = sim.step(&mut NullSink).unwrap().unwrap();
        assert_eq!(r.step, 2);
        assert_eq!(sim.phase(), Phase::Completed);
    }

    #[test]
    fn completed_loop_no_longer_mutates_particles() {
        let mut sim = Simulation::new(pair_state(0.0), Box::new(ExplicitEuler), false);
        sim.run(&mut NullSink).unwrap();
        let frozen = sim.particles().to_vec();

        assert!(sim.step(&mut NullSink).unwrap().is_none());
        assert_eq!(sim.particles(), frozen.as_slice());
    }

    #[test]
    fn failed_write_aborts_the_run() {
        let mut sim = Simulation::new(pair_state(0.1), Box::new(ExplicitEuler), true);
        let err = sim.run(&mut FailAt(3)).unwrap_err();
        assert!(matches!(err, SimError::OutputWrite { step: 3, .. }));
        assert_eq!(sim.phase(), Phase::Aborted { step: 3 });

        let frozen = sim.particles().to_vec();
        assert!(sim.step(&mut NullSink).unwrap().is_none());
        assert_eq!(sim.particles(), frozen.as_slice());
    }

    #[test]
    fn energy_is_only_reported_when_tracked() {
        let mut sim = Simulation::new(pair_state(0.05), Box::new(ExplicitEuler), false);
        let summary = sim.run(&mut NullSink).unwrap();
        assert_eq!(summary.steps, 6);
        assert!(summary.initial_energy.is_none());
        assert!(summary.max_drift.is_none());

        let mut sim = Simulation::new(pair_state(0.05), Box::new(ExplicitEuler), true);
        let summary = sim.run(&mut NullSink).unwrap();
        assert!(summary.initial_energy.is_some());
        assert!(summary.final_drift.unwrap() < 1e-2);
    }
}
