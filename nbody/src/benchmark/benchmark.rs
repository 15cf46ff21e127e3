use std::time::Instant;

use crate::error::Result;
use crate::output::snapshot::NullSink;
use crate::simulation::forces::{ForceSet, NewtonianGravity};
use crate::simulation::integrator::{ExplicitEuler, ForwardEuler, ImplicitEuler, Integrator};
use crate::simulation::params::Parameters;
use crate::simulation::runner::Simulation;
use crate::simulation::states::{ForceField, NVec, Particle, SimulationState};

/// Time one force accumulation for growing N. Output is CSV so it can be
/// pasted straight into a spreadsheet
pub fn bench_forces() -> Result<()> {
    let ns = [100, 200, 400, 800, 1600, 3200];

    println!("N,force_ms");
    for n in ns {
        let particles = make_particles(n, 3)?;
        let params = make_params();
        let forces = ForceSet::new().with(NewtonianGravity {
            G: params.G,
            eps2: params.eps2,
        });
        let mut out = ForceField::new(n, 3);

        // Warm up
        forces.accumulate_forces(&particles, &mut out);

        let t0 = Instant::now();
        forces.accumulate_forces(&particles, &mut out);
        let ms = t0.elapsed().as_secs_f64() * 1000.0;

        println!("{n},{ms:.6}");
    }
    Ok(())
}

/// Time full simulation steps (forces + integration) for each integrator
pub fn bench_integrators() -> Result<()> {
    let ns = [100, 200, 400, 800, 1600];
    let steps = 5;

    println!("N,explicit_ms,implicit_ms,forward_ms");
    for n in ns {
        let explicit = time_steps(n, steps, Box::new(ExplicitEuler))?;
        let implicit = time_steps(n, steps, Box::new(ImplicitEuler::default()))?;
        let forward = time_steps(n, steps, Box::new(ForwardEuler))?;

        println!("{n},{explicit:.6},{implicit:.6},{forward:.6}");
    }
    Ok(())
}

/// Average wall time in ms of one step over `steps` steps
fn time_steps(n: usize, steps: usize, integrator: Box<dyn Integrator + Send + Sync>) -> Result<f64> {
    let mut params = make_params();
    params.t_max = params.delta_t * steps as f64;

    let state = SimulationState::new(make_particles(n, 3)?, params)?;
    let mut sim = Simulation::new(state, integrator, false);

    let t0 = Instant::now();
    let summary = sim.run(&mut NullSink)?;
    let elapsed = t0.elapsed().as_secs_f64() * 1000.0;

    Ok(elapsed / summary.steps.max(1) as f64)
}

/// Deterministic particle cloud of size `n`, no rand needed
fn make_particles(n: usize, dim: usize) -> Result<Vec<Particle>> {
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = NVec::from_fn(dim, |d, _| (i_f * (0.37 - 0.11 * d as f64)).sin() * 5.0);
            Particle::new(1.0, x, NVec::zeros(dim))
        })
        .collect()
}

fn make_params() -> Parameters {
    Parameters {
        delta_t: 0.001,
        t_max: 0.01,
        G: 0.1,
        eps2: 1e-4,
    }
}
