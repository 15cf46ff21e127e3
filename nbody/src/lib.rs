pub mod error;
pub mod simulation;
pub mod configuration;
pub mod output;
pub mod benchmark;

pub use error::{Result, SimError};

pub use simulation::states::{Particle, ForceField, TimeGrid, SimulationState, NVec, MAX_TIME_STAMPS};
pub use simulation::params::{Parameters, DEFAULT_G};
pub use simulation::forces::{ForceLaw, ForceSet, NewtonianGravity};
pub use simulation::integrator::{Integrator, ExplicitEuler, ImplicitEuler, ForwardEuler};
pub use simulation::energy::{kinetic_energy, potential_energy, total_energy, EnergyDiagnostic};
pub use simulation::engine::{Engine, IntegratorKind, select_by_threshold, DEFAULT_EXPLICIT_THRESHOLD};
pub use simulation::scenario::Scenario;
pub use simulation::runner::{Simulation, Phase, StepReport, RunSummary};

pub use configuration::config::{IntegratorConfig, EngineConfig, ParametersConfig, OutputConfig, BodyConfig, ScenarioConfig};

pub use output::snapshot::{Snapshot, SnapshotSink, NullSink};
pub use output::csv_writer::CsvSnapshotWriter;

pub use benchmark::benchmark::{bench_forces, bench_integrators};
