//! Per-step snapshot contract between the simulation loop and its output.

use crate::error::Result;
use crate::simulation::states::Particle;

/// The state handed to the output collaborator once per step
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub step: usize,
    pub time: f64,
    pub particles: &'a [Particle],
}

/// Receives one snapshot per step, in step order.
/// An error aborts the run.
pub trait SnapshotSink {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<()>;
}

/// Discards every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn write_snapshot(&mut self, _snapshot: &Snapshot<'_>) -> Result<()> {
        Ok(())
    }
}
