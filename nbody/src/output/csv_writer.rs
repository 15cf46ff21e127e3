//! CSV snapshot files, one per step.
//!
//! Files are named `<directory>/<prefix><step:05>.csv`. Each has the header
//! `t,x0,..,x{D-1},v0,..,v{D-1},m` followed by one row per particle.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Result, SimError};
use crate::output::snapshot::{Snapshot, SnapshotSink};

#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    directory: PathBuf,
    prefix: String,
}

impl CsvSnapshotWriter {
    /// Create the writer, creating `directory` if needed
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| SimError::OutputDir {
            path: directory.clone(),
            source,
        })?;

        Ok(Self {
            directory,
            prefix: prefix.into(),
        })
    }

    pub fn path_for_step(&self, step: usize) -> PathBuf {
        self.directory.join(format!("{}{:05}.csv", self.prefix, step))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl SnapshotSink for CsvSnapshotWriter {
    fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<()> {
        let path = self.path_for_step(snapshot.step);

        write_csv(&path, snapshot).map_err(|source| SimError::OutputWrite {
            step: snapshot.step,
            path: path.clone(),
            source,
        })?;

        trace!(step = snapshot.step, path = %path.display(), "snapshot written");
        Ok(())
    }
}

fn write_csv(path: &Path, snapshot: &Snapshot<'_>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    let dim = snapshot.particles.first().map_or(0, |p| p.dim());
    writeln!(out, "{}", header(dim))?;

    for p in snapshot.particles {
        write!(out, "{}", snapshot.time)?;
        for c in p.x.iter().chain(p.v.iter()) {
            write!(out, ",{c}")?;
        }
        writeln!(out, ",{}", p.mass())?;
    }

    out.flush()
}

/// `t,x0..,v0..,m` for `dim` spatial dimensions
pub fn header(dim: usize) -> String {
    let mut cols = Vec::with_capacity(2 * dim + 2);
    cols.push("t".to_string());
    cols.extend((0..dim).map(|d| format!("x{d}")));
    cols.extend((0..dim).map(|d| format!("v{d}")));
    cols.push("m".to_string());
    cols.join(",")
}
