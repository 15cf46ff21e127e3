//! Configuration types for loading simulation scenarios from YAML or JSON.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – integrator choice, selection threshold, diagnostics
//! - [`ParametersConfig`] – time step, end time and physical constants
//! - [`OutputConfig`]     – where per-step snapshots are written
//! - [`BodyConfig`]       – initial state for each particle
//! - [`ScenarioConfig`]   – top-level wrapper
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   integrator: auto        # auto | explicit_euler | implicit_euler | forward_euler
//!   threshold: 0.01         # auto: explicit Euler when delta_t <= threshold
//!   dimensions: 2           # optional, every body must match
//!   energy: true            # log energy drift every step
//!
//! parameters:
//!   delta_t: 0.001          # fixed step size
//!   t_max: 10.0             # last time stamp (alias: max_time)
//!   G: 1.0                  # gravitational constant, default 6.673e-11
//!   eps2: 0.0               # softening, 0 skips coincident pairs
//!
//! output:
//!   directory: out
//!   prefix: nbody_
//!
//! bodies:                   # alias: particles
//!   - mass: 1.0
//!     position: [ -0.5, 0.0 ]
//!     velocity: [  0.0, 0.7 ]
//!   - mass: 1.0
//!     position: [  0.5, 0.0 ]
//!     velocity: [  0.0, -0.7 ]
//! ```
//!
//! Files ending in `.json` are read as JSON with the same structure. A
//! top-level `N` is accepted and must equal the number of bodies.
//!
//! The `parameters` section may instead be written flat, with its keys at the
//! top level:
//!
//! ```json
//! { "N": 2, "delta_t": 0.001, "max_time": 0.01, "particles": [ ... ] }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SimError};
use crate::simulation::engine::DEFAULT_EXPLICIT_THRESHOLD;
use crate::simulation::params::DEFAULT_G;

/// Which integrator the engine uses
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorConfig {
    /// Explicit Euler for small steps, implicit Euler above the threshold
    #[default]
    Auto,

    /// Semi-implicit (velocity first) Euler
    #[serde(alias = "explicit")]
    ExplicitEuler,

    /// Fixed-point relaxed implicit Euler
    #[serde(alias = "implicit")]
    ImplicitEuler,

    /// Position-first Euler, not symplectic
    #[serde(alias = "forward")]
    ForwardEuler,
}

/// Engine-level configuration
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig,
    #[serde(default = "default_threshold")]
    pub threshold: f64, // auto-selection threshold on delta_t
    #[serde(default)]
    pub dimensions: Option<usize>, // expected spatial dimensionality
    #[serde(default = "default_true")]
    pub energy: bool, // run the energy diagnostic
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Auto,
            threshold: DEFAULT_EXPLICIT_THRESHOLD,
            dimensions: None,
            energy: true,
        }
    }
}

/// Global numerical and physical parameters for a scenario
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ParametersConfig {
    pub delta_t: f64, // time step size
    #[serde(alias = "max_time")]
    pub t_max: f64, // time end
    #[serde(default = "default_g")]
    pub G: f64, // gravitational constant
    #[serde(default)]
    pub eps2: f64, // softening
}

/// Snapshot destination
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            prefix: default_prefix(),
        }
    }
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    pub mass: f64,          // mass of the particle
    pub position: Vec<f64>, // initial position, one entry per dimension
    pub velocity: Vec<f64>, // initial velocity, one entry per dimension
}

/// Top-level scenario configuration
///
/// Parameters come either from a `parameters` section or from top-level
/// `delta_t`/`max_time`/`G`/`eps2` keys, never both. Use
/// [`ScenarioConfig::resolve_parameters`] to get them.
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub parameters: Option<ParametersConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(alias = "particles")]
    pub bodies: Vec<BodyConfig>,
    #[serde(default, rename = "N")]
    pub count: Option<usize>, // declared particle count, checked against `bodies`

    // flat layout: parameters at the top level
    #[serde(default)]
    pub delta_t: Option<f64>,
    #[serde(default, alias = "max_time")]
    pub t_max: Option<f64>,
    #[serde(default)]
    pub G: Option<f64>,
    #[serde(default)]
    pub eps2: Option<f64>,
}

impl ScenarioConfig {
    /// The scenario's parameters, from whichever of the two layouts the file uses
    pub fn resolve_parameters(&self) -> Result<ParametersConfig> {
        let flat = [
            ("delta_t", self.delta_t.is_some()),
            ("t_max", self.t_max.is_some()),
            ("G", self.G.is_some()),
            ("eps2", self.eps2.is_some()),
        ];
        let flat_keys: Vec<&str> = flat.iter().filter(|(_, set)| *set).map(|(k, _)| *k).collect();

        match &self.parameters {
            Some(_) if !flat_keys.is_empty() => Err(SimError::config(format!(
                "top-level {} given next to a parameters section, use one or the other",
                flat_keys.join(", ")
            ))),
            Some(p) => Ok(p.clone()),
            None => {
                let (Some(delta_t), Some(t_max)) = (self.delta_t, self.t_max) else {
                    return Err(SimError::config(
                        "missing parameters: give a parameters section or top-level delta_t and max_time",
                    ));
                };
                Ok(ParametersConfig {
                    delta_t,
                    t_max,
                    G: self.G.unwrap_or(DEFAULT_G),
                    eps2: self.eps2.unwrap_or(0.0),
                })
            }
        }
    }

    /// Read a scenario file, picking the format from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_reader(reader).map_err(|source| SimError::Json {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_yaml::from_reader(reader).map_err(|source| SimError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| SimError::Yaml {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| SimError::Json {
            path: PathBuf::from("<inline>"),
            source,
        })
    }
}

fn default_threshold() -> f64 {
    DEFAULT_EXPLICIT_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_g() -> f64 {
    DEFAULT_G
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_prefix() -> String {
    "nbody_".to_string()
}
