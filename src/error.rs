use thiserror::Error;

use crate::config::ConfigError;
use crate::render::RasterizeError;
use crate::simulation::RunState;

/// top-level error taxonomy. no variant is retried: configuration problems
/// are rejected before a run starts, and anything fatal mid-run stops the run.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// cannot occur with population_size >= 1, but guarded rather than indexed blindly
    #[error("population has no individuals")]
    EmptyPopulation,

    /// the run this surfaced in has transitioned to Stopped
    #[error(transparent)]
    Rasterization(#[from] RasterizeError),

    #[error("operation not permitted while {0:?}")]
    InvalidState(RunState),
}
