//! evolves a population of translucent-polygon images toward a target picture.
//!
//! the core loop lives in [`Simulation`]: seed a population of random genomes,
//! then repeatedly select the fittest, breed them with crossover and mutation,
//! and rasterize each child to score it against the target. [`spawn_engine`]
//! wraps a simulation in a background thread driven over channels.

pub mod config;
pub mod dna;
pub mod engine_thread;
pub mod error;
pub mod fitness;
pub mod individual;
pub mod population;
pub mod render;
pub mod simulation;
pub mod target;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{Config, ConfigError};
pub use dna::{BreedParams, Genome};
pub use engine_thread::{spawn_engine, EngineCommand, EngineHandle, EngineUpdate};
pub use error::EvolveError;
pub use fitness::DiffMetric;
pub use individual::{EvalContext, Individual};
pub use population::Population;
pub use render::{CpuRenderer, RasterizeError, Rasterizer};
pub use simulation::{format_ms, seconds_to_string, RunState, Simulation, StatsSnapshot};
pub use target::TargetImage;
