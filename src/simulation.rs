use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::Config;
use crate::error::EvolveError;
use crate::individual::{EvalContext, Individual};
use crate::population::Population;
use crate::render::Rasterizer;
use crate::target::TargetImage;

/// run lifecycle: `Stopped → Running ⇄ Paused → Stopped`, no other transitions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

/// statistics emitted after every completed generation
#[derive(Clone, Copy, Debug)]
pub struct StatsSnapshot {
    /// wall-clock time accumulated across Running intervals only
    pub elapsed_seconds: f64,
    pub generation_count: u64,
    pub improvement_count: u64,
    pub time_per_generation_ms: f64,
    /// non-finite until the first improvement; display with [`format_ms`]
    pub time_per_improvement_ms: f64,
    /// fittest individual's fitness as a percentage
    pub current_fitness: f64,
    pub highest_fitness: f64,
    pub lowest_fitness: f64,
}

impl StatsSnapshot {
    /// `h:mm:ss`, hours omitted while zero
    pub fn format_elapsed(&self) -> String {
        seconds_to_string(self.elapsed_seconds.round() as u64)
    }
}

/// `"12.34 ms"`, or `"n/a"` for the undefined rates
pub fn format_ms(ms: f64) -> String {
    if ms.is_finite() {
        format!("{ms:.2} ms")
    } else {
        "n/a".to_owned()
    }
}

pub fn seconds_to_string(total: u64) -> String {
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

// reproducible runs; the population itself provides the variation
const RNG_SEED: u64 = 0xDEAD_BEEF;

/// owns the run lifecycle and everything mutable about a run: the current
/// population, the reference buffer, the counters. nothing lives in globals,
/// and generations only advance inside [`Simulation::tick`], so pause and stop
/// take effect at generation boundaries.
pub struct Simulation<R: Rasterizer> {
    config: Config,
    rasterizer: R,
    target: TargetImage,
    rng: Pcg32,
    state: RunState,
    population: Option<Population>,
    reference: Vec<u8>,
    generation_count: u64,
    improvement_count: u64,
    highest_fitness: f64,
    lowest_fitness: f64,
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl<R: Rasterizer + Sync> Simulation<R> {
    pub fn new(config: Config, rasterizer: R, target: TargetImage) -> Result<Self, EvolveError> {
        Self::with_seed(config, rasterizer, target, RNG_SEED)
    }

    pub fn with_seed(config: Config, rasterizer: R, target: TargetImage, seed: u64) -> Result<Self, EvolveError> {
        config.validate()?;
        Ok(Self {
            config,
            rasterizer,
            target,
            rng: Pcg32::seed_from_u64(seed),
            state: RunState::Stopped,
            population: None,
            reference: Vec::new(),
            generation_count: 0,
            improvement_count: 0,
            highest_fitness: 0.0,
            lowest_fitness: 100.0,
            accumulated: Duration::ZERO,
            running_since: None,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    pub fn improvement_count(&self) -> u64 {
        self.improvement_count
    }

    /// wall-clock duration accumulated across Running intervals; frozen while
    /// Paused, zero while Stopped
    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(since) => self.accumulated + since.elapsed(),
            None => self.accumulated,
        }
    }

    /// `Stopped → Running` begins a fresh run: counters reset, the reference
    /// buffer is recomputed from the current target, and a new population is
    /// seeded (and fully evaluated). `Paused → Running` resumes, with elapsed
    /// time continuing from its frozen value. no-op while already Running.
    pub fn start(&mut self) -> Result<(), EvolveError> {
        profiling::scope!("Simulation::start");
        match self.state {
            RunState::Running => Ok(()),
            RunState::Paused => {
                self.running_since = Some(Instant::now());
                self.state = RunState::Running;
                Ok(())
            }
            RunState::Stopped => {
                self.generation_count = 0;
                self.improvement_count = 0;
                self.accumulated = Duration::ZERO;
                self.highest_fitness = 0.0;
                self.lowest_fitness = 100.0;
                self.reference = self.target.reference_buffer(self.config.working_resolution);

                // seeding evaluates every genome; a backend failure leaves us Stopped
                let ctx = EvalContext {
                    rasterizer: &self.rasterizer,
                    reference: &self.reference,
                    resolution: self.config.working_resolution,
                    metric: self.config.metric(),
                };
                let population = Population::new(&mut self.rng, &self.config, &ctx)?;
                self.population = Some(population);

                log::info!(
                    "run started: population={} polygons={} vertices={} resolution={}",
                    self.config.population_size,
                    self.config.polygon_count,
                    self.config.vertex_count,
                    self.config.working_resolution,
                );
                self.running_since = Some(Instant::now());
                self.state = RunState::Running;
                Ok(())
            }
        }
    }

    /// freeze elapsed time and halt the loop. no-op unless Running.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            if let Some(since) = self.running_since.take() {
                self.accumulated += since.elapsed();
            }
            self.state = RunState::Paused;
            log::debug!("paused at generation {}", self.generation_count);
        }
    }

    /// discard the population and reset every counter. valid from any state.
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            log::info!(
                "run stopped after {} generations, {} improvements",
                self.generation_count,
                self.improvement_count,
            );
        }
        self.state = RunState::Stopped;
        self.population = None;
        self.reference = Vec::new();
        self.running_since = None;
        self.accumulated = Duration::ZERO;
        self.generation_count = 0;
        self.improvement_count = 0;
        self.highest_fitness = 0.0;
        self.lowest_fitness = 100.0;
    }

    /// advance exactly one generation and report statistics. only valid while
    /// Running. a rasterization failure aborts the run to Stopped; the run is
    /// never continued with stale fitness.
    pub fn tick(&mut self) -> Result<StatsSnapshot, EvolveError> {
        profiling::scope!("Simulation::tick");
        if self.state != RunState::Running {
            return Err(EvolveError::InvalidState(self.state));
        }
        let result = self.tick_inner();
        if result.is_err() {
            self.stop();
        }
        result
    }

    fn tick_inner(&mut self) -> Result<StatsSnapshot, EvolveError> {
        let ctx = EvalContext {
            rasterizer: &self.rasterizer,
            reference: &self.reference,
            resolution: self.config.working_resolution,
            metric: self.config.metric(),
        };
        let population = self.population.as_mut().ok_or(EvolveError::EmptyPopulation)?;

        population.step(&mut self.rng, &self.config, &ctx)?;
        self.generation_count += 1;

        let current_fitness = population.fittest()?.fitness() * 100.0;

        // improvement and low-water-mark updates are mutually exclusive per
        // tick, checked in this order
        if current_fitness > self.highest_fitness {
            self.highest_fitness = current_fitness;
            self.improvement_count += 1;
            log::debug!(
                "improvement #{} at generation {}: {current_fitness:.2}%",
                self.improvement_count,
                self.generation_count,
            );
        } else if current_fitness < self.lowest_fitness {
            self.lowest_fitness = current_fitness;
        }

        let elapsed_seconds = self.elapsed().as_secs_f64();
        Ok(StatsSnapshot {
            elapsed_seconds,
            generation_count: self.generation_count,
            improvement_count: self.improvement_count,
            time_per_generation_ms: elapsed_seconds / self.generation_count as f64 * 1000.0,
            time_per_improvement_ms: elapsed_seconds / self.improvement_count as f64 * 1000.0,
            current_fitness,
            highest_fitness: self.highest_fitness,
            lowest_fitness: self.lowest_fitness,
        })
    }

    /// the current best individual, if a population exists
    pub fn fittest(&mut self) -> Option<&Individual> {
        self.population.as_mut().and_then(|p| p.fittest().ok())
    }

    /// display rendering of the current fittest individual at an arbitrary
    /// resolution; `None` while no population exists
    pub fn preview(&mut self, width: u32, height: u32) -> Result<Option<Vec<u8>>, EvolveError> {
        let population = match self.population.as_mut() {
            Some(p) => p,
            None => return Ok(None),
        };
        let fittest = population.fittest()?;
        Ok(Some(fittest.render(&self.rasterizer, width, height)?))
    }

    /// configuration may only change while Stopped
    pub fn set_config(&mut self, config: Config) -> Result<(), EvolveError> {
        if self.state != RunState::Stopped {
            return Err(EvolveError::InvalidState(self.state));
        }
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// the target image may only change while Stopped
    pub fn set_target(&mut self, target: TargetImage) -> Result<(), EvolveError> {
        if self.state != RunState::Stopped {
            return Err(EvolveError::InvalidState(self.state));
        }
        self.target = target;
        Ok(())
    }
}
