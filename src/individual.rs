use rand::Rng;

use crate::config::Config;
use crate::dna::Genome;
use crate::error::EvolveError;
use crate::fitness::{self, DiffMetric};
use crate::render::{RasterizeError, Rasterizer};

/// everything a fitness evaluation needs besides the genome itself. all fields
/// are shared read-only for the duration of a generation, so evaluations of
/// different individuals can run in parallel.
pub struct EvalContext<'a, R: Rasterizer> {
    pub rasterizer: &'a R,
    /// reference buffer at the working resolution, straight RGBA
    pub reference: &'a [u8],
    /// square edge length of the fitness rasterization
    pub resolution: u32,
    pub metric: DiffMetric,
}

impl<R: Rasterizer> Clone for EvalContext<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: Rasterizer> Copy for EvalContext<'_, R> {}

/// one candidate image: a genome plus its cached fitness. fitness is computed
/// exactly once at construction and the genome is immutable afterwards;
/// "mutating" an individual always means constructing a new one.
#[derive(Clone, Debug)]
pub struct Individual {
    genome: Genome,
    fitness: f64,
}

impl Individual {
    /// rasterize the genome at the working resolution and score it against the
    /// reference buffer
    pub fn evaluate<R: Rasterizer>(genome: Genome, ctx: &EvalContext<'_, R>) -> Result<Self, EvolveError> {
        profiling::scope!("Individual::evaluate");
        let buffer = ctx.rasterizer.rasterize(&genome, ctx.resolution, ctx.resolution)?;
        if buffer.len() != ctx.reference.len() {
            return Err(RasterizeError(format!(
                "backend returned {} bytes, expected {}",
                buffer.len(),
                ctx.reference.len()
            ))
            .into());
        }
        let fitness = fitness::score(&buffer, ctx.reference, ctx.metric);
        Ok(Self { genome, fitness })
    }

    /// spawn and evaluate an unparented individual
    pub fn random<G: Rng, R: Rasterizer>(
        rng: &mut G,
        config: &Config,
        ctx: &EvalContext<'_, R>,
    ) -> Result<Self, EvolveError> {
        Self::evaluate(Genome::spawn(rng, config.polygon_count, config.vertex_count), ctx)
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// cached similarity score in (-inf, 1]; 1.0 is a pixel-perfect match
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// display rendering at an arbitrary resolution. never used for fitness.
    pub fn render<R: Rasterizer>(&self, rasterizer: &R, width: u32, height: u32) -> Result<Vec<u8>, RasterizeError> {
        rasterizer.rasterize(&self.genome, width, height)
    }
}
