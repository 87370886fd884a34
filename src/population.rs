use rand::Rng;
use rayon::prelude::*;

use crate::config::Config;
use crate::dna::Genome;
use crate::error::EvolveError;
use crate::individual::{EvalContext, Individual};
use crate::render::Rasterizer;

/// ordered collection of candidates. order is unspecified between steps except
/// that index 0 is the best immediately after [`Population::fittest`].
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// seed with `population_size` unparented individuals. genomes are drawn
    /// sequentially from the single rng stream; fitness runs in parallel.
    pub fn new<G: Rng, R: Rasterizer + Sync>(
        rng: &mut G,
        config: &Config,
        ctx: &EvalContext<'_, R>,
    ) -> Result<Self, EvolveError> {
        profiling::scope!("Population::new");
        let genomes: Vec<Genome> = (0..config.population_size)
            .map(|_| Genome::spawn(rng, config.polygon_count, config.vertex_count))
            .collect();
        Ok(Self {
            individuals: evaluate_all(genomes, ctx)?,
        })
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// advance exactly one generation: selection, crossover, mutation.
    pub fn step<G: Rng, R: Rasterizer + Sync>(
        &mut self,
        rng: &mut G,
        config: &Config,
        ctx: &EvalContext<'_, R>,
    ) -> Result<(), EvolveError> {
        profiling::scope!("Population::step");
        let size = self.individuals.len();

        if size <= 1 {
            // singleton: self-cross, keep the child only on strict improvement
            let parent = self.individuals.first().ok_or(EvolveError::EmptyPopulation)?;
            let child_genome = Genome::breed(rng, parent.genome(), parent.genome(), &config.breed_params());
            let child = Individual::evaluate(child_genome, ctx)?;
            if child.fitness() > parent.fitness() {
                self.individuals[0] = child;
            }
            return Ok(());
        }

        self.sort_by_fitness();

        // breeding pool is the top slice; at least 2 members so every parent
        // has a distinct partner available
        let select_count = ((size as f32 * config.selection_cutoff).floor() as usize).clamp(2, size);
        let mut rand_count = (1.0 / config.selection_cutoff).ceil() as usize;
        if config.fittest_survive {
            // one offspring slot per parent is given up for its own survival
            rand_count -= 1;
        }

        let params = config.breed_params();
        let mut offspring = Vec::with_capacity(select_count * rand_count);
        for i in 0..select_count {
            for _ in 0..rand_count {
                // distinct uniformly-random partner from the pool, never self
                let mut partner = i;
                while partner == i {
                    partner = rng.random_range(0..select_count);
                }
                offspring.push(Genome::breed(
                    rng,
                    self.individuals[i].genome(),
                    self.individuals[partner].genome(),
                    &params,
                ));
            }
        }

        let offspring = evaluate_all(offspring, ctx)?;

        if config.fittest_survive {
            self.individuals.truncate(select_count);
            self.individuals.extend(offspring);
        } else {
            self.individuals = offspring;
        }
        // list-length coercion: excess offspring are dropped, and a shortfall
        // leaves the population under its configured size (defined behavior)
        self.individuals.truncate(size);

        Ok(())
    }

    /// the individual with maximal fitness. sorts the population as a side
    /// effect so that index 0 is the best.
    pub fn fittest(&mut self) -> Result<&Individual, EvolveError> {
        if self.individuals.is_empty() {
            return Err(EvolveError::EmptyPopulation);
        }
        self.sort_by_fitness();
        Ok(&self.individuals[0])
    }

    fn sort_by_fitness(&mut self) {
        profiling::scope!("Population::sort_by_fitness");
        // descending; fitness is a finite sum so NaN cannot occur, ties keep
        // insertion order (stable sort)
        self.individuals.sort_by(|a, b| {
            b.fitness()
                .partial_cmp(&a.fitness())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

// barrier: collect finishes every evaluation before selection reads fitness
fn evaluate_all<R: Rasterizer + Sync>(
    genomes: Vec<Genome>,
    ctx: &EvalContext<'_, R>,
) -> Result<Vec<Individual>, EvolveError> {
    profiling::scope!("evaluate_all");
    genomes
        .into_par_iter()
        .map(|genome| Individual::evaluate(genome, ctx))
        .collect()
}
