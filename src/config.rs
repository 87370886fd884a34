use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dna::{BreedParams, GENE_HEADER};
use crate::fitness::DiffMetric;

/// a parameter fell outside its valid range. validation runs before a run
/// starts, never mid-loop.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("population_size must be at least 1 (got {0})")]
    PopulationSize(usize),
    #[error("selection_cutoff must be in (0, 1] (got {0})")]
    SelectionCutoff(f32),
    #[error("mutation_chance must be in [0, 1] (got {0})")]
    MutationChance(f32),
    #[error("mutate_amount must be in [0, 1] (got {0})")]
    MutateAmount(f32),
    #[error("polygon_count must be at least 1 (got {0})")]
    PolygonCount(usize),
    #[error("vertex_count must be at least 1 (got {0})")]
    VertexCount(usize),
    #[error("working_resolution must be at least 1 (got {0})")]
    WorkingResolution(u32),
    #[error("malformed share string: {0}")]
    ShareString(String),
}

/// flat set of run parameters. changing any of these while a run is live is
/// rejected by the simulation; validate before use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub population_size: usize,
    /// top fraction of the population eligible to breed, (0, 1]
    pub selection_cutoff: f32,
    /// keep the breeding pool alive into the next generation
    pub fittest_survive: bool,
    pub mutation_chance: f32,
    pub mutate_amount: f32,
    pub polygon_count: usize,
    pub vertex_count: usize,
    /// square edge length of the fitness rasterization, in pixels
    pub working_resolution: u32,
    /// fill polygons, or stroke 1px outlines
    pub fill_polygons: bool,
    /// true = single split-point inheritance, false = per-gene coin flip
    pub random_inheritance: bool,
    /// squared-difference metric instead of absolute-difference
    pub use_squared_diff: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            population_size: 60,
            selection_cutoff: 0.15,
            fittest_survive: true,
            mutation_chance: 0.1,
            mutate_amount: 0.1,
            polygon_count: 125,
            vertex_count: 6,
            working_resolution: 512,
            fill_polygons: true,
            random_inheritance: true,
            use_squared_diff: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 1 {
            return Err(ConfigError::PopulationSize(self.population_size));
        }
        // cutoff of 0 would divide by zero in the offspring count
        if !(self.selection_cutoff > 0.0 && self.selection_cutoff <= 1.0) {
            return Err(ConfigError::SelectionCutoff(self.selection_cutoff));
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return Err(ConfigError::MutationChance(self.mutation_chance));
        }
        if !(0.0..=1.0).contains(&self.mutate_amount) {
            return Err(ConfigError::MutateAmount(self.mutate_amount));
        }
        if self.polygon_count < 1 {
            return Err(ConfigError::PolygonCount(self.polygon_count));
        }
        if self.vertex_count < 1 {
            return Err(ConfigError::VertexCount(self.vertex_count));
        }
        if self.working_resolution < 1 {
            return Err(ConfigError::WorkingResolution(self.working_resolution));
        }
        Ok(())
    }

    /// values per gene: r, g, b, opacity plus one (x, y) pair per vertex
    pub fn gene_size(&self) -> usize {
        GENE_HEADER + self.vertex_count * 2
    }

    pub fn dna_len(&self) -> usize {
        self.polygon_count * self.gene_size()
    }

    pub fn metric(&self) -> DiffMetric {
        if self.use_squared_diff {
            DiffMetric::Squared
        } else {
            DiffMetric::Absolute
        }
    }

    pub fn breed_params(&self) -> BreedParams {
        BreedParams {
            split_inheritance: self.random_inheritance,
            mutation_chance: self.mutation_chance,
            mutate_amount: self.mutate_amount,
        }
    }

    /// save as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// load from JSON, falling back to defaults if the file is missing or broken
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("failed to parse {}: {e}. using defaults.", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// human-shareable encoding: ordered `&`-joined fields, percentages for the
    /// fractional parameters, bools as 1/0
    pub fn to_share_string(&self) -> String {
        format!(
            "{}&{}&{}&{}&{}&{}&{}&{}&{}&{}&{}",
            self.population_size,
            fmt_pct(self.selection_cutoff),
            u8::from(self.fittest_survive),
            fmt_pct(self.mutation_chance),
            fmt_pct(self.mutate_amount),
            self.polygon_count,
            self.vertex_count,
            self.working_resolution,
            u8::from(self.fill_polygons),
            u8::from(self.random_inheritance),
            u8::from(self.use_squared_diff),
        )
    }

    pub fn from_share_string(s: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = s.split('&').collect();
        if fields.len() != 11 {
            return Err(ConfigError::ShareString(format!(
                "expected 11 fields, got {}",
                fields.len()
            )));
        }

        let config = Self {
            population_size: parse(fields[0])?,
            selection_cutoff: parse::<f32>(fields[1])? / 100.0,
            fittest_survive: parse_bool(fields[2])?,
            mutation_chance: parse::<f32>(fields[3])? / 100.0,
            mutate_amount: parse::<f32>(fields[4])? / 100.0,
            polygon_count: parse(fields[5])?,
            vertex_count: parse(fields[6])?,
            working_resolution: parse(fields[7])?,
            fill_polygons: parse_bool(fields[8])?,
            random_inheritance: parse_bool(fields[9])?,
            use_squared_diff: parse_bool(fields[10])?,
        };
        config.validate()?;
        Ok(config)
    }
}

// one decimal of precision is plenty for slider-derived percentages;
// trim the trailing ".0" so round numbers stay round
fn fmt_pct(fraction: f32) -> String {
    let pct = (fraction as f64 * 1000.0).round() / 10.0;
    if pct.fract() == 0.0 {
        format!("{}", pct as i64)
    } else {
        format!("{pct}")
    }
}

fn parse<T: std::str::FromStr>(field: &str) -> Result<T, ConfigError> {
    field
        .parse()
        .map_err(|_| ConfigError::ShareString(format!("cannot parse field {field:?}")))
}

fn parse_bool(field: &str) -> Result<bool, ConfigError> {
    Ok(parse::<i64>(field)? != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let mut c = Config::default();
        c.population_size = 0;
        assert_eq!(c.validate(), Err(ConfigError::PopulationSize(0)));

        let mut c = Config::default();
        c.selection_cutoff = 0.0;
        assert!(matches!(c.validate(), Err(ConfigError::SelectionCutoff(_))));

        let mut c = Config::default();
        c.selection_cutoff = 1.5;
        assert!(matches!(c.validate(), Err(ConfigError::SelectionCutoff(_))));

        let mut c = Config::default();
        c.mutation_chance = -0.1;
        assert!(matches!(c.validate(), Err(ConfigError::MutationChance(_))));

        let mut c = Config::default();
        c.mutate_amount = 2.0;
        assert!(matches!(c.validate(), Err(ConfigError::MutateAmount(_))));

        let mut c = Config::default();
        c.working_resolution = 0;
        assert!(matches!(c.validate(), Err(ConfigError::WorkingResolution(_))));
    }

    #[test]
    fn gene_arithmetic() {
        let c = Config::default();
        assert_eq!(c.gene_size(), 4 + 2 * 6);
        assert_eq!(c.dna_len(), 125 * 16);
    }

    #[test]
    fn share_string_of_defaults() {
        assert_eq!(
            Config::default().to_share_string(),
            "60&15&1&10&10&125&6&512&1&1&1"
        );
    }

    #[test]
    fn share_string_round_trips() {
        let original = Config {
            population_size: 30,
            selection_cutoff: 0.25,
            fittest_survive: false,
            mutation_chance: 0.015,
            mutate_amount: 0.2,
            polygon_count: 50,
            vertex_count: 3,
            working_resolution: 128,
            fill_polygons: false,
            random_inheritance: false,
            use_squared_diff: false,
        };
        let parsed = Config::from_share_string(&original.to_share_string()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn malformed_share_strings_are_rejected() {
        assert!(matches!(
            Config::from_share_string("1&2&3"),
            Err(ConfigError::ShareString(_))
        ));
        assert!(matches!(
            Config::from_share_string("x&15&1&10&10&125&6&512&1&1&1"),
            Err(ConfigError::ShareString(_))
        ));
        // parses but fails validation: zero population
        assert!(matches!(
            Config::from_share_string("0&15&1&10&10&125&6&512&1&1&1"),
            Err(ConfigError::PopulationSize(0))
        ));
    }
}
