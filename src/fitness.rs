//! candidate-vs-reference scoring. both metrics normalize to (-inf, 1] with
//! 1.0 meaning a byte-identical match.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// which per-sample difference the score accumulates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffMetric {
    /// `1 - Σd² / (N·255²)`
    Squared,
    /// `1 - Σ|d| / (N·255)`
    Absolute,
}

// pixels per rayon work unit; coarse-grained to keep per-task overhead low
const MIN_CHUNK: usize = 64 * 1024;

/// score a rasterized candidate against the reference buffer. every sample
/// (all 4 channels of every pixel) participates.
pub fn score(candidate: &[u8], reference: &[u8], metric: DiffMetric) -> f64 {
    profiling::scope!("fitness::score");
    debug_assert_eq!(candidate.len(), reference.len());

    let samples = candidate.len() as f64;
    match metric {
        DiffMetric::Squared => {
            let sum = accumulate(candidate, reference, |d| (d * d) as u64);
            1.0 - sum as f64 / (samples * 255.0 * 255.0)
        }
        DiffMetric::Absolute => {
            let sum = accumulate(candidate, reference, |d| d.unsigned_abs() as u64);
            1.0 - sum as f64 / (samples * 255.0)
        }
    }
}

fn accumulate(candidate: &[u8], reference: &[u8], per_sample: impl Fn(i64) -> u64 + Sync) -> u64 {
    candidate
        .par_chunks(MIN_CHUNK)
        .zip(reference.par_chunks(MIN_CHUNK))
        .map(|(c, r)| {
            c.iter()
                .zip(r)
                .map(|(&a, &b)| per_sample(a as i64 - b as i64))
                .sum::<u64>()
        })
        .sum()
}
