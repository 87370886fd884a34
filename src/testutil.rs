//! deterministic rasterizer stand-ins for tests that exercise the evolution
//! machinery without a real drawing backend.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dna::Genome;
use crate::render::{RasterizeError, Rasterizer};

/// fills every byte with the genome's first value, quantized the way a real
/// backend would. fitness then depends only on `genes[0]`, which makes
/// expected scores easy to compute by hand.
pub struct FlatRasterizer;

impl Rasterizer for FlatRasterizer {
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> Result<Vec<u8>, RasterizeError> {
        let level = (genome.genes()[0].clamp(0.0, 1.0) * 255.0).round() as u8;
        Ok(vec![level; (width * height * 4) as usize])
    }
}

/// always fails, for error-path tests
pub struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    fn rasterize(&self, _genome: &Genome, _width: u32, _height: u32) -> Result<Vec<u8>, RasterizeError> {
        Err(RasterizeError("backend unavailable".to_owned()))
    }
}

/// succeeds like [`FlatRasterizer`] for the first `n` calls, then fails. used
/// to inject a backend failure mid-run.
pub struct FlakyRasterizer {
    remaining: AtomicUsize,
}

impl FlakyRasterizer {
    pub fn fail_after(n: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(n),
        }
    }
}

impl Rasterizer for FlakyRasterizer {
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> Result<Vec<u8>, RasterizeError> {
        if self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            FlatRasterizer.rasterize(genome, width, height)
        } else {
            Err(RasterizeError("backend gave up".to_owned()))
        }
    }
}
