use thiserror::Error;
use tiny_skia as sk;

use crate::dna::{Genome, GENE_HEADER};

/// the external rasterization backend could not produce a buffer.
/// fatal for the run that hits it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("rasterization failed: {0}")]
pub struct RasterizeError(pub String);

/// turns a genome into a `width × height × 4` straight-alpha RGBA buffer,
/// row-major, samples in 0..=255. must be deterministic: the same genome and
/// dimensions always yield the same bytes.
pub trait Rasterizer {
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> Result<Vec<u8>, RasterizeError>;
}

/// CPU rasterizer backed by tiny-skia. polygons composite in gene order over
/// an opaque black canvas, filled or stroked at 1px depending on `fill_polygons`.
#[derive(Clone, Copy, Debug)]
pub struct CpuRenderer {
    pub fill_polygons: bool,
    pub antialias: bool,
}

impl Default for CpuRenderer {
    fn default() -> Self {
        Self {
            fill_polygons: true,
            antialias: true,
        }
    }
}

impl Rasterizer for CpuRenderer {
    fn rasterize(&self, genome: &Genome, width: u32, height: u32) -> Result<Vec<u8>, RasterizeError> {
        profiling::scope!("CpuRenderer::rasterize");
        let mut pix = sk::Pixmap::new(width, height)
            .ok_or_else(|| RasterizeError(format!("cannot allocate {width}x{height} pixmap")))?;
        pix.fill(sk::Color::BLACK);

        let w = width as f32;
        let h = height as f32;
        for gene in genome.polygons() {
            let Some(path) = polygon_path(gene, w, h) else {
                // degenerate vertex sets produce no drawable path; skip them
                continue;
            };

            let color = sk::Color::from_rgba(
                gene[0].clamp(0.0, 1.0),
                gene[1].clamp(0.0, 1.0),
                gene[2].clamp(0.0, 1.0),
                gene[3].clamp(0.0, 1.0),
            )
            .unwrap_or(sk::Color::BLACK);

            let mut paint = sk::Paint::default();
            paint.anti_alias = self.antialias;
            paint.shader = sk::Shader::SolidColor(color);

            if self.fill_polygons {
                pix.fill_path(&path, &paint, sk::FillRule::Winding, sk::Transform::identity(), None);
            } else {
                let stroke = sk::Stroke {
                    width: 1.0,
                    ..sk::Stroke::default()
                };
                pix.stroke_path(&path, &paint, &stroke, sk::Transform::identity(), None);
            }
        }

        Ok(unpremultiply(&pix))
    }
}

fn polygon_path(gene: &[f32], w: f32, h: f32) -> Option<sk::Path> {
    let verts = &gene[GENE_HEADER..];
    let mut pb = sk::PathBuilder::new();
    pb.move_to(verts[0] * w, verts[1] * h);
    for pair in verts[2..].chunks_exact(2) {
        pb.line_to(pair[0] * w, pair[1] * h);
    }
    pb.close();
    pb.finish()
}

// tiny-skia stores premultiplied bytes internally; callers get straight RGBA
fn unpremultiply(pix: &sk::Pixmap) -> Vec<u8> {
    profiling::scope!("unpremultiply");
    let mut out = Vec::with_capacity(pix.pixels().len() * 4);
    for p in pix.pixels() {
        let c = p.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn buffer_has_expected_shape() {
        let genome = Genome::spawn(&mut Pcg32::seed_from_u64(1), 5, 3);
        let buf = CpuRenderer::default().rasterize(&genome, 20, 10).unwrap();
        assert_eq!(buf.len(), 20 * 10 * 4);
    }

    #[test]
    fn rasterization_is_deterministic() {
        let genome = Genome::spawn(&mut Pcg32::seed_from_u64(7), 25, 6);
        let r = CpuRenderer::default();
        let a = r.rasterize(&genome, 64, 64).unwrap();
        let b = r.rasterize(&genome, 64, 64).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn background_is_opaque_black() {
        // a genome whose polygons all sit far off-canvas leaves the background untouched
        let genome = Genome::spawn(&mut Pcg32::seed_from_u64(3), 1, 3);
        let buf = CpuRenderer::default().rasterize(&genome, 4, 4).unwrap();
        // every alpha sample is 255 regardless of what was drawn
        for px in buf.chunks_exact(4) {
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn stroked_output_differs_from_filled() {
        let genome = Genome::spawn(&mut Pcg32::seed_from_u64(11), 10, 4);
        let filled = CpuRenderer { fill_polygons: true, antialias: true }
            .rasterize(&genome, 32, 32)
            .unwrap();
        let stroked = CpuRenderer { fill_polygons: false, antialias: true }
            .rasterize(&genome, 32, 32)
            .unwrap();
        assert_ne!(filled, stroked);
    }
}
