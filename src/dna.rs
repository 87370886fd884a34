use rand::Rng;

/// non-vertex values at the start of each gene: r, g, b, opacity
pub const GENE_HEADER: usize = 4;

/// freshly spawned polygons never start fully transparent
const OPACITY_FLOOR: f32 = 0.2;

/// knobs consumed by [`Genome::breed`]
#[derive(Clone, Copy, Debug)]
pub struct BreedParams {
    /// true = one random split point, false = per-gene coin flip
    pub split_inheritance: bool,
    /// per-value mutation probability, 0..1
    pub mutation_chance: f32,
    /// maximum mutation offset; mutated values clamp to 0..1
    pub mutate_amount: f32,
}

/// flat real-valued encoding of a candidate image. each polygon occupies one
/// fixed-size gene `[r, g, b, opacity, x0, y0, .., x(v-1), y(v-1)]` with colors
/// and opacity in 0..1 and vertex coordinates in image-fraction space.
/// vertex coordinates may drift outside 0..1 until a mutation clamps them.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    genes: Vec<f32>,
    vertex_count: usize,
}

impl Genome {
    /// unparented creation. colors are uniform draws, opacity is the product of
    /// two uniforms (biased low) floored at 0.2, and all of a polygon's vertices
    /// jitter ±0.5 around one shared anchor so fresh shapes stay small and
    /// locally placed instead of spanning the whole canvas.
    pub fn spawn<R: Rng>(rng: &mut R, polygon_count: usize, vertex_count: usize) -> Self {
        profiling::scope!("Genome::spawn");
        let gene_size = GENE_HEADER + vertex_count * 2;
        let mut genes = Vec::with_capacity(polygon_count * gene_size);

        for _ in 0..polygon_count {
            genes.push(rng.random::<f32>());
            genes.push(rng.random::<f32>());
            genes.push(rng.random::<f32>());
            genes.push((rng.random::<f32>() * rng.random::<f32>()).max(OPACITY_FLOOR));

            let anchor_x = rng.random::<f32>();
            let anchor_y = rng.random::<f32>();
            for _ in 0..vertex_count {
                genes.push(anchor_x + rng.random::<f32>() - 0.5);
                genes.push(anchor_y + rng.random::<f32>() - 0.5);
            }
        }

        Self { genes, vertex_count }
    }

    /// gene-by-gene inheritance from two parents of identical layout. a gene
    /// (one polygon's full record) is the atomic inheritance unit; within an
    /// inherited gene each value independently mutates with `mutation_chance`,
    /// offset uniform in ±`mutate_amount`, clamped to 0..1. the clamp applies
    /// to vertex coordinates too, even though unmutated coordinates may lie
    /// outside 0..1 (defined behavior).
    pub fn breed<R: Rng>(rng: &mut R, mother: &Genome, father: &Genome, params: &BreedParams) -> Self {
        profiling::scope!("Genome::breed");
        debug_assert_eq!(mother.genes.len(), father.genes.len());
        debug_assert_eq!(mother.vertex_count, father.vertex_count);

        let gene_size = mother.gene_size();
        let dna_len = mother.genes.len();
        let split = rng.random_range(0..dna_len);
        let mut genes = Vec::with_capacity(dna_len);

        let mut start = 0;
        while start < dna_len {
            let parent = if params.split_inheritance {
                // flat-index comparison against the split point, like the gene loop itself
                if start < split { mother } else { father }
            } else if rng.random_bool(0.5) {
                mother
            } else {
                father
            };

            for &value in &parent.genes[start..start + gene_size] {
                let mut v = value;
                if rng.random::<f32>() < params.mutation_chance {
                    v += rng.random::<f32>() * params.mutate_amount * 2.0 - params.mutate_amount;
                    v = v.clamp(0.0, 1.0);
                }
                genes.push(v);
            }

            start += gene_size;
        }

        Self {
            genes,
            vertex_count: mother.vertex_count,
        }
    }

    pub fn gene_size(&self) -> usize {
        GENE_HEADER + self.vertex_count * 2
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn polygon_count(&self) -> usize {
        self.genes.len() / self.gene_size()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[f32] {
        &self.genes
    }

    /// iterate genes, one fixed-size slice per polygon
    pub fn polygons(&self) -> std::slice::ChunksExact<'_, f32> {
        self.genes.chunks_exact(self.gene_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn spawn_has_fixed_layout() {
        let g = Genome::spawn(&mut rng(), 7, 5);
        assert_eq!(g.gene_size(), 4 + 2 * 5);
        assert_eq!(g.len(), 7 * (4 + 2 * 5));
        assert_eq!(g.polygon_count(), 7);
        assert_eq!(g.polygons().count(), 7);
    }

    #[test]
    fn spawn_colors_and_opacity_in_range() {
        let g = Genome::spawn(&mut rng(), 50, 3);
        for gene in g.polygons() {
            for &c in &gene[..3] {
                assert!((0.0..=1.0).contains(&c));
            }
            // opacity is floored, never fully transparent at creation
            assert!((0.2..=1.0).contains(&gene[3]));
        }
    }

    #[test]
    fn spawn_vertices_cluster_around_anchor() {
        let g = Genome::spawn(&mut rng(), 20, 6);
        for gene in g.polygons() {
            let verts: Vec<(f32, f32)> = gene[GENE_HEADER..]
                .chunks_exact(2)
                .map(|p| (p[0], p[1]))
                .collect();
            // all jitter comes from the same ±0.5 window around one anchor,
            // so no two vertices of a polygon can be further than 1.0 apart
            for a in &verts {
                for b in &verts {
                    assert!((a.0 - b.0).abs() <= 1.0);
                    assert!((a.1 - b.1).abs() <= 1.0);
                }
            }
        }
    }

    #[test]
    fn breed_preserves_length() {
        let mut r = rng();
        let mother = Genome::spawn(&mut r, 10, 4);
        let father = Genome::spawn(&mut r, 10, 4);
        let params = BreedParams {
            split_inheritance: false,
            mutation_chance: 0.1,
            mutate_amount: 0.1,
        };
        let child = Genome::breed(&mut r, &mother, &father, &params);
        assert_eq!(child.len(), mother.len());
        assert_eq!(child.vertex_count(), 4);
    }

    #[test]
    fn breed_without_mutation_is_gene_atomic() {
        let mut r = rng();
        let mother = Genome::spawn(&mut r, 12, 3);
        let father = Genome::spawn(&mut r, 12, 3);
        let params = BreedParams {
            split_inheritance: false,
            mutation_chance: 0.0,
            mutate_amount: 0.5,
        };
        let child = Genome::breed(&mut r, &mother, &father, &params);
        for ((c, m), f) in child.polygons().zip(mother.polygons()).zip(father.polygons()) {
            assert!(c == m || c == f, "gene must come wholesale from one parent");
        }
    }

    #[test]
    fn split_inheritance_is_a_single_crossover() {
        let mut r = rng();
        let mother = Genome::spawn(&mut r, 16, 3);
        let father = Genome::spawn(&mut r, 16, 3);
        let params = BreedParams {
            split_inheritance: true,
            mutation_chance: 0.0,
            mutate_amount: 0.0,
        };
        let child = Genome::breed(&mut r, &mother, &father, &params);
        let sources: Vec<u8> = child
            .polygons()
            .zip(mother.polygons())
            .map(|(c, m)| u8::from(c != m))
            .collect();
        // mother genes form a prefix, father genes the suffix
        let mut sorted = sources.clone();
        sorted.sort_unstable();
        assert_eq!(sources, sorted);
    }

    #[test]
    fn full_mutation_clamps_every_field() {
        let mut r = rng();
        let mother = Genome::spawn(&mut r, 30, 6);
        let father = Genome::spawn(&mut r, 30, 6);
        let params = BreedParams {
            split_inheritance: true,
            mutation_chance: 1.0,
            mutate_amount: 1.0,
        };
        let child = Genome::breed(&mut r, &mother, &father, &params);
        for &v in child.genes() {
            assert!((0.0..=1.0).contains(&v), "mutated value {v} escaped 0..1");
        }
    }
}
