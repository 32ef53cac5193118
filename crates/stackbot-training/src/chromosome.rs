use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use stackbot_search::heuristic::Weights;

/// Number of genes, one per heuristic feature.
pub const GENE_COUNT: usize = Weights::LEN;

/// A candidate weight vector.
///
/// Genes are in canonical feature order, see [`Weights::FEATURE_NAMES`].
/// Serialized as a plain array of numbers.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Chromosome {
    genes: [f64; GENE_COUNT],
}

impl Chromosome {
    #[must_use]
    pub const fn new(genes: [f64; GENE_COUNT]) -> Self {
        Self { genes }
    }

    /// Samples every gene independently from `genes`.
    pub fn random<R>(rng: &mut R, genes: &Uniform<f64>) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(std::array::from_fn(|_| genes.sample(rng)))
    }

    #[must_use]
    pub fn genes(&self) -> &[f64; GENE_COUNT] {
        &self.genes
    }

    pub fn genes_mut(&mut self) -> &mut [f64; GENE_COUNT] {
        &mut self.genes
    }

    #[must_use]
    pub fn weights(&self) -> Weights {
        Weights::from_array(self.genes)
    }
}

impl From<Weights> for Chromosome {
    fn from(weights: Weights) -> Self {
        Self::new(weights.to_array())
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{gene:.2}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    #[test]
    fn test_random_genes_stay_in_range() {
        let mut rng = Pcg64::seed_from_u64(1);
        let genes = Uniform::new(-5.0, 5.0).unwrap();
        for _ in 0..100 {
            let chromosome = Chromosome::random(&mut rng, &genes);
            assert!(chromosome.genes().iter().all(|g| (-5.0..5.0).contains(g)));
        }
    }

    #[test]
    fn test_serializes_as_array() {
        let chromosome = Chromosome::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.5]);
        let json = serde_json::to_string(&chromosome).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0,5.0,6.0,7.5]");
        let parsed: Chromosome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, chromosome);
        assert!(serde_json::from_str::<Chromosome>("[1.0,2.0]").is_err());
    }

    #[test]
    fn test_display_rounds_genes() {
        let chromosome = Chromosome::new([1.234, -0.5, 0.0, 0.0, 0.0, 0.0, 3.999]);
        assert_eq!(
            chromosome.to_string(),
            "[1.23, -0.50, 0.00, 0.00, 0.00, 0.00, 4.00]"
        );
    }
}
