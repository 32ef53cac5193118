use std::fmt;

/// Fitness distribution of one evaluated generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub generation: u32,
    pub min: i64,
    /// The element at index `n / 2` of the sorted fitness values.
    pub median: i64,
    pub max: i64,
    pub mean: f64,
    /// Sample standard deviation; zero for a single candidate.
    pub std_dev: f64,
}

impl GenerationSummary {
    /// Summarizes `fitness`, or returns `None` if it is empty.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new(generation: u32, fitness: &[i64]) -> Option<Self> {
        let mut sorted = fitness.to_vec();
        sorted.sort_unstable();

        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let median = sorted[sorted.len() / 2];
        let n = sorted.len() as f64;
        let mean = sorted.iter().map(|v| *v as f64).sum::<f64>() / n;
        let std_dev = if sorted.len() > 1 {
            let sum_sq = sorted
                .iter()
                .map(|v| (*v as f64 - mean).powi(2))
                .sum::<f64>();
            (sum_sq / (n - 1.0)).sqrt()
        } else {
            0.0
        };

        Some(Self {
            generation,
            min,
            median,
            max,
            mean,
            std_dev,
        })
    }
}

impl fmt::Display for GenerationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: min={} med={} max={} mean={:.1} sd={:.1}",
            self.generation, self.min, self.median, self.max, self.mean, self.std_dev
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_scores() {
        let summary = GenerationSummary::new(3, &[40, 10, 30, 20]).unwrap();
        assert_eq!(summary.generation, 3);
        assert_eq!(summary.min, 10);
        assert_eq!(summary.median, 30);
        assert_eq!(summary.max, 40);
        assert!((summary.mean - 25.0).abs() < 1e-9);
        // sqrt(500 / 3)
        assert!((summary.std_dev - 12.909_944_487_358_056).abs() < 1e-9);
    }

    #[test]
    fn test_single_and_empty() {
        let single = GenerationSummary::new(1, &[7]).unwrap();
        assert_eq!((single.min, single.median, single.max), (7, 7, 7));
        assert!(single.std_dev.abs() < f64::EPSILON);
        assert!(GenerationSummary::new(1, &[]).is_none());
    }
}
