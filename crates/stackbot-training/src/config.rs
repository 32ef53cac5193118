use std::path::PathBuf;

/// How the winners of a generation are picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// The better half of the population by fitness.
    #[default]
    TopHalf,
    /// The better member of each consecutive pair `(0, 1), (2, 3), ...`.
    HeadToHead,
}

/// How a pair of winners produces children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReproductionMode {
    /// Genes before a random cut point from the first parent, the rest from
    /// the second.
    #[default]
    Crossover,
    /// Every gene is the mean of both parents.
    ParentAverage,
    /// Every gene comes from a parent picked by a coin flip.
    RandomGene,
}

/// Where the first generation comes from.
///
/// Each source falls back to the ones after it (saved, then preset, then
/// random) when its file cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitialPopulation {
    #[default]
    Random,
    Preset,
    Saved,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    /// Number of chromosomes per generation; a positive multiple of 4.
    pub population_size: usize,
    /// Probability in `[0, 1]` that a child gene mutates.
    pub mutation_rate: f64,
    /// Games averaged into one candidate's fitness.
    pub runs_per_evaluation: usize,
    pub selection: SelectionPolicy,
    pub reproduction: ReproductionMode,
    /// Forces the four children of a crossover pair to use distinct cut
    /// points.
    pub twin_prevention: bool,
    /// Random genes and mutation offsets are drawn from
    /// `[-gene_range, gene_range)`.
    pub gene_range: f64,
    pub initial_population: InitialPopulation,
    /// Preset table, one chromosome of comma-separated genes per line.
    pub preset_file: Option<PathBuf>,
    /// JSON file a generation is loaded from and saved to.
    pub generation_file: Option<PathBuf>,
    /// Write every new generation to `generation_file`.
    pub save_generations: bool,
    /// Seed for a reproducible run.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            population_size: 16,
            mutation_rate: 0.05,
            runs_per_evaluation: 3,
            selection: SelectionPolicy::default(),
            reproduction: ReproductionMode::default(),
            twin_prevention: true,
            gene_range: 5.0,
            initial_population: InitialPopulation::default(),
            preset_file: None,
            generation_file: None,
            save_generations: false,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be a positive multiple of 4, got {size}")]
    PopulationSize { size: usize },
    #[display("mutation rate must be within [0, 1], got {rate}")]
    MutationRate { rate: f64 },
    #[display("runs per evaluation must be positive")]
    NoRuns,
    #[display("gene range must be positive and finite, got {range}")]
    GeneRange { range: f64 },
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 || self.population_size % 4 != 0 {
            return Err(ConfigError::PopulationSize {
                size: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRate {
                rate: self.mutation_rate,
            });
        }
        if self.runs_per_evaluation == 0 {
            return Err(ConfigError::NoRuns);
        }
        if !(self.gene_range.is_finite() && self.gene_range > 0.0) {
            return Err(ConfigError::GeneRange {
                range: self.gene_range,
            });
        }
        Ok(())
    }
}
