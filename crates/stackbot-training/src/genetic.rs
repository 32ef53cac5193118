//! The genetic trainer.
//!
//! The trainer moves through the population one candidate at a time. Each
//! candidate plays `runs_per_evaluation` games; the rounded mean of their
//! scores is its fitness. When the last candidate is scored the generation
//! is summarized, winners are selected and bred, and the shuffled children
//! replace the population.

use rand::{Rng as _, SeedableRng as _, seq::SliceRandom as _};
use rand_distr::{Distribution as _, Uniform};
use rand_pcg::Pcg64;
use stackbot_search::heuristic::Weights;

use crate::{
    chromosome::Chromosome,
    config::{ConfigError, InitialPopulation, ReproductionMode, SelectionPolicy, TrainerConfig},
    persistence::{self, GenerationFile, PersistenceError},
    summary::GenerationSummary,
};

/// Children produced by every pair of winners.
const CHILDREN_PER_PAIR: usize = 4;

/// Crossover cut points: the first parent gives at least one gene and the
/// second at least two.
const CROSSOVER_CUTS: std::ops::Range<usize> = 1..6;

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainerError {
    #[display("invalid trainer configuration")]
    Config(ConfigError),
    #[display("cannot load initial population")]
    Persistence(PersistenceError),
}

/// What a [`Trainer::report_score`] call completed.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// A run was recorded; the candidate needs more runs.
    RunRecorded { candidate: usize, run: usize },
    /// The candidate has its fitness; the next candidate is up.
    CandidateScored { candidate: usize, fitness: i64 },
    /// The last candidate was scored and a new generation replaced the
    /// population.
    GenerationAdvanced {
        candidate: usize,
        fitness: i64,
        summary: GenerationSummary,
    },
}

/// The best candidate scored so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChromosome {
    pub chromosome: Chromosome,
    pub fitness: i64,
    pub generation: u32,
}

#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
    rng: Pcg64,
    genes: Uniform<f64>,
    generation: u32,
    chromosomes: Vec<Chromosome>,
    fitness: Vec<i64>,
    current: usize,
    run_sum: i64,
    runs_done: usize,
    best: Option<ScoredChromosome>,
    last_summary: Option<GenerationSummary>,
}

impl Trainer {
    /// Creates a trainer and its first generation.
    ///
    /// Fails if the configuration is invalid or if the configured population
    /// source exists but holds bad content. Unreadable sources fall back to
    /// the next one with a warning.
    pub fn new(config: TrainerConfig) -> Result<Self, TrainerError> {
        config.validate()?;
        let range = config.gene_range;
        let genes = Uniform::new(-range, range).map_err(|_| ConfigError::GeneRange { range })?;
        let rng = match config.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };

        let mut this = Self {
            fitness: vec![0; config.population_size],
            config,
            rng,
            genes,
            generation: 1,
            chromosomes: vec![],
            current: 0,
            run_sum: 0,
            runs_done: 0,
            best: None,
            last_summary: None,
        };
        this.initialize_population()?;
        Ok(this)
    }

    fn initialize_population(&mut self) -> Result<(), PersistenceError> {
        let size = self.config.population_size;

        if self.config.initial_population == InitialPopulation::Saved {
            match self.config.generation_file.as_deref() {
                Some(path) => match persistence::load_generation(path, size) {
                    Ok(file) => {
                        log::info!(
                            "loaded generation {} from {}",
                            file.generation,
                            path.display()
                        );
                        self.generation = file.generation;
                        self.chromosomes = file.chromosomes;
                        return Ok(());
                    }
                    Err(err) if err.is_io() => log::warn!("{err}; trying the next source"),
                    Err(err) => return Err(err),
                },
                None => log::warn!("no generation file configured; trying the next source"),
            }
        }

        if self.config.initial_population != InitialPopulation::Random {
            match self.config.preset_file.as_deref() {
                Some(path) => match persistence::load_preset(path, size) {
                    Ok(chromosomes) => {
                        log::info!("loaded preset population from {}", path.display());
                        self.chromosomes = chromosomes;
                        return Ok(());
                    }
                    Err(err) if err.is_io() => {
                        log::warn!("{err}; starting from a random population");
                    }
                    Err(err) => return Err(err),
                },
                None => log::warn!("no preset file configured; starting from a random population"),
            }
        }

        self.chromosomes = (0..size)
            .map(|_| Chromosome::random(&mut self.rng, &self.genes))
            .collect();
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Generation being evaluated, starting at 1.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Index of the candidate being evaluated.
    #[must_use]
    pub fn current_candidate(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn population(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Weights the next game should be played with.
    #[must_use]
    pub fn current_weights(&self) -> Weights {
        self.chromosomes[self.current].weights()
    }

    #[must_use]
    pub fn best(&self) -> Option<&ScoredChromosome> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn last_summary(&self) -> Option<&GenerationSummary> {
        self.last_summary.as_ref()
    }

    /// Records the final score of a game played with
    /// [`Self::current_weights`].
    pub fn report_score(&mut self, score: i64) -> ReportOutcome {
        let candidate = self.current;
        self.run_sum += score;
        self.runs_done += 1;
        log::debug!(
            "generation {} candidate {} run {}/{}: score {score}",
            self.generation,
            candidate + 1,
            self.runs_done,
            self.config.runs_per_evaluation
        );
        if self.runs_done < self.config.runs_per_evaluation {
            return ReportOutcome::RunRecorded {
                candidate,
                run: self.runs_done,
            };
        }

        let fitness = rounded_mean(self.run_sum, self.runs_done);
        self.fitness[candidate] = fitness;
        self.run_sum = 0;
        self.runs_done = 0;
        let chromosome = self.chromosomes[candidate];
        log::info!(
            "generation {} candidate {}: {} fitness {fitness}",
            self.generation,
            candidate + 1,
            chromosome.weights()
        );
        if self.best.as_ref().is_none_or(|best| fitness > best.fitness) {
            self.best = Some(ScoredChromosome {
                chromosome,
                fitness,
                generation: self.generation,
            });
        }

        self.current += 1;
        if self.current < self.chromosomes.len() {
            return ReportOutcome::CandidateScored { candidate, fitness };
        }
        let summary = self.advance_generation();
        ReportOutcome::GenerationAdvanced {
            candidate,
            fitness,
            summary,
        }
    }

    fn advance_generation(&mut self) -> GenerationSummary {
        let summary = GenerationSummary::new(self.generation, &self.fitness).unwrap_or(
            GenerationSummary {
                generation: self.generation,
                min: 0,
                median: 0,
                max: 0,
                mean: 0.0,
                std_dev: 0.0,
            },
        );
        log::info!("{summary}");

        let winners = self.select_winners();
        let mut children = self.reproduce(&winners);
        children.shuffle(&mut self.rng);

        self.chromosomes = children;
        self.fitness.fill(0);
        self.generation += 1;
        self.current = 0;
        self.save_generation();

        self.last_summary = Some(summary.clone());
        summary
    }

    fn select_winners(&self) -> Vec<Chromosome> {
        let n = self.chromosomes.len();
        match self.config.selection {
            SelectionPolicy::TopHalf => {
                let mut sorted = self.fitness.clone();
                sorted.sort_unstable();
                let mut taken = Vec::with_capacity(n / 2);
                for score in sorted.iter().rev().take(n / 2) {
                    // Equal fitness values go to the lowest index not taken yet.
                    if let Some(index) =
                        (0..n).find(|i| self.fitness[*i] == *score && !taken.contains(i))
                    {
                        taken.push(index);
                    }
                }
                taken.iter().map(|i| self.chromosomes[*i]).collect()
            }
            SelectionPolicy::HeadToHead => (0..n)
                .step_by(2)
                .map(|i| {
                    let winner = if self.fitness[i] > self.fitness[i + 1] {
                        i
                    } else {
                        i + 1
                    };
                    self.chromosomes[winner]
                })
                .collect(),
        }
    }

    fn reproduce(&mut self, winners: &[Chromosome]) -> Vec<Chromosome> {
        let mut children = Vec::with_capacity(winners.len() * 2);
        for (pair, parents) in winners.chunks_exact(2).enumerate() {
            let (a, b) = (&parents[0], &parents[1]);
            log::debug!("parents #{}: {a} x {b}", pair + 1);
            let mut used_cuts = Vec::with_capacity(CHILDREN_PER_PAIR);
            for i in 0..CHILDREN_PER_PAIR {
                let mut child = match self.config.reproduction {
                    ReproductionMode::Crossover => {
                        let cut = self.crossover_cut(&used_cuts);
                        used_cuts.push(cut);
                        crossover(a, b, cut)
                    }
                    ReproductionMode::ParentAverage => parent_average(a, b),
                    ReproductionMode::RandomGene => self.random_gene(a, b),
                };
                self.mutate(&mut child);
                log::debug!("child {}: {child}", i + 1);
                children.push(child);
            }
        }
        children
    }

    fn crossover_cut(&mut self, used: &[usize]) -> usize {
        loop {
            let cut = self.rng.random_range(CROSSOVER_CUTS);
            if !self.config.twin_prevention || !used.contains(&cut) {
                return cut;
            }
        }
    }

    fn random_gene(&mut self, a: &Chromosome, b: &Chromosome) -> Chromosome {
        Chromosome::new(std::array::from_fn(|i| {
            if self.rng.random_bool(0.5) {
                a.genes()[i]
            } else {
                b.genes()[i]
            }
        }))
    }

    fn mutate(&mut self, child: &mut Chromosome) {
        for gene in child.genes_mut() {
            if self.rng.random_bool(self.config.mutation_rate) {
                *gene += self.genes.sample(&mut self.rng);
            }
        }
    }

    fn save_generation(&self) {
        if !self.config.save_generations {
            return;
        }
        let Some(path) = self.config.generation_file.as_deref() else {
            log::warn!("saving generations requires a generation file");
            return;
        };
        let file = GenerationFile {
            generation: self.generation,
            chromosomes: self.chromosomes.clone(),
        };
        match persistence::save_generation(path, &file) {
            Ok(()) => log::debug!("saved generation {} to {}", self.generation, path.display()),
            Err(err) => log::error!("cannot save generation {}: {err}", self.generation),
        }
    }
}

/// `sum / count` rounded half up.
fn rounded_mean(sum: i64, count: usize) -> i64 {
    let count = i64::try_from(count).unwrap_or(i64::MAX);
    (2 * sum + count).div_euclid(2 * count)
}

fn crossover(a: &Chromosome, b: &Chromosome, cut: usize) -> Chromosome {
    Chromosome::new(std::array::from_fn(|i| {
        if i < cut { a.genes()[i] } else { b.genes()[i] }
    }))
}

fn parent_average(a: &Chromosome, b: &Chromosome) -> Chromosome {
    Chromosome::new(std::array::from_fn(|i| (a.genes()[i] + b.genes()[i]) / 2.0))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        chromosome::GENE_COUNT,
        persistence::tests::{preset_text, temp_path},
    };

    fn config() -> TrainerConfig {
        TrainerConfig {
            seed: Some(7),
            ..TrainerConfig::default()
        }
    }

    fn score_generation(trainer: &mut Trainer, score: impl Fn(usize) -> i64) -> ReportOutcome {
        let n = trainer.config().population_size * trainer.config().runs_per_evaluation;
        let mut outcome = None;
        for _ in 0..n {
            let candidate = trainer.current_candidate();
            outcome = Some(trainer.report_score(score(candidate)));
        }
        outcome.unwrap()
    }

    #[test]
    fn test_fitness_is_rounded_mean_of_runs() {
        let mut trainer = Trainer::new(config()).unwrap();
        assert_eq!(
            trainer.report_score(10),
            ReportOutcome::RunRecorded {
                candidate: 0,
                run: 1
            }
        );
        assert_eq!(
            trainer.report_score(20),
            ReportOutcome::RunRecorded {
                candidate: 0,
                run: 2
            }
        );
        assert_eq!(
            trainer.report_score(30),
            ReportOutcome::CandidateScored {
                candidate: 0,
                fitness: 20
            }
        );
        assert_eq!(trainer.current_candidate(), 1);
        assert_eq!(trainer.best().unwrap().fitness, 20);
    }

    #[test]
    fn test_rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(60, 3), 20);
        assert_eq!(rounded_mean(5, 2), 3);
        assert_eq!(rounded_mean(4, 3), 1);
        assert_eq!(rounded_mean(5, 3), 2);
        assert_eq!(rounded_mean(-5, 2), -2);
    }

    #[test]
    fn test_generation_keeps_population_size() {
        let mut trainer = Trainer::new(config()).unwrap();
        let outcome = score_generation(&mut trainer, |i| i64::try_from(i).unwrap() * 100);
        let ReportOutcome::GenerationAdvanced { summary, .. } = outcome else {
            panic!("expected a new generation, got {outcome:?}");
        };
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.min, 0);
        assert_eq!(summary.max, 1500);
        assert_eq!(trainer.generation(), 2);
        assert_eq!(trainer.current_candidate(), 0);
        assert_eq!(trainer.population().len(), 16);
        assert_eq!(trainer.best().unwrap().fitness, 1500);
    }

    #[test]
    fn test_every_mode_produces_full_generation() {
        for selection in [SelectionPolicy::TopHalf, SelectionPolicy::HeadToHead] {
            for reproduction in [
                ReproductionMode::Crossover,
                ReproductionMode::ParentAverage,
                ReproductionMode::RandomGene,
            ] {
                let mut trainer = Trainer::new(TrainerConfig {
                    selection,
                    reproduction,
                    runs_per_evaluation: 1,
                    ..config()
                })
                .unwrap();
                for _ in 0..3 {
                    score_generation(&mut trainer, |i| i64::try_from(i % 5).unwrap());
                }
                assert_eq!(trainer.generation(), 4);
                assert_eq!(trainer.population().len(), 16);
            }
        }
    }

    #[test]
    fn test_top_half_breaks_ties_by_first_unused_index() {
        let mut trainer = Trainer::new(TrainerConfig {
            population_size: 8,
            ..config()
        })
        .unwrap();
        trainer.fitness = vec![5, 9, 5, 1, 9, 0, 5, 2];
        let winners = trainer.select_winners();
        let expected = [1, 4, 0, 2].map(|i| trainer.chromosomes[i]);
        assert_eq!(winners, expected);
    }

    #[test]
    fn test_head_to_head_tie_keeps_second() {
        let mut trainer = Trainer::new(TrainerConfig {
            population_size: 8,
            selection: SelectionPolicy::HeadToHead,
            ..config()
        })
        .unwrap();
        trainer.fitness = vec![3, 3, 7, 2, 0, 1, 4, 4];
        let winners = trainer.select_winners();
        let expected = [1, 2, 5, 7].map(|i| trainer.chromosomes[i]);
        assert_eq!(winners, expected);
    }

    #[test]
    fn test_twin_prevention_uses_distinct_cuts() {
        let a = Chromosome::new([1.0; GENE_COUNT]);
        let b = Chromosome::new([-1.0; GENE_COUNT]);
        for seed in 0..50 {
            let mut trainer = Trainer::new(TrainerConfig {
                population_size: 4,
                mutation_rate: 0.0,
                seed: Some(seed),
                ..TrainerConfig::default()
            })
            .unwrap();
            let children = trainer.reproduce(&[a, b]);
            assert_eq!(children.len(), 4);
            let mut cuts = children
                .iter()
                .map(|c| c.genes().iter().take_while(|g| **g > 0.0).count())
                .collect::<Vec<_>>();
            assert!(cuts.iter().all(|cut| CROSSOVER_CUTS.contains(cut)));
            cuts.sort_unstable();
            cuts.dedup();
            assert_eq!(cuts.len(), 4, "seed {seed}");
        }
    }

    #[test]
    fn test_crossover_without_twin_prevention_may_repeat_cuts() {
        let a = Chromosome::new([1.0; GENE_COUNT]);
        let b = Chromosome::new([-1.0; GENE_COUNT]);
        let mut repeated = false;
        for seed in 0..50 {
            let mut trainer = Trainer::new(TrainerConfig {
                population_size: 4,
                mutation_rate: 0.0,
                twin_prevention: false,
                seed: Some(seed),
                ..TrainerConfig::default()
            })
            .unwrap();
            let mut cuts = trainer
                .reproduce(&[a, b])
                .iter()
                .map(|c| c.genes().iter().take_while(|g| **g > 0.0).count())
                .collect::<Vec<_>>();
            assert!(cuts.iter().all(|cut| CROSSOVER_CUTS.contains(cut)), "seed {seed}");
            cuts.sort_unstable();
            cuts.dedup();
            repeated |= cuts.len() < 4;
        }
        assert!(repeated);
    }

    #[test]
    fn test_random_gene_takes_each_gene_from_a_parent() {
        let a = Chromosome::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let b = Chromosome::new([-1.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0]);
        let mut from_a = [false; GENE_COUNT];
        let mut from_b = [false; GENE_COUNT];
        for seed in 0..20 {
            let mut trainer = Trainer::new(TrainerConfig {
                population_size: 4,
                mutation_rate: 0.0,
                reproduction: ReproductionMode::RandomGene,
                seed: Some(seed),
                ..TrainerConfig::default()
            })
            .unwrap();
            for child in trainer.reproduce(&[a, b]) {
                for (i, gene) in child.genes().iter().enumerate() {
                    let is_a = gene.to_bits() == a.genes()[i].to_bits();
                    let is_b = gene.to_bits() == b.genes()[i].to_bits();
                    assert!(is_a || is_b, "seed {seed} gene {i}: {gene}");
                    from_a[i] |= is_a;
                    from_b[i] |= is_b;
                }
            }
        }
        assert!(from_a.iter().chain(&from_b).all(|seen| *seen));
    }

    #[test]
    fn test_parent_average_without_mutation() {
        let mut trainer = Trainer::new(TrainerConfig {
            population_size: 4,
            mutation_rate: 0.0,
            reproduction: ReproductionMode::ParentAverage,
            ..config()
        })
        .unwrap();
        let a = Chromosome::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let b = Chromosome::new([3.0, 2.0, 1.0, 0.0, -1.0, -2.0, -3.0]);
        let children = trainer.reproduce(&[a, b]);
        let expected = Chromosome::new([2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
        assert_eq!(children, vec![expected; 4]);
    }

    #[test]
    fn test_mutation_adds_bounded_offset() {
        let mut trainer = Trainer::new(TrainerConfig {
            population_size: 4,
            mutation_rate: 1.0,
            ..config()
        })
        .unwrap();
        let mut child = Chromosome::new([10.0; GENE_COUNT]);
        trainer.mutate(&mut child);
        assert!(child.genes().iter().all(|g| (5.0..15.0).contains(g)));
        assert!(child.genes().iter().any(|g| (g - 10.0).abs() > f64::EPSILON));
    }

    #[test]
    fn test_seeded_trainers_are_reproducible() {
        let mut a = Trainer::new(config()).unwrap();
        let mut b = Trainer::new(config()).unwrap();
        assert_eq!(a.population(), b.population());
        score_generation(&mut a, |i| i64::try_from(i).unwrap());
        score_generation(&mut b, |i| i64::try_from(i).unwrap());
        assert_eq!(a.population(), b.population());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Trainer::new(TrainerConfig {
            population_size: 6,
            ..config()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TrainerError::Config(ConfigError::PopulationSize { size: 6 })
        ));
    }

    #[test]
    fn test_initial_population_from_preset() {
        let path = temp_path("preset.csv");
        fs::write(&path, preset_text(4)).unwrap();
        let trainer = Trainer::new(TrainerConfig {
            population_size: 4,
            initial_population: InitialPopulation::Preset,
            preset_file: Some(path.clone()),
            ..config()
        })
        .unwrap();
        assert_eq!(trainer.population()[2].genes()[0], 2.0);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_preset_is_fatal() {
        let path = temp_path("bad-preset.csv");
        fs::write(&path, preset_text(3)).unwrap();
        let err = Trainer::new(TrainerConfig {
            population_size: 4,
            initial_population: InitialPopulation::Preset,
            preset_file: Some(path.clone()),
            ..config()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            TrainerError::Persistence(PersistenceError::PopulationMismatch { .. })
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_sources_fall_back() {
        let preset = temp_path("fallback-preset.csv");
        fs::write(&preset, preset_text(4)).unwrap();
        let trainer = Trainer::new(TrainerConfig {
            population_size: 4,
            initial_population: InitialPopulation::Saved,
            generation_file: Some(temp_path("missing-generation.json")),
            preset_file: Some(preset.clone()),
            ..config()
        })
        .unwrap();
        assert_eq!(trainer.population()[3].genes()[0], 3.0);
        assert_eq!(trainer.generation(), 1);
        fs::remove_file(&preset).unwrap();

        let trainer = Trainer::new(TrainerConfig {
            population_size: 4,
            initial_population: InitialPopulation::Preset,
            preset_file: Some(temp_path("missing-preset.csv")),
            ..config()
        })
        .unwrap();
        assert_eq!(trainer.population().len(), 4);
    }

    #[test]
    fn test_saved_generations_resume() {
        let path = temp_path("resume.json");
        let config = TrainerConfig {
            population_size: 4,
            runs_per_evaluation: 1,
            save_generations: true,
            generation_file: Some(path.clone()),
            ..config()
        };
        let mut trainer = Trainer::new(config.clone()).unwrap();
        score_generation(&mut trainer, |i| i64::try_from(i).unwrap());

        let resumed = Trainer::new(TrainerConfig {
            initial_population: InitialPopulation::Saved,
            save_generations: false,
            ..config
        })
        .unwrap();
        assert_eq!(resumed.generation(), 2);
        assert_eq!(resumed.population(), trainer.population());
        fs::remove_file(&path).unwrap();
    }
}
