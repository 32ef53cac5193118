use std::path::PathBuf;

use chrono::Utc;
use stackbot_search::{heuristic::HeuristicEvaluator, search::PlacementSearch};
use stackbot_training::{
    config::TrainerConfig,
    genetic::{ReportOutcome, Trainer},
};

use super::play_headless::play_game;
use crate::{model::AiModel, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Trainer configuration as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of generations to train
    #[arg(long, default_value_t = 20)]
    generations: u32,
    /// Pieces placed before a training game is stopped
    #[arg(long, default_value_t = 500)]
    turn_limit: usize,
    /// Chromosomes per generation, a multiple of 4
    #[arg(long)]
    population: Option<usize>,
    /// Probability that a child gene mutates
    #[arg(long)]
    mutation_rate: Option<f64>,
    /// Games averaged into one fitness value
    #[arg(long)]
    runs: Option<usize>,
    /// Seed of the trainer and of every game it plays
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn trainer_config(&self) -> anyhow::Result<TrainerConfig> {
        let mut config: TrainerConfig = match &self.config {
            Some(path) => util::read_json_file("trainer config", path)?,
            None => TrainerConfig::default(),
        };
        if let Some(size) = self.population {
            config.population_size = size;
        }
        if let Some(rate) = self.mutation_rate {
            config.mutation_rate = rate;
        }
        if let Some(runs) = self.runs {
            config.runs_per_evaluation = runs;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = arg.trainer_config()?;
    let mut trainer = Trainer::new(config)?;
    let first_generation = trainer.generation();
    let last_generation = first_generation.saturating_add(arg.generations);
    let mut games = 0_u64;

    while trainer.generation() < last_generation {
        let generation = trainer.generation();
        eprintln!("Generation #{generation}:");
        loop {
            let weights = trainer.current_weights();
            let search = PlacementSearch::new(Box::new(HeuristicEvaluator::new(weights)));
            let seed = arg.seed.map(|s| s.wrapping_add(games));
            games += 1;
            let score = play_game(&search, seed, arg.turn_limit);

            match trainer.report_score(score) {
                ReportOutcome::RunRecorded { .. } => {}
                ReportOutcome::CandidateScored { candidate, fitness } => {
                    eprintln!("  {candidate:2}: {weights} => {fitness}");
                }
                ReportOutcome::GenerationAdvanced {
                    candidate,
                    fitness,
                    summary,
                } => {
                    eprintln!("  {candidate:2}: {weights} => {fitness}");
                    eprintln!("  Fitness Stats:");
                    eprintln!("    Min:    {}", summary.min);
                    eprintln!("    Median: {}", summary.median);
                    eprintln!("    Max:    {}", summary.max);
                    eprintln!("    Mean:   {:.1}", summary.mean);
                    eprintln!("    Stddev: {:.1}", summary.std_dev);
                    break;
                }
            }
        }
    }

    let Some(best) = trainer.best() else {
        anyhow::bail!("no candidate was scored");
    };
    eprintln!("Training completed.");

    let model = AiModel {
        name: format!("generation-{}", best.generation),
        trained_at: Utc::now(),
        generation: best.generation,
        fitness: best.fitness,
        weights: best.chromosome.weights(),
    };
    util::write_json(&model, arg.output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = &arg.output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", model.name);
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Fitness: {}", model.fitness);
    eprintln!("  Weights: {}", model.weights);

    Ok(())
}
