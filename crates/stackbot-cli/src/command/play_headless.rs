use std::path::PathBuf;

use stackbot_engine::GameSession;
use stackbot_search::{heuristic::HeuristicEvaluator, search::PlacementSearch};
use stackbot_training::summary::GenerationSummary;

use crate::model;

/// Headless games have no gravity; the frame rate only sets their clock.
pub(crate) const HEADLESS_FPS: u64 = 60;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayHeadlessArg {
    /// Model file written by `train`; the built-in weights when omitted
    model: Option<PathBuf>,
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Pieces placed before a game is stopped
    #[arg(long, default_value_t = 500)]
    turn_limit: usize,
    /// Seed of the first game; later games use the following seeds
    #[arg(long)]
    seed: Option<u64>,
}

/// Plays one game without gravity and returns its final score.
pub(crate) fn play_game(search: &PlacementSearch<'_>, seed: Option<u64>, turn_limit: usize) -> i64 {
    let mut session = match seed {
        Some(seed) => GameSession::with_seed(HEADLESS_FPS, seed),
        None => GameSession::new(HEADLESS_FPS),
    };
    let turns = search.play_session(&mut session, turn_limit);
    let stats = session.stats();
    log::debug!(
        "game finished after {turns} pieces: score {} lines {}",
        stats.score(),
        stats.total_cleared_lines()
    );
    i64::try_from(stats.score()).unwrap_or(i64::MAX)
}

pub(crate) fn run(arg: &PlayHeadlessArg) -> anyhow::Result<()> {
    let PlayHeadlessArg {
        model,
        games,
        turn_limit,
        seed,
    } = arg;
    let weights = model::load_weights(model.as_deref())?;
    eprintln!("Weights: {weights}");
    let search = PlacementSearch::new(Box::new(HeuristicEvaluator::new(weights)));

    let mut scores = Vec::with_capacity(*games);
    for (game, offset) in (0..*games).zip(0_u64..) {
        let seed = seed.map(|s| s.wrapping_add(offset));
        let score = play_game(&search, seed, *turn_limit);
        eprintln!("  Game {:3}: {score}", game + 1);
        scores.push(score);
    }

    if let Some(summary) = GenerationSummary::new(0, &scores) {
        let GenerationSummary {
            min,
            median,
            max,
            mean,
            std_dev,
            ..
        } = summary;
        eprintln!("Score Stats ({games} games):");
        eprintln!("  Min:    {min}");
        eprintln!("  Median: {median}");
        eprintln!("  Max:    {max}");
        eprintln!("  Mean:   {mean:.1}");
        eprintln!("  Stddev: {std_dev:.1}");
    }
    Ok(())
}
