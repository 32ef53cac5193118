use std::{
    path::PathBuf,
    sync::{Mutex, PoisonError},
    thread,
    time::Duration,
};

use stackbot_engine::GameSession;
use stackbot_search::{
    driver::{AutoPlayer, CancelToken, DriverConfig},
    heuristic::HeuristicEvaluator,
    search::PlacementSearch,
};

use crate::model;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AutoPlayArg {
    /// Model file written by `train`; the built-in weights when omitted
    model: Option<PathBuf>,
    /// Frames per second of the gravity loop
    #[arg(long, default_value_t = 60)]
    fps: u64,
    /// Milliseconds to wait after every action
    #[arg(long, default_value_t = 2)]
    action_delay_ms: u64,
    /// Stop after this many pieces
    #[arg(long)]
    max_pieces: Option<usize>,
    /// Seed of the piece sequence
    #[arg(long)]
    seed: Option<u64>,
}

pub(crate) fn run(arg: &AutoPlayArg) -> anyhow::Result<()> {
    let weights = model::load_weights(arg.model.as_deref())?;
    eprintln!("Weights: {weights}");

    let fps = arg.fps.max(1);
    let session = match arg.seed {
        Some(seed) => GameSession::with_seed(fps, seed),
        None => GameSession::new(fps),
    };
    let board = Mutex::new(session);
    let cancel = CancelToken::new();
    let config = DriverConfig {
        action_delay: Duration::from_millis(arg.action_delay_ms),
        ..DriverConfig::default()
    };
    let player = AutoPlayer::new(
        PlacementSearch::new(Box::new(HeuristicEvaluator::new(weights))),
        config,
        cancel.clone(),
    )
    .with_max_pieces(arg.max_pieces);

    let summary = thread::scope(|s| {
        s.spawn(|| run_gravity(&board, fps, &cancel));
        let summary = player.run(&board);
        cancel.cancel();
        summary
    });

    let session = board.into_inner().unwrap_or_else(PoisonError::into_inner);
    let stats = session.stats();
    eprintln!("Auto play finished ({:?}).", session.session_state());
    eprintln!("  Pieces: {}", summary.pieces);
    eprintln!("  Forced drops: {}", summary.forced_drops);
    eprintln!("  Score: {}", stats.score());
    eprintln!("  Level: {}", stats.level());
    eprintln!("  Lines: {}", stats.total_cleared_lines());
    eprintln!("  Duration: {:.1?}", session.duration());
    eprintln!("{}", session.grid());
    Ok(())
}

/// Advances the game clock once per frame until the token is cancelled or
/// the game ends.
fn run_gravity(board: &Mutex<GameSession>, fps: u64, cancel: &CancelToken) {
    let frame = Duration::from_secs(1) / u32::try_from(fps).unwrap_or(u32::MAX);
    while !cancel.is_cancelled() {
        {
            let mut session = board.lock().unwrap_or_else(PoisonError::into_inner);
            session.increment_frame();
            if session.session_state().is_game_over() {
                log::info!("game over after {} pieces", session.stats().completed_pieces());
                cancel.cancel();
                break;
            }
        }
        thread::sleep(frame);
    }
}
