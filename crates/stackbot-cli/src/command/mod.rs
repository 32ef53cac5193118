use clap::{Parser, Subcommand};

use self::{auto_play::AutoPlayArg, play_headless::PlayHeadlessArg, train::TrainArg};

mod auto_play;
mod play_headless;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train placement weights with the genetic trainer
    Train(#[clap(flatten)] TrainArg),
    /// Play a live game driven by the search engine
    AutoPlay(#[clap(flatten)] AutoPlayArg),
    /// Play games without gravity and print score statistics
    PlayHeadless(#[clap(flatten)] PlayHeadlessArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::AutoPlay(arg) => auto_play::run(&arg)?,
        Mode::PlayHeadless(arg) => play_headless::run(&arg)?,
    }
    Ok(())
}
