//! Genetic training of the placement heuristic weights.
//!
//! A [`Trainer`](genetic::Trainer) holds a population of
//! [`Chromosome`](chromosome::Chromosome)s, each a full set of heuristic
//! weights. The caller plays games with [`Trainer::current_weights`] and
//! reports each final score back; the trainer averages several runs per
//! candidate and, once every candidate has a fitness, breeds the next
//! generation:
//!
//! ```text
//! current_weights() ──▶ play a game ──▶ report_score()
//!        ▲                                   │
//!        └── next candidate / next generation┘
//! ```
//!
//! Selection keeps half of the population (top half by fitness, or the winner
//! of each head-to-head pair). Winners are paired up and every pair has four
//! children by crossover, parent averaging or per-gene coin flips. Every
//! child gene may then mutate by an additive random offset.
//!
//! [`Trainer::current_weights`]: genetic::Trainer::current_weights

pub mod chromosome;
pub mod config;
pub mod genetic;
pub mod persistence;
pub mod summary;
