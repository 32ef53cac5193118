use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackbot_search::heuristic::Weights;

use crate::util;

/// Trained weights as written by `stackbot train`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    /// Generation the weights were scored in.
    pub generation: u32,
    pub fitness: i64,
    pub weights: Weights,
}

impl AiModel {
    pub fn open<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        util::read_json_file("AI model", path)
    }
}

/// Weights of the model at `path`, or the built-in defaults.
pub fn load_weights(path: Option<&Path>) -> anyhow::Result<Weights> {
    let Some(path) = path else {
        return Ok(Weights::default());
    };
    let model = AiModel::open(path)?;
    eprintln!(
        "Loaded model {:?} (generation {}, fitness {})",
        model.name, model.generation, model.fitness
    );
    Ok(model.weights)
}
