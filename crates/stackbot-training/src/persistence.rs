//! Loading and saving populations.
//!
//! Two formats are supported:
//!
//! - a generation file, JSON of the form
//!   `{"generation": 4, "chromosomes": [[g0, ..., g6], ...]}`
//! - a preset table, plain text with one chromosome per line as seven
//!   comma-separated numbers; blank lines are ignored
//!
//! Both must hold exactly the configured number of chromosomes. I/O
//! failures and bad content are distinguished so the trainer can fall back
//! on the former and stop on the latter.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::chromosome::{Chromosome, GENE_COUNT};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationFile {
    pub generation: u32,
    pub chromosomes: Vec<Chromosome>,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum PersistenceError {
    #[display("cannot access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed generation file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("malformed preset line {line}: {reason}")]
    Preset { line: usize, reason: String },
    #[display("expected {expected} chromosomes, found {found}")]
    PopulationMismatch { expected: usize, found: usize },
    #[display("chromosome {index} has a non-finite gene")]
    NonFinite { index: usize },
}

/// Reads a generation file holding exactly `population_size` chromosomes.
pub fn load_generation(
    path: &Path,
    population_size: usize,
) -> Result<GenerationFile, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_owned(),
        source,
    })?;
    let file: GenerationFile =
        serde_json::from_str(&text).map_err(|source| PersistenceError::Json {
            path: path.to_owned(),
            source,
        })?;
    check_population(&file.chromosomes, population_size)?;
    Ok(file)
}

pub fn save_generation(path: &Path, file: &GenerationFile) -> Result<(), PersistenceError> {
    let io_error = |source| PersistenceError::Io {
        path: path.to_owned(),
        source,
    };
    let json = serde_json::to_string_pretty(file).map_err(|source| PersistenceError::Json {
        path: path.to_owned(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, json).map_err(io_error)
}

/// Reads a preset table holding exactly `population_size` chromosomes.
pub fn load_preset(
    path: &Path,
    population_size: usize,
) -> Result<Vec<Chromosome>, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_owned(),
        source,
    })?;
    parse_preset(&text, population_size)
}

pub fn parse_preset(
    text: &str,
    population_size: usize,
) -> Result<Vec<Chromosome>, PersistenceError> {
    let chromosomes = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_preset_line(i + 1, line))
        .collect::<Result<Vec<_>, _>>()?;
    check_population(&chromosomes, population_size)?;
    Ok(chromosomes)
}

fn parse_preset_line(line: usize, text: &str) -> Result<Chromosome, PersistenceError> {
    let invalid = |reason: String| PersistenceError::Preset { line, reason };
    let values = text
        .split(',')
        .map(|field| {
            let field = field.trim();
            field
                .parse::<f64>()
                .map_err(|e| invalid(format!("{field:?} is not a number ({e})")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let genes: [f64; GENE_COUNT] = values.as_slice().try_into().map_err(|_| {
        invalid(format!(
            "expected {GENE_COUNT} values, found {}",
            values.len()
        ))
    })?;
    Ok(Chromosome::new(genes))
}

fn check_population(
    chromosomes: &[Chromosome],
    population_size: usize,
) -> Result<(), PersistenceError> {
    if chromosomes.len() != population_size {
        return Err(PersistenceError::PopulationMismatch {
            expected: population_size,
            found: chromosomes.len(),
        });
    }
    if let Some(index) = chromosomes
        .iter()
        .position(|c| !c.genes().iter().all(|g| g.is_finite()))
    {
        return Err(PersistenceError::NonFinite { index });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        env,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    /// A path under the system temp directory unique to this test process.
    pub(crate) fn temp_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        env::temp_dir().join(format!(
            "stackbot-training-{}-{n}-{name}",
            std::process::id()
        ))
    }

    pub(crate) fn preset_text(rows: usize) -> String {
        (0..rows)
            .map(|i| format!("{i}, 1, 2, 3, 4, 5, 6.5\n"))
            .collect()
    }

    #[test]
    fn test_parse_preset() {
        let text = format!("\n{}\n\n", preset_text(4));
        let chromosomes = parse_preset(&text, 4).unwrap();
        assert_eq!(chromosomes.len(), 4);
        assert_eq!(
            chromosomes[3].genes(),
            &[3.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.5]
        );
    }

    #[test]
    fn test_parse_preset_rejects_bad_content() {
        assert!(matches!(
            parse_preset(&preset_text(3), 4),
            Err(PersistenceError::PopulationMismatch {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            parse_preset("1,2,3,4,5,6\n", 1),
            Err(PersistenceError::Preset { line: 1, .. })
        ));
        assert!(matches!(
            parse_preset("1,2,3\n\n1,2,x,4,5,6,7\n", 2),
            Err(PersistenceError::Preset { line: 1, .. })
        ));
        assert!(matches!(
            parse_preset("1,2,3,4,5,6,7\n1,2,x,4,5,6,7\n", 2),
            Err(PersistenceError::Preset { line: 2, .. })
        ));
        assert!(matches!(
            parse_preset("1,2,3,4,5,6,NaN\n", 1),
            Err(PersistenceError::NonFinite { index: 0 })
        ));
    }

    #[test]
    fn test_generation_file_roundtrip() {
        let path = temp_path("generation.json");
        let file = GenerationFile {
            generation: 5,
            chromosomes: vec![Chromosome::new([0.5; GENE_COUNT]); 4],
        };
        save_generation(&path, &file).unwrap();
        assert_eq!(load_generation(&path, 4).unwrap(), file);
        assert!(matches!(
            load_generation(&path, 8),
            Err(PersistenceError::PopulationMismatch { .. })
        ));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_generation_file_keeps_genes_exact() {
        let path = temp_path("exact.json");
        let genes = [
            -1.317_932_776_922_892_1,
            0.1 + 0.2,
            4.999_999_999_999_999,
            -3.141_592_653_589_793,
            1e-300,
            2.718_281_828_459_045,
            -0.000_123_456_789,
        ];
        let file = GenerationFile {
            generation: 3,
            chromosomes: vec![Chromosome::new(genes)],
        };
        save_generation(&path, &file).unwrap();
        let loaded = load_generation(&path, 1).unwrap();
        let bits = |c: &Chromosome| c.genes().map(f64::to_bits);
        assert_eq!(bits(&loaded.chromosomes[0]), bits(&file.chromosomes[0]));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_generation_file_format() {
        let json = r#"{"generation": 2, "chromosomes": [[1, 2, 3, 4, 5, 6, 7]]}"#;
        let file: GenerationFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.generation, 2);
        assert_eq!(file.chromosomes[0].genes()[6], 7.0);
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let missing = temp_path("missing.json");
        let err = load_generation(&missing, 4).unwrap_err();
        assert!(err.is_io());

        let corrupt = temp_path("corrupt.json");
        fs::write(&corrupt, "{not json").unwrap();
        let err = load_generation(&corrupt, 4).unwrap_err();
        assert!(err.is_json());
        fs::remove_file(&corrupt).unwrap();

        assert!(load_preset(&missing, 4).unwrap_err().is_io());
    }
}
