//! Persisted populations.
//!
//! A model is stored as one pretty-printed JSON file, `<name>.json`, inside
//! the model directory. The file holds the survivors of the latest generation,
//! best first:
//!
//! ```json
//! [
//!   {
//!     "fitness": 12.5,
//!     "trained_at": "2026-01-01T12:00:00Z",
//!     "layers": [
//!       { "weights": [[...6 values], ...5 rows], "biases": [...6 values] },
//!       { "weights": [[...6 values], ...6 rows], "biases": [...6 values] },
//!       { "weights": [[...3 values], ...6 rows], "biases": [...3 values] }
//!     ]
//!   }
//! ]
//! ```
//!
//! Weight matrices are stored as nested rows: `weights[i][j]` connects input
//! `i` to output `j`. Floats are written with enough digits to read back
//! bit-for-bit.
//!
//! Files are written to a temporary sibling first and then renamed over the
//! target, so a failed save leaves the previous artifact intact.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use pongevo_engine::Action;
use pongevo_evaluator::network::{
    DenseLayer, HIDDEN_SIZE, NeuralNetwork, OUTPUT_SIZE, ShapeError,
};
use serde::{Deserialize, Serialize};

use crate::genetic::Agent;

/// One dense layer in the artifact format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

/// One agent in the artifact format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub fitness: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
    pub layers: Vec<LayerRecord>,
}

impl AgentRecord {
    #[must_use]
    pub fn from_agent(agent: &Agent, trained_at: Option<DateTime<Utc>>) -> Self {
        let layers = agent
            .network()
            .layers()
            .into_iter()
            .map(|layer| LayerRecord {
                weights: layer.rows().map(<[f64]>::to_vec).collect(),
                biases: layer.biases.to_vec(),
            })
            .collect();
        Self {
            fitness: agent.fitness(),
            trained_at,
            layers,
        }
    }

    /// The record served when no trained model is available.
    ///
    /// All weights are zero and only the [`Action::Hold`] output has a bias,
    /// so the paddle never moves.
    #[must_use]
    pub fn fallback() -> Self {
        let mut biases = [0.0; OUTPUT_SIZE];
        biases[Action::Hold as usize] = 1.0;
        let network = NeuralNetwork::new(
            DenseLayer::zeros(),
            DenseLayer::zeros(),
            DenseLayer::new([[0.0; OUTPUT_SIZE]; HIDDEN_SIZE], biases),
        );
        Self::from_agent(&Agent::new(network, 0.0), None)
    }

    pub fn to_network(&self) -> Result<NeuralNetwork, ShapeError> {
        let layers = self
            .layers
            .iter()
            .map(|layer| (layer.weights.as_slice(), layer.biases.as_slice()))
            .collect::<Vec<_>>();
        NeuralNetwork::from_layers(&layers)
    }

    pub fn to_agent(&self) -> Result<Agent, ShapeError> {
        Ok(Agent::new(self.to_network()?, self.fitness))
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DeserializationError {
    #[display("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[display("malformed artifact {}", path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("agent #{index} in {} has the wrong shape", path.display())]
    Shape {
        path: PathBuf,
        index: usize,
        source: ShapeError,
    },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PersistenceError {
    #[display("failed to create model directory {}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[display("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[display("failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Reads an artifact file.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn read_records(path: &Path) -> Result<Option<Vec<AgentRecord>>, DeserializationError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DeserializationError::Read {
                path: path.to_owned(),
                source,
            });
        }
    };
    serde_json::from_reader(BufReader::new(file))
        .map(Some)
        .map_err(|source| DeserializationError::Malformed {
            path: path.to_owned(),
            source,
        })
}

/// Writes `records` to `path`, replacing any previous file.
///
/// The temporary sibling is removed if any step fails.
pub fn write_records(path: &Path, records: &[AgentRecord]) -> Result<(), PersistenceError> {
    let tmp_path = path.with_extension("json.tmp");
    let result = write_then_rename(&tmp_path, path, records);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_then_rename(
    tmp_path: &Path,
    path: &Path,
    records: &[AgentRecord],
) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_owned(),
        source,
    };

    let file = File::create(tmp_path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| {
        PersistenceError::Encode {
            path: path.to_owned(),
            source,
        }
    })?;
    writeln!(writer).map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    drop(writer);
    fs::rename(tmp_path, path).map_err(write_err)?;
    Ok(())
}

/// Directory of named model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Loads the agents of model `name`, best first.
    ///
    /// Returns `Ok(None)` if the model has never been saved.
    pub fn load(&self, name: &str) -> Result<Option<Vec<Agent>>, DeserializationError> {
        let path = self.path(name);
        let Some(records) = read_records(&path)? else {
            return Ok(None);
        };
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .to_agent()
                    .map_err(|source| DeserializationError::Shape {
                        path: path.clone(),
                        index,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Saves `agents` as model `name`, stamped with `trained_at`.
    pub fn save(
        &self,
        name: &str,
        agents: &[Agent],
        trained_at: DateTime<Utc>,
    ) -> Result<PathBuf, PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path(name);
        let records = agents
            .iter()
            .map(|agent| AgentRecord::from_agent(agent, Some(trained_at)))
            .collect::<Vec<_>>();
        write_records(&path, &records)?;
        Ok(path)
    }

    /// Returns the best stored agent of model `name`.
    ///
    /// Falls back to [`AgentRecord::fallback`] when the model is missing,
    /// empty or unreadable, or when its best record has the wrong shape.
    #[must_use]
    pub fn best_agent(&self, name: &str) -> AgentRecord {
        let path = self.path(name);
        match read_records(&path) {
            Ok(Some(records)) => {
                match records.into_iter().next() {
                    Some(best) => match best.to_network() {
                        Ok(_) => return best,
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "best agent has the wrong shape, using fallback"
                        ),
                    },
                    None => {
                        tracing::warn!(path = %path.display(), "model has no agents, using fallback");
                    }
                }
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "model not found, using fallback");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "model unreadable, using fallback");
            }
        }
        AgentRecord::fallback()
    }
}

#[cfg(test)]
mod tests {
    use pongevo_evaluator::network::INPUT_SIZE;
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::genetic::Population;

    fn sample_agents() -> Vec<Agent> {
        let mut rng = Pcg32::seed_from_u64(21);
        let mut population = Population::random(4, &mut rng);
        for (ordinal, fitness) in [(0, 7.25), (1, 3.0), (2, 0.1), (3, -1.0)] {
            population.record_fitness(ordinal, fitness);
        }
        population.agents().to_vec()
    }

    #[test]
    fn test_round_trip_is_bit_exact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let agents = sample_agents();
        let trained_at = Utc::now();

        let path = store.save("model", &agents, trained_at).unwrap();
        assert_eq!(path, dir.path().join("model.json"));

        let loaded = store.load("model").unwrap().unwrap();
        assert_eq!(loaded.len(), agents.len());
        for (a, b) in loaded.iter().zip(&agents) {
            assert_eq!(a.fitness().to_bits(), b.fitness().to_bits());
            for (la, lb) in a.network().layers().into_iter().zip(b.network().layers()) {
                for (x, y) in la.weights.iter().chain(la.biases).zip(lb.weights.iter().chain(lb.biases)) {
                    assert_eq!(x.to_bits(), y.to_bits());
                }
            }
        }
    }

    #[test]
    fn test_record_layout_is_nested_rows() {
        let record = AgentRecord::from_agent(&sample_agents()[0], None);
        let shapes = record
            .layers
            .iter()
            .map(|l| (l.weights.len(), l.weights[0].len(), l.biases.len()))
            .collect::<Vec<_>>();
        assert_eq!(shapes, [(INPUT_SIZE, 6, 6), (6, 6, 6), (6, OUTPUT_SIZE, OUTPUT_SIZE)]);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("trained_at").is_none());
        assert_eq!(json["fitness"], 7.25);
    }

    #[test]
    fn test_missing_model_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("not-yet-created"));
        assert!(store.load("model").unwrap().is_none());
    }

    #[test]
    fn test_truncated_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save("model", &sample_agents(), Utc::now()).unwrap();

        let path = store.path("model");
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, &text[..text.len() / 2]).unwrap();

        let err = store.load("model").unwrap_err();
        assert!(matches!(err, DeserializationError::Malformed { .. }), "{err}");
    }

    #[test]
    fn test_wrong_shape_is_reported_with_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut records = sample_agents()
            .iter()
            .map(|a| AgentRecord::from_agent(a, None))
            .collect::<Vec<_>>();
        records[1].layers[2].biases.pop();
        write_records(&store.path("model"), &records).unwrap();

        let err = store.load("model").unwrap_err();
        assert!(matches!(err, DeserializationError::Shape { index: 1, .. }), "{err}");
    }

    #[test]
    fn test_unwritable_directory_fails_to_save() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("models");
        fs::write(&blocker, "not a directory").unwrap();
        let store = ArtifactStore::new(&blocker);

        let err = store.save("model", &sample_agents(), Utc::now()).unwrap_err();
        assert!(matches!(err, PersistenceError::CreateDir { .. }), "{err}");
    }

    #[test]
    fn test_best_agent_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(store.best_agent("missing"), AgentRecord::fallback());

        fs::write(store.path("broken"), "[{").unwrap();
        assert_eq!(store.best_agent("broken"), AgentRecord::fallback());

        write_records(&store.path("empty"), &[]).unwrap();
        assert_eq!(store.best_agent("empty"), AgentRecord::fallback());
    }

    #[test]
    fn test_best_agent_with_wrong_shape_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let mut record = AgentRecord::from_agent(&sample_agents()[0], None);
        record.fitness = 42.0;
        record.layers.pop();
        write_records(&store.path("model"), &[record]).unwrap();

        assert_eq!(store.best_agent("model"), AgentRecord::fallback());
    }

    #[test]
    fn test_failed_write_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        // A non-empty directory at the target path makes the final rename fail.
        let path = store.path("model");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();

        let err = store.save("model", &sample_agents(), Utc::now()).unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }), "{err}");
        assert!(!dir.path().join("model.json.tmp").exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn test_best_agent_is_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let agents = sample_agents();
        store.save("model", &agents, Utc::now()).unwrap();

        let best = store.best_agent("model");
        assert_eq!(best.fitness, 7.25);
        assert_eq!(best.to_network().unwrap(), *agents[0].network());
    }

    #[test]
    fn test_fallback_holds() {
        let network = AgentRecord::fallback().to_network().unwrap();
        assert_eq!(network.decide(&[0.3, 0.9, -8.0, 2.0, 0.5]), Some(Action::Hold));
    }
}
