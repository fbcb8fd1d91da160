use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;
use serde::{Deserialize, Serialize};
use tokenizer::{TokenSequence, TrainingBatch};

use crate::{
    ModelArtifact,
    error::{ModelErr, Result},
    runtime::{EpochProgress, MlRuntime, UpdateReport},
};

/// Vocabulary cap of the original training pipeline.
const VOCAB_SIZE: usize = 10_000;
const EPOCHS: usize = 5;
const LEARNING_RATE: f64 = 0.5;

/// Serialized weight state — the artifact format this runtime exchanges
/// with the server.
#[derive(Serialize, Deserialize)]
struct SentimentWeights {
    vocab: usize,
    weights: Vec<f32>,
    bias: f32,
}

impl SentimentWeights {
    fn zeroed(vocab: usize) -> Self {
        Self {
            vocab,
            weights: vec![0.0; vocab],
            bias: 0.0,
        }
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, String> {
        let parsed: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if parsed.weights.len() != parsed.vocab {
            return Err(format!(
                "weight count {} does not match vocab {}",
                parsed.weights.len(),
                parsed.vocab
            ));
        }
        Ok(parsed)
    }

    fn encode(&self) -> Vec<u8> {
        // Serialization of plain numeric fields cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Positive-class probability for one encoded input.
    fn score(&self, tokens: &TokenSequence) -> f64 {
        let mut z = f64::from(self.bias);
        for &id in tokens.iter().filter(|&&id| id > 0) {
            let id = id as usize;
            if id < self.vocab {
                z += f64::from(self.weights[id]);
            }
        }
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Self-contained reference implementation of [`MlRuntime`]: logistic
/// regression over a bag-of-tokens vector, trained with SGD and binary
/// cross-entropy. Lets the client run end to end without an external ML
/// engine.
pub struct LocalRuntime {
    default_path: PathBuf,
}

impl LocalRuntime {
    pub fn new(default_path: impl Into<PathBuf>) -> Self {
        Self {
            default_path: default_path.into(),
        }
    }

    /// Writes a fresh zero-weight artifact, used to seed a device that has
    /// no bundled model yet.
    pub fn write_fresh(path: &Path) -> Result<()> {
        fs::write(path, SentimentWeights::zeroed(VOCAB_SIZE).encode()).map_err(|source| {
            ModelErr::Save {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl MlRuntime for LocalRuntime {
    fn load_default(&self) -> Result<ModelArtifact> {
        self.load(&self.default_path)
    }

    fn predict(&self, artifact: &ModelArtifact, tokens: &TokenSequence) -> Result<[f64; 2]> {
        let state = SentimentWeights::decode(artifact.bytes()).map_err(ModelErr::Prediction)?;
        let p1 = state.score(tokens);
        Ok([1.0 - p1, p1])
    }

    fn update(
        &self,
        base: &Path,
        batch: &TrainingBatch,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<UpdateReport> {
        let raw = fs::read(base).map_err(|_| ModelErr::NotFound(base.to_path_buf()))?;
        let mut state = SentimentWeights::decode(&raw).map_err(ModelErr::TrainingFailed)?;

        let mut final_loss = None;
        for epoch in 0..EPOCHS {
            let mut loss_sum = 0.0;

            for entry in &batch.entries {
                let y = if entry.label == 1 { 1.0 } else { 0.0 };
                let p = state.score(&entry.tokens);
                let grad = p - y;

                for &id in entry.tokens.iter().filter(|&&id| id > 0) {
                    let id = id as usize;
                    if id < state.vocab {
                        state.weights[id] -= (LEARNING_RATE * grad) as f32;
                    }
                }
                state.bias -= (LEARNING_RATE * grad) as f32;

                // Binary cross-entropy, clamped away from log(0).
                let p = p.clamp(1e-7, 1.0 - 1e-7);
                loss_sum += -(y * p.ln() + (1.0 - y) * (1.0 - p).ln());
            }

            let loss = loss_sum / batch.len() as f64;
            debug!(epoch = epoch, loss = loss; "local runtime epoch");
            on_epoch(EpochProgress { epoch, loss });
            final_loss = Some(loss);
        }

        Ok(UpdateReport {
            artifact: ModelArtifact::new(state.encode()),
            final_loss,
        })
    }

    fn compile(&self, raw: &Path) -> Result<PathBuf> {
        let bytes = fs::read(raw).map_err(|e| ModelErr::Compile(e.to_string()))?;
        let state = SentimentWeights::decode(&bytes).map_err(ModelErr::Compile)?;

        let compiled = raw.with_extension("compiled.json");
        fs::write(&compiled, state.encode()).map_err(|e| ModelErr::Compile(e.to_string()))?;
        Ok(compiled)
    }

    fn load(&self, compiled: &Path) -> Result<ModelArtifact> {
        let bytes = fs::read(compiled).map_err(|_| ModelErr::NotFound(compiled.to_path_buf()))?;
        SentimentWeights::decode(&bytes).map_err(ModelErr::Prediction)?;
        Ok(ModelArtifact::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenizer::{LabeledSample, WordIndex, build_batch};

    fn word_index() -> WordIndex {
        let map = [("great", 5), ("love", 6), ("terrible", 9), ("awful", 10)]
            .into_iter()
            .map(|(w, id)| (w.to_string(), id))
            .collect();
        WordIndex::from_map(map)
    }

    fn samples() -> Vec<LabeledSample> {
        vec![
            LabeledSample {
                text: "great love".into(),
                label: 1,
            },
            LabeledSample {
                text: "terrible awful".into(),
                label: 0,
            },
        ]
    }

    #[test]
    fn separates_disjoint_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        LocalRuntime::write_fresh(&base).unwrap();

        let runtime = LocalRuntime::new(&base);
        let index = word_index();
        let batch = build_batch(&samples(), &index);

        let mut epochs = Vec::new();
        let report = runtime
            .update(&base, &batch, &mut |p| epochs.push(p))
            .unwrap();

        assert_eq!(epochs.len(), EPOCHS);
        assert!(report.final_loss.is_some());

        let positive = tokenizer::tokenize("great love", &index);
        let negative = tokenizer::tokenize("terrible awful", &index);
        let p_pos = runtime.predict(&report.artifact, &positive).unwrap();
        let p_neg = runtime.predict(&report.artifact, &negative).unwrap();

        assert!(p_pos[1] > 0.5, "positive sample scored {}", p_pos[1]);
        assert!(p_neg[1] < 0.5, "negative sample scored {}", p_neg[1]);
    }

    #[test]
    fn epoch_losses_decrease() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        LocalRuntime::write_fresh(&base).unwrap();

        let runtime = LocalRuntime::new(&base);
        let index = word_index();
        let batch = build_batch(&samples(), &index);

        let mut losses = Vec::new();
        runtime
            .update(&base, &batch, &mut |p| losses.push(p.loss))
            .unwrap();

        assert!(losses.last().unwrap() < losses.first().unwrap());
    }

    #[test]
    fn compile_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("downloaded.bin");
        fs::write(&raw, SentimentWeights::zeroed(16).encode()).unwrap();

        let runtime = LocalRuntime::new(dir.path().join("unused.json"));
        let compiled = runtime.compile(&raw).unwrap();
        let artifact = runtime.load(&compiled).unwrap();

        let decoded = SentimentWeights::decode(artifact.bytes()).unwrap();
        assert_eq!(decoded.vocab, 16);
    }

    #[test]
    fn compile_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("garbage.bin");
        fs::write(&raw, b"not a model").unwrap();

        let runtime = LocalRuntime::new(dir.path().join("unused.json"));
        assert!(matches!(
            runtime.compile(&raw),
            Err(ModelErr::Compile(_))
        ));
    }

    #[test]
    fn missing_default_is_not_found() {
        let runtime = LocalRuntime::new("/nonexistent/model.json");
        assert!(matches!(
            runtime.load_default(),
            Err(ModelErr::NotFound(_))
        ));
    }
}
