use serde_json::Value;

use crate::{TokenSequence, WordIndex, tokenize};

/// One user-supplied training example that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub text: String,
    pub label: i64,
}

impl LabeledSample {
    /// Extracts a sample from a raw bridge value.
    ///
    /// Policy (`SkipInvalidSamples`, carried from the original client):
    /// `text` must be a JSON string and `label` a JSON integer; anything
    /// else returns `None` and the sample is dropped without an error.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = value.get("text")?.as_str()?;
        let label = value.get("label")?.as_i64()?;
        Some(Self {
            text: text.to_string(),
            label,
        })
    }
}

/// One tokenized, labeled entry of a [`TrainingBatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub tokens: TokenSequence,
    pub label: i64,
}

/// The ordered set of tokenized examples fed to one training session.
#[derive(Debug, Clone, Default)]
pub struct TrainingBatch {
    pub entries: Vec<BatchEntry>,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds a batch from validated samples, one entry per sample, order
/// preserved.
///
/// An empty output is possible (empty input); callers that cannot tolerate
/// an empty batch must check before starting a session.
pub fn build_batch(samples: &[LabeledSample], index: &WordIndex) -> TrainingBatch {
    let entries = samples
        .iter()
        .map(|sample| BatchEntry {
            tokens: tokenize(&sample.text, index),
            label: sample.label,
        })
        .collect();

    TrainingBatch { entries }
}
