use std::path::{Path, PathBuf};

use tokenizer::{TokenSequence, TrainingBatch};

use crate::{ModelArtifact, error::Result};

/// Per-epoch training progress, delivered best-effort while a session runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochProgress {
    pub epoch: usize,
    pub loss: f64,
}

/// What a completed fine-tuning run hands back.
#[derive(Debug)]
pub struct UpdateReport {
    pub artifact: ModelArtifact,
    /// Loss of the final epoch, when the runtime reported one.
    pub final_loss: Option<f64>,
}

/// The on-device ML engine collaborator.
///
/// `update` is synchronous and CPU-bound; the training session runs it on
/// the blocking pool. Implementations must be shareable across tasks.
pub trait MlRuntime: Send + Sync + 'static {
    /// Loads the bundled default artifact.
    fn load_default(&self) -> Result<ModelArtifact>;

    /// Two-class probability distribution for one encoded input.
    fn predict(&self, artifact: &ModelArtifact, tokens: &TokenSequence) -> Result<[f64; 2]>;

    /// Fine-tunes the artifact at `base` on `batch`, reporting each epoch
    /// through `on_epoch`.
    fn update(
        &self,
        base: &Path,
        batch: &TrainingBatch,
        on_epoch: &mut dyn FnMut(EpochProgress),
    ) -> Result<UpdateReport>;

    /// Compiles raw downloaded bytes at `raw` into a runnable form,
    /// returning its location.
    fn compile(&self, raw: &Path) -> Result<PathBuf>;

    /// Loads a compiled artifact from disk.
    fn load(&self, compiled: &Path) -> Result<ModelArtifact>;
}
