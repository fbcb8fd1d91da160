use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use tokenizer::{LabeledSample, TrainingBatch, WordIndex, tokenize};
use tokio::{sync::mpsc, task};

use crate::{
    ModelArtifact,
    error::{ModelErr, Result},
    runtime::{EpochProgress, MlRuntime},
};

/// Lifecycle of one fine-tuning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Terminal result of a successful session.
#[derive(Debug)]
pub struct TrainingOutcome {
    /// Share of evaluation samples predicted correctly, in [0, 100].
    pub accuracy: f64,
    /// Final-epoch loss. A value of 0.0 means *unknown* when the runtime
    /// reported no loss metric, not a perfect fit (`LossUnknownDefaultsToZero`).
    pub loss: f64,
    pub artifact: ModelArtifact,
    /// Where the trained artifact was durably written.
    pub artifact_path: PathBuf,
}

/// Drives one fine-tuning run to its terminal state.
///
/// Created `Pending` by [`crate::ModelHandle::begin_update`]; `run` moves it
/// through `Running` into `Completed` or `Failed`. Progress events are a
/// best-effort side channel: a dropped or lagging observer never changes
/// the outcome.
pub struct TrainingSession {
    runtime: Arc<dyn MlRuntime>,
    base: PathBuf,
    batch: Option<TrainingBatch>,
    state: SessionState,
    progress_tx: mpsc::UnboundedSender<EpochProgress>,
    progress_rx: Option<mpsc::UnboundedReceiver<EpochProgress>>,
}

impl std::fmt::Debug for TrainingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingSession")
            .field("base", &self.base)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TrainingSession {
    pub(crate) fn new(runtime: Arc<dyn MlRuntime>, base: PathBuf, batch: TrainingBatch) -> Self {
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            base,
            batch: Some(batch),
            state: SessionState::Pending,
            progress_tx,
            progress_rx: Some(progress_rx),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Takes the progress receiver. Observation is optional; unobserved
    /// events are simply dropped when the session finishes.
    pub fn progress(&mut self) -> Option<mpsc::UnboundedReceiver<EpochProgress>> {
        self.progress_rx.take()
    }

    /// Runs the session to its terminal state.
    ///
    /// On runtime completion the *original* samples are re-predicted with
    /// the trained artifact (class 1 iff `p[1] > 0.5`) to compute accuracy,
    /// and the artifact is persisted to `save_to` before success is
    /// reported. Evaluation yielding zero usable results and persistence
    /// failures are distinct terminal errors.
    pub async fn run(
        &mut self,
        samples: &[LabeledSample],
        index: &WordIndex,
        save_to: &Path,
    ) -> Result<TrainingOutcome> {
        let batch = self
            .batch
            .take()
            .ok_or_else(|| ModelErr::TrainingError("session already consumed".to_string()))?;

        if batch.is_empty() {
            self.state = SessionState::Failed;
            return Err(ModelErr::TrainingError(
                "cannot train on an empty batch".to_string(),
            ));
        }

        self.state = SessionState::Running;
        debug!(samples = batch.len(); "training session running");

        // CPU-bound fine-tuning runs on the blocking pool; progress events
        // are forwarded into the side channel, send failures ignored.
        let runtime = Arc::clone(&self.runtime);
        let base = self.base.clone();
        let tx = self.progress_tx.clone();
        let report = task::spawn_blocking(move || {
            runtime.update(&base, &batch, &mut |progress| {
                let _ = tx.send(progress);
            })
        })
        .await
        .map_err(|e| ModelErr::TrainingError(format!("training task join error: {e}")))?;

        let report = match report {
            Ok(report) => report,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        let accuracy = match evaluate(&*self.runtime, &report.artifact, samples, index) {
            Ok(accuracy) => accuracy,
            Err(e) => {
                self.state = SessionState::Failed;
                return Err(e);
            }
        };

        let loss = report.final_loss.unwrap_or(0.0);

        // Success is reported only once the artifact is durably written.
        if let Err(source) = fs::write(save_to, report.artifact.bytes()) {
            self.state = SessionState::Failed;
            return Err(ModelErr::Save {
                path: save_to.to_path_buf(),
                source,
            });
        }

        self.state = SessionState::Completed;
        debug!(accuracy = accuracy, loss = loss; "training session completed");

        Ok(TrainingOutcome {
            accuracy,
            loss,
            artifact: report.artifact,
            artifact_path: save_to.to_path_buf(),
        })
    }
}

/// Re-predicts every original sample with the trained artifact.
///
/// Samples whose prediction fails are skipped; zero usable results is an
/// error, never a division by zero.
fn evaluate(
    runtime: &dyn MlRuntime,
    artifact: &ModelArtifact,
    samples: &[LabeledSample],
    index: &WordIndex,
) -> Result<f64> {
    let mut correct = 0usize;
    let mut total = 0usize;

    for sample in samples {
        let tokens = tokenize(&sample.text, index);
        match runtime.predict(artifact, &tokens) {
            Ok(probs) => {
                let predicted = if probs[1] > 0.5 { 1 } else { 0 };
                if predicted == sample.label {
                    correct += 1;
                }
                total += 1;
            }
            Err(e) => warn!("evaluation prediction skipped: {e}"),
        }
    }

    if total == 0 {
        return Err(ModelErr::NoEvaluations);
    }

    Ok(correct as f64 / total as f64 * 100.0)
}
