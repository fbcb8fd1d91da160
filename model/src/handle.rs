use std::{path::Path, sync::Arc};

use log::info;
use parking_lot::RwLock;
use tokenizer::{TokenSequence, TrainingBatch};

use crate::{
    ModelArtifact,
    error::{ModelErr, Result},
    runtime::MlRuntime,
    session::TrainingSession,
};

/// Owns the process-wide current model artifact.
///
/// Exactly one handle exists per process. Readers clone the artifact `Arc`
/// under a read lock and evaluate outside it, so `replace` never tears an
/// in-flight prediction; writers are serialized by the write lock.
pub struct ModelHandle {
    runtime: Arc<dyn MlRuntime>,
    current: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelHandle {
    pub fn new(runtime: Arc<dyn MlRuntime>) -> Self {
        Self {
            runtime,
            current: RwLock::new(None),
        }
    }

    /// Loads the bundled default artifact into the slot. Called once at
    /// process start; a failure leaves the handle empty.
    pub fn load_default(&self) -> Result<()> {
        let artifact = self.runtime.load_default()?;
        self.replace(artifact);
        Ok(())
    }

    /// The currently active artifact, if any.
    pub fn current(&self) -> Option<Arc<ModelArtifact>> {
        self.current.read().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    /// Version of the current artifact, when one is known.
    pub fn version(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .and_then(|a| a.version().map(str::to_string))
    }

    /// Predicts a two-class distribution for one encoded input.
    pub fn predict(&self, tokens: &TokenSequence) -> Result<[f64; 2]> {
        let artifact = self.current().ok_or(ModelErr::Unavailable)?;
        self.runtime.predict(&artifact, tokens)
    }

    /// Starts a fine-tuning session off the base artifact at `base`.
    ///
    /// The session is returned in `Pending`; nothing runs until
    /// [`TrainingSession::run`] is awaited.
    pub fn begin_update(&self, batch: TrainingBatch, base: &Path) -> Result<TrainingSession> {
        if !base.exists() {
            return Err(ModelErr::NotFound(base.to_path_buf()));
        }

        Ok(TrainingSession::new(
            Arc::clone(&self.runtime),
            base.to_path_buf(),
            batch,
        ))
    }

    /// Atomically swaps in a new artifact. Subsequent `predict` and
    /// `begin_update` calls observe it; in-flight predictions against the
    /// old artifact are unaffected.
    pub fn replace(&self, artifact: ModelArtifact) {
        let version = artifact.version().unwrap_or("unversioned").to_string();
        *self.current.write() = Some(Arc::new(artifact));
        info!(version = version.as_str(); "model artifact swapped in");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{EpochProgress, UpdateReport};
    use std::path::PathBuf;

    /// Runtime whose predictions are fixed per artifact version, to make
    /// swaps observable.
    struct VersionedRuntime;

    impl MlRuntime for VersionedRuntime {
        fn load_default(&self) -> Result<ModelArtifact> {
            Ok(ModelArtifact::new(vec![0]).with_version(Some("v0".into())))
        }

        fn predict(&self, artifact: &ModelArtifact, _tokens: &TokenSequence) -> Result<[f64; 2]> {
            match artifact.version() {
                Some("v1") => Ok([0.1, 0.9]),
                _ => Ok([0.9, 0.1]),
            }
        }

        fn update(
            &self,
            _base: &Path,
            _batch: &TrainingBatch,
            _on_epoch: &mut dyn FnMut(EpochProgress),
        ) -> Result<UpdateReport> {
            unimplemented!("not exercised here")
        }

        fn compile(&self, raw: &Path) -> Result<PathBuf> {
            Ok(raw.to_path_buf())
        }

        fn load(&self, _compiled: &Path) -> Result<ModelArtifact> {
            unimplemented!("not exercised here")
        }
    }

    #[test]
    fn predict_without_artifact_is_unavailable() {
        let handle = ModelHandle::new(Arc::new(VersionedRuntime));
        let err = handle.predict(&[0; tokenizer::SEQ_LEN]).unwrap_err();
        assert!(matches!(err, ModelErr::Unavailable));
    }

    #[test]
    fn replace_is_visible_immediately_after_return() {
        let handle = ModelHandle::new(Arc::new(VersionedRuntime));
        handle.load_default().unwrap();

        let tokens = [0; tokenizer::SEQ_LEN];
        assert_eq!(handle.predict(&tokens).unwrap(), [0.9, 0.1]);

        handle.replace(ModelArtifact::new(vec![1]).with_version(Some("v1".into())));
        assert_eq!(handle.predict(&tokens).unwrap(), [0.1, 0.9]);
        assert_eq!(handle.version().as_deref(), Some("v1"));
    }

    #[test]
    fn begin_update_on_missing_base_is_not_found() {
        let handle = ModelHandle::new(Arc::new(VersionedRuntime));
        let err = handle
            .begin_update(TrainingBatch::default(), Path::new("/nonexistent/base.json"))
            .unwrap_err();
        assert!(matches!(err, ModelErr::NotFound(_)));
    }
}
