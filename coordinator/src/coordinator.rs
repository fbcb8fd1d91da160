use std::{fs, sync::Arc};

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::{sync::Mutex as AsyncMutex, task::JoinSet};

use model::{MlRuntime, ModelHandle};
use tokenizer::{LabeledSample, WordIndex, build_batch, tokenize};
use transport::{RoundMetrics, ServerApi, pack_artifact};

use crate::{
    config::CoordinatorConfig,
    error::{CoordErr, Result},
    request::{Reply, Request},
};

/// Round bookkeeping that ties federated rounds together.
#[derive(Debug, Default)]
struct RoundState {
    /// Version of the aggregated model currently in use, when the server
    /// has announced one.
    model_version: Option<String>,
    last_accuracy: Option<f64>,
    last_loss: Option<f64>,
}

/// Orchestrates the federated round-trip: predict, train, package-and-
/// upload, trigger aggregation, download, compile, hot-swap.
///
/// Exactly one instance exists per process; request handlers borrow it.
pub struct Coordinator<S> {
    runtime: Arc<dyn MlRuntime>,
    handle: ModelHandle,
    word_index: Option<WordIndex>,
    server: Arc<S>,
    cfg: CoordinatorConfig,
    state: Mutex<RoundState>,
    background: AsyncMutex<JoinSet<()>>,
}

impl<S: ServerApi + 'static> Coordinator<S> {
    pub fn new(
        runtime: Arc<dyn MlRuntime>,
        server: Arc<S>,
        word_index: Option<WordIndex>,
        cfg: CoordinatorConfig,
    ) -> Self {
        Self {
            handle: ModelHandle::new(Arc::clone(&runtime)),
            runtime,
            word_index,
            server,
            cfg,
            state: Mutex::new(RoundState::default()),
            background: AsyncMutex::new(JoinSet::new()),
        }
    }

    /// Loads the bundled default model into the handle. A failure leaves
    /// the process running degraded: predict and train answer
    /// INVALID_ARGUMENT until a download succeeds.
    pub fn load_default_model(&self) {
        match self.handle.load_default() {
            Ok(()) => info!("default model loaded"),
            Err(e) => error!("failed to load default model: {e}"),
        }
    }

    /// Version of the model currently in use, when known.
    pub fn model_version(&self) -> Option<String> {
        self.state.lock().model_version.clone()
    }

    /// Last training round's (accuracy, loss), when a round has completed.
    pub fn last_metrics(&self) -> Option<(f64, f64)> {
        let state = self.state.lock();
        state.last_accuracy.zip(state.last_loss)
    }

    /// Dispatches one bridge request to its handler and produces the single
    /// terminal reply.
    pub async fn handle(&self, request: Request) -> Reply {
        let result = match request {
            Request::Predict { text } => self.predict(&text),
            Request::Train { examples } => self.train(&examples).await,
            Request::Download => Ok(json!(self.download().await)),
        };
        Reply::from_result(result)
    }

    /// Local inference on the current model.
    fn predict(&self, text: &str) -> Result<Value> {
        let index = self.word_index()?;
        let tokens = tokenize(text, index);
        let probs = self.handle.predict(&tokens)?;
        Ok(json!(probs.to_vec()))
    }

    /// One user-triggered training round.
    ///
    /// The reply carries the local accuracy as soon as it is known; the
    /// metrics report and the upload→aggregate chain run in the background
    /// and never fail the call.
    async fn train(&self, examples: &[Value]) -> Result<Value> {
        let index = self.word_index()?;
        if !self.handle.is_loaded() {
            return Err(CoordErr::InvalidArgument(
                "no model loaded for training".to_string(),
            ));
        }

        // Malformed samples are skipped, not counted and not erred.
        let samples: Vec<LabeledSample> = examples
            .iter()
            .filter_map(LabeledSample::from_value)
            .collect();
        if samples.is_empty() {
            return Err(CoordErr::InvalidArgument(
                "no valid training samples".to_string(),
            ));
        }

        let batch = build_batch(&samples, index);
        let mut session = self.handle.begin_update(batch, &self.cfg.base_model_path)?;

        if let Some(mut progress) = session.progress() {
            self.background.lock().await.spawn(async move {
                while let Some(event) = progress.recv().await {
                    debug!(epoch = event.epoch, loss = event.loss; "training progress");
                }
            });
        }

        let save_to = self.cfg.trained_model_path();
        let outcome = session.run(&samples, index, &save_to).await?;
        info!(accuracy = outcome.accuracy, loss = outcome.loss; "training round completed");

        let metrics = {
            let mut state = self.state.lock();
            state.last_accuracy = Some(outcome.accuracy);
            state.last_loss = Some(outcome.loss);
            RoundMetrics {
                accuracy: outcome.accuracy,
                loss: outcome.loss,
                model_version: state
                    .model_version
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            }
        };

        // Metrics reporting is independent of the upload chain and may race
        // with it; both are best-effort.
        let server = Arc::clone(&self.server);
        self.background.lock().await.spawn(async move {
            match server.send_metrics(&metrics).await {
                Ok(()) => info!("metrics sent"),
                Err(e) => warn!("failed to send metrics: {e}"),
            }
        });

        // Package-and-upload, then trigger aggregation only on upload
        // success. The artifact is already durably written at this point.
        let server = Arc::clone(&self.server);
        self.background.lock().await.spawn(async move {
            let archive = match pack_artifact(&save_to) {
                Ok(archive) => archive,
                Err(e) => {
                    warn!("packaging trained artifact failed: {e}");
                    return;
                }
            };

            match server.upload_model(archive).await {
                Ok(()) => info!("upload successful"),
                Err(e) => {
                    warn!("upload failed: {e}");
                    return;
                }
            }

            match server.trigger_aggregation().await {
                Ok(status) => info!(status = status.as_str(); "aggregation successful"),
                Err(e) => warn!("aggregation failed: {e}"),
            }
        });

        Ok(json!(format!(
            "Training accuracy: {:.1}%",
            outcome.accuracy
        )))
    }

    /// Fetches the server's aggregated model and hot-swaps it in.
    ///
    /// Every stage failure is logged and halts only the remainder of the
    /// chain; the bridge still gets its one terminal reply. The outcome is
    /// observable through subsequent predict behavior and logs.
    async fn download(&self) -> &'static str {
        let fetched = match self.server.download_model().await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("model download failed: {e}");
                return DOWNLOAD_REPLY;
            }
        };

        // An absent header means no version update, not an error.
        match fetched.version {
            Some(version) => {
                info!(version = version.as_str(); "aggregated model version");
                self.state.lock().model_version = Some(version);
            }
            None => warn!("model version not found in response headers"),
        }

        let raw_path = self.cfg.aggregated_model_path();
        if let Err(e) = fs::write(&raw_path, &fetched.bytes) {
            warn!("saving downloaded model failed: {e}");
            return DOWNLOAD_REPLY;
        }

        let compiled = match self.runtime.compile(&raw_path) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!("model compilation failed: {e}");
                return DOWNLOAD_REPLY;
            }
        };

        let artifact = match self.runtime.load(&compiled) {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("loading compiled model failed: {e}");
                return DOWNLOAD_REPLY;
            }
        };

        let version = self.state.lock().model_version.clone();
        self.handle.replace(artifact.with_version(version));
        DOWNLOAD_REPLY
    }

    fn word_index(&self) -> Result<&WordIndex> {
        self.word_index
            .as_ref()
            .ok_or_else(|| CoordErr::InvalidArgument("tokenizer not loaded".to_string()))
    }

    /// Awaits all spawned background work. Used at shutdown, and by tests
    /// to synchronize with the post-training chain.
    pub async fn drain_background(&self) {
        let mut background = self.background.lock().await;
        while background.join_next().await.is_some() {}
    }
}

const DOWNLOAD_REPLY: &str = "Downloaded successfully.";
