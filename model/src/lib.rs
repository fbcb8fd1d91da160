//! Model-side core: the opaque model artifact, the handle that owns the
//! process-wide current artifact, the training-session state machine, and
//! the runtime collaborator seam.

pub mod artifact;
pub mod error;
pub mod handle;
pub mod local;
pub mod runtime;
pub mod session;

pub use artifact::ModelArtifact;
pub use error::{ModelErr, Result};
pub use handle::ModelHandle;
pub use local::LocalRuntime;
pub use runtime::{EpochProgress, MlRuntime, UpdateReport};
pub use session::{SessionState, TrainingOutcome, TrainingSession};
