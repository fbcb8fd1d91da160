use std::{error::Error, fmt};

use model::ModelErr;
use serde::Serialize;

/// The coordinator module's result type.
pub type Result<T> = std::result::Result<T, CoordErr>;

/// Failures surfaced to the original bridge caller. Network failures never
/// appear here; they are recovered and logged inside the round chains.
#[derive(Debug)]
pub enum CoordErr {
    /// Missing or malformed request fields, missing tokenizer or model.
    InvalidArgument(String),
    Model(ModelErr),
}

impl CoordErr {
    /// Bridge error code, one of the six the host recognizes.
    pub fn code(&self) -> &'static str {
        match self {
            CoordErr::InvalidArgument(_) => "INVALID_ARGUMENT",
            // The original client answered its predict/train guards with
            // INVALID_ARGUMENT when no model was loaded.
            CoordErr::Model(ModelErr::Unavailable) => "INVALID_ARGUMENT",
            CoordErr::Model(ModelErr::NotFound(_)) => "MODEL_NOT_FOUND",
            CoordErr::Model(ModelErr::Prediction(_)) => "PREDICTION_FAILED",
            CoordErr::Model(ModelErr::TrainingFailed(_)) => "TRAINING_FAILED",
            CoordErr::Model(ModelErr::TrainingError(_))
            | CoordErr::Model(ModelErr::NoEvaluations)
            | CoordErr::Model(ModelErr::Compile(_)) => "TRAINING_ERROR",
            CoordErr::Model(ModelErr::Save { .. }) => "SAVE_FAILED",
        }
    }

    pub fn to_bridge(&self) -> BridgeError {
        BridgeError {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl fmt::Display for CoordErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordErr::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            CoordErr::Model(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CoordErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CoordErr::Model(e) => Some(e),
            CoordErr::InvalidArgument(_) => None,
        }
    }
}

impl From<ModelErr> for CoordErr {
    fn from(value: ModelErr) -> Self {
        Self::Model(value)
    }
}

/// Structured error delivered over the bridge: `{ code, message }`.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
}
