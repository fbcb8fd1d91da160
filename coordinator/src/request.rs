use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BridgeError, CoordErr};

/// The three request kinds the host bridge delivers.
///
/// A closed enum tagged by `method` keeps dispatch exhaustive at compile
/// time; unknown methods fail to parse and are answered with
/// INVALID_ARGUMENT by the bridge loop.
#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    Predict { text: String },
    Train { examples: Vec<Value> },
    Download,
}

/// Exactly one terminal reply per request: a success value or a structured
/// error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Result { result: Value },
    Error { error: BridgeError },
}

impl Reply {
    pub fn from_result(result: Result<Value, CoordErr>) -> Self {
        match result {
            Ok(result) => Reply::Result { result },
            Err(e) => Reply::Error {
                error: e.to_bridge(),
            },
        }
    }
}
