//! Server-side collaborator surface: the four aggregation-server endpoints
//! behind a trait, the reqwest implementation, and artifact archiving.

pub mod archive;
pub mod error;
pub mod http;

pub use archive::pack_artifact;
pub use error::{Result, TransportErr};
pub use http::HttpTransport;

use async_trait::async_trait;
use serde::Serialize;

/// Metrics snapshot reported after a training round. Purely informational;
/// the server never echoes it back.
#[derive(Debug, Clone, Serialize)]
pub struct RoundMetrics {
    pub accuracy: f64,
    pub loss: f64,
    pub model_version: String,
}

/// An aggregated model fetched from the server.
#[derive(Debug)]
pub struct FetchedModel {
    /// Value of the `Model-Version` response header, when present.
    pub version: Option<String>,
    pub bytes: Vec<u8>,
}

/// The aggregation server's four endpoints.
///
/// Every call is best-effort from the round coordinator's point of view;
/// failures surface here as errors and are recovered (logged) upstream.
#[async_trait]
pub trait ServerApi: Send + Sync {
    /// Uploads a zip archive of the trained artifact.
    async fn upload_model(&self, archive: Vec<u8>) -> Result<()>;

    /// Asks the server to aggregate uploaded models; returns its opaque
    /// status string.
    async fn trigger_aggregation(&self) -> Result<String>;

    /// Fetches the current aggregated model.
    async fn download_model(&self) -> Result<FetchedModel>;

    /// Reports round metrics. Fire-and-forget on the caller's side.
    async fn send_metrics(&self, metrics: &RoundMetrics) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_serialize_with_wire_field_names() {
        let metrics = RoundMetrics {
            accuracy: 75.0,
            loss: 0.25,
            model_version: "3".to_string(),
        };
        let json = serde_json::to_value(&metrics).unwrap();

        assert_eq!(json["accuracy"], 75.0);
        assert_eq!(json["loss"], 0.25);
        assert_eq!(json["model_version"], "3");
    }
}
