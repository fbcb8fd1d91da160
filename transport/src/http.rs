use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};

use crate::{
    FetchedModel, RoundMetrics, ServerApi,
    error::Result,
};

const MODEL_VERSION_HEADER: &str = "Model-Version";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-backed client for the aggregation server.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// # Args
    /// * `base_url` - Server base address, e.g. `http://10.0.0.2:5000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

#[async_trait]
impl ServerApi for HttpTransport {
    async fn upload_model(&self, archive: Vec<u8>) -> Result<()> {
        let part = Part::bytes(archive)
            .file_name("updated_model.zip")
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("model", part);

        self.client
            .post(self.url("upload"))
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn trigger_aggregation(&self) -> Result<String> {
        let status = self
            .client
            .post(self.url("aggregate"))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(status)
    }

    async fn download_model(&self) -> Result<FetchedModel> {
        let response = self
            .client
            .get(self.url("download"))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;

        let version = response
            .headers()
            .get(MODEL_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(); "aggregated model fetched");

        Ok(FetchedModel { version, bytes })
    }

    async fn send_metrics(&self, metrics: &RoundMetrics) -> Result<()> {
        self.client
            .post(self.url("metrics"))
            .json(metrics)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
