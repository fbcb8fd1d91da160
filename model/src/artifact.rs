use std::sync::Arc;

/// A serialized, loadable model state — the unit exchanged between device
/// and server.
///
/// Never mutated in place: training and download both produce a *new*
/// artifact that must be explicitly swapped into the handle. Cloning is
/// cheap (the payload is shared).
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    bytes: Arc<Vec<u8>>,
    version: Option<String>,
}

impl ModelArtifact {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(bytes),
            version: None,
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Opaque payload, interpreted only by the runtime.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Server-assigned version, when one is known.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}
