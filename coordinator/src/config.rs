use std::{fs, io, path::PathBuf};

/// Paths the coordinator works with. The server address lives with the
/// transport, not here.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Base artifact fine-tuning sessions start from.
    pub base_model_path: PathBuf,
    /// Directory for trained and downloaded artifacts.
    pub work_dir: PathBuf,
}

impl CoordinatorConfig {
    /// Where a trained artifact is persisted before upload.
    pub fn trained_model_path(&self) -> PathBuf {
        self.work_dir.join("updated_model.bin")
    }

    /// Where a downloaded aggregated model lands before compilation.
    pub fn aggregated_model_path(&self) -> PathBuf {
        self.work_dir.join("aggregated_model.bin")
    }

    /// Ensures the work directory exists.
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.work_dir)
    }
}
