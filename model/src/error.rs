use std::{error::Error, fmt, io, path::PathBuf};

/// The model module's result type.
pub type Result<T> = std::result::Result<T, ModelErr>;

/// Model and training failures.
#[derive(Debug)]
pub enum ModelErr {
    /// No current artifact is loaded into the handle.
    Unavailable,
    /// The base artifact resource could not be located.
    NotFound(PathBuf),
    /// The runtime rejected a prediction input.
    Prediction(String),
    /// The runtime did not report task completion.
    TrainingFailed(String),
    /// Something failed before or around the session itself.
    TrainingError(String),
    /// Post-training evaluation produced zero usable results, so accuracy
    /// is undefined.
    NoEvaluations,
    /// The trained artifact could not be durably written.
    Save { path: PathBuf, source: io::Error },
    /// Downloaded bytes could not be compiled into a runnable artifact.
    Compile(String),
}

impl fmt::Display for ModelErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelErr::Unavailable => write!(f, "no model is currently loaded"),
            ModelErr::NotFound(path) => {
                write!(f, "base model artifact not found at {}", path.display())
            }
            ModelErr::Prediction(msg) => write!(f, "prediction failed: {msg}"),
            ModelErr::TrainingFailed(msg) => write!(f, "training did not complete: {msg}"),
            ModelErr::TrainingError(msg) => write!(f, "training error: {msg}"),
            ModelErr::NoEvaluations => {
                write!(f, "evaluation produced no results, accuracy is undefined")
            }
            ModelErr::Save { path, source } => write!(
                f,
                "failed to save trained artifact to {}: {source}",
                path.display()
            ),
            ModelErr::Compile(msg) => write!(f, "artifact compilation failed: {msg}"),
        }
    }
}

impl Error for ModelErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelErr::Save { source, .. } => Some(source),
            _ => None,
        }
    }
}
