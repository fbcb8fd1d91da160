use std::{error::Error, fmt, io, path::PathBuf};

/// The tokenizer module's result type.
pub type Result<T> = std::result::Result<T, TokenizerErr>;

/// Failures while loading the bundled tokenizer resource.
#[derive(Debug)]
pub enum TokenizerErr {
    Io { path: PathBuf, source: io::Error },
    Json { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for TokenizerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerErr::Io { path, source } => {
                write!(f, "failed to read tokenizer at {}: {source}", path.display())
            }
            TokenizerErr::Json { path, source } => {
                write!(f, "invalid tokenizer json at {}: {source}", path.display())
            }
        }
    }
}

impl Error for TokenizerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TokenizerErr::Io { source, .. } => Some(source),
            TokenizerErr::Json { source, .. } => Some(source),
        }
    }
}
