use std::{error::Error, fmt, io};

/// The transport module's result type.
pub type Result<T> = std::result::Result<T, TransportErr>;

/// Network and packaging failures. All of these are non-fatal to the local
/// round; the coordinator logs and continues.
#[derive(Debug)]
pub enum TransportErr {
    Http(reqwest::Error),
    Io(io::Error),
    Zip(String),
}

impl fmt::Display for TransportErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErr::Http(e) => write!(f, "http error: {e}"),
            TransportErr::Io(e) => write!(f, "io error: {e}"),
            TransportErr::Zip(msg) => write!(f, "zip error: {msg}"),
        }
    }
}

impl Error for TransportErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TransportErr::Http(e) => Some(e),
            TransportErr::Io(e) => Some(e),
            TransportErr::Zip(_) => None,
        }
    }
}

impl From<reqwest::Error> for TransportErr {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<io::Error> for TransportErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
