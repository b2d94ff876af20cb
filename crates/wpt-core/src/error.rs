use serde::Serialize;

/// The stage of a fetch that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Caller input was rejected before any request was sent.
    Input,
    /// The HTTP request failed or returned a non-success status.
    Transport,
    /// The response body could not be interpreted as a result envelope.
    Decode,
    /// The runtime backing the blocking entry point could not be created.
    Runtime,
}

impl std::fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorPhase::Input => "input",
            ErrorPhase::Transport => "transport",
            ErrorPhase::Decode => "decode",
            ErrorPhase::Runtime => "runtime",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WptError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Transport error: HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Decode error: invalid run key {key:?}: {reason}")]
    InvalidRunKey { key: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WptError {
    pub fn phase(&self) -> ErrorPhase {
        match self {
            WptError::Transport(_) | WptError::HttpStatus { .. } => ErrorPhase::Transport,
            WptError::Decode(_) | WptError::InvalidRunKey { .. } => ErrorPhase::Decode,
            WptError::Validation(_) => ErrorPhase::Input,
            WptError::Io(_) => ErrorPhase::Runtime,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.phase() == ErrorPhase::Transport
    }

    pub fn is_decode(&self) -> bool {
        self.phase() == ErrorPhase::Decode
    }
}

impl Serialize for WptError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
