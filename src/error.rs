use std::path::PathBuf;

/// What went wrong while acquiring a single page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchErrorKind {
    /// Server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Http(u16),

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),

    /// Browser could not navigate to or read the page.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation or the network-idle wait ran out of time.
    #[error("navigation timed out")]
    Timeout,

    /// Browser session could not be opened or was lost.
    #[error("browser session error: {0}")]
    Session(String),
}

/// A failed fetch of one URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to fetch {url}: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    pub fn http(url: impl Into<String>, status: u16) -> Self {
        Self::new(url, FetchErrorKind::Http(status))
    }

    pub fn network(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::new(url, FetchErrorKind::Network(msg.to_string()))
    }

    pub fn navigation(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::new(url, FetchErrorKind::Navigation(msg.to_string()))
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self::new(url, FetchErrorKind::Timeout)
    }

    pub fn session(url: impl Into<String>, msg: impl ToString) -> Self {
        Self::new(url, FetchErrorKind::Session(msg.to_string()))
    }
}

/// Failure of a language-model or embedding capability.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The provider answered with a non-2xx status.
    #[error("model API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed.
    #[error("model API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered but the payload was not usable.
    #[error("malformed model response: {0}")]
    Malformed(String),
}

impl ModelError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Failure while turning a corpus and an instruction into an answer.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("embedding failed: {0}")]
    Embedding(#[source] ModelError),

    #[error("index build failed: {message}")]
    Index { message: String },

    #[error("answer generation failed: {0}")]
    Generation(#[source] ModelError),
}

impl SynthesisError {
    pub fn index(msg: impl Into<String>) -> Self {
        Self::Index {
            message: msg.into(),
        }
    }
}

/// Outcome of a pipeline run that produced no answer.
///
/// `NoContent` and `Synthesis` are kept apart so a service boundary can map
/// them to different statuses.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no content fetched from {url}")]
    NoContent { url: String },

    #[error("processing failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("run exceeded the {secs}s time budget")]
    Timeout { secs: u64 },

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl PipelineError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: msg.into(),
        }
    }
}

/// Configuration loading or validation error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid {
            message: msg.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
