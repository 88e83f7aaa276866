//! Error types shared by the upstream provider clients.

/// A classified failure from an upstream provider.
///
/// Transport and status failures, malformed bodies and missing required
/// structure all collapse into this one type so callers handle a single
/// "upstream error" regardless of which provider or step failed.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Invalid JSON payload from {url}: {detail}")]
    InvalidJson { url: String, detail: String },
    #[error("Upstream payload missing {0}")]
    MissingField(&'static str),
    #[error("No upstream results for {0}")]
    NoResult(String),
    #[error("Incomplete upstream payload for {0}")]
    Incomplete(String),
}

impl UpstreamError {
    /// HTTP status reported by the provider, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { source, .. } if source.is_timeout() => "timeout",
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::InvalidJson { .. } => "invalid_json",
            Self::MissingField(_) => "missing_field",
            Self::NoResult(_) => "no_result",
            Self::Incomplete(_) => "incomplete",
        }
    }
}
