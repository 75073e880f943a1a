use thiserror::Error;

/// Failures raised while turning an inbound webhook into a tool result.
///
/// The `Display` output is the bare message because it is echoed verbatim in
/// the `error` field of the response envelope.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Body is not a usable tool call (bad JSON, empty call list, bad arguments).
    #[error("{0}")]
    InvalidRequest(String),
    /// The remote orchestration call failed or returned something unusable.
    #[error("{0}")]
    RemoteCall(String),
    /// Collaborator could not be constructed (missing credentials, bad zone).
    #[error("{0}")]
    Config(String),
}

impl AdapterError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn remote_call(message: impl Into<String>) -> Self {
        Self::RemoteCall(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::RemoteCall(_) => "remote_call",
            Self::Config(_) => "config",
        }
    }
}

pub type AdapterResult<T> = Result<T, AdapterError>;
