use thiserror::Error;

/// Failure of a single HTTP exchange. These are the failures worth retrying.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum RestError {
    /// Retries exhausted, the status table was never consulted.
    #[error("request to {uri} failed after {attempts} attempt(s): {source}")]
    Transport {
        uri: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("API call failed - {message} ({code})")]
    Api { code: i64, message: &'static str },

    #[error("API call failed - unknown status code {0}")]
    UnknownStatus(i64),

    /// 2xx answer which is not a `{"Status": ..}` envelope.
    #[error("cannot decode response from {uri}: {reason}")]
    Decode { uri: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    Client(String),
}

impl RestError {
    pub fn is_transport(&self) -> bool {
        matches!(self, RestError::Transport { .. })
    }
}

pub type RestResult<T> = Result<T, RestError>;
