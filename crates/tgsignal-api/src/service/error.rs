//! Error classification for service requests.

/// Classifies a failed service request.
///
/// Attached to the `anyhow::Error` chain by the client; recover it with
/// [`ServiceError::classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a response (connect error, timeout, body read failure).
    Transport {
        /// Operation name.
        operation: &'static str,
    },
    /// The service answered with a non-2xx status.
    Status {
        /// Operation name.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: Option<String>,
    },
    /// The body did not match the response schema.
    Decode {
        /// Operation name.
        operation: &'static str,
    },
}

impl ServiceError {
    /// Finds the `ServiceError` in an error chain.
    #[must_use]
    pub fn classify(err: &anyhow::Error) -> Option<&Self> {
        err.downcast_ref::<Self>()
    }

    /// Returns `true` for transport failures.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { operation } => {
                write!(f, "{operation}: could not connect to the service")
            }
            Self::Status {
                operation,
                status,
                message: Some(message),
            } => write!(f, "{operation}: service returned HTTP {status}: {message}"),
            Self::Status {
                operation,
                status,
                message: None,
            } => write!(f, "{operation}: service returned HTTP {status}"),
            Self::Decode { operation } => {
                write!(f, "{operation}: unexpected response from the service")
            }
        }
    }
}

impl std::error::Error for ServiceError {}
