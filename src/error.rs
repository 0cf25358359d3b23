use thiserror::Error;

/// ClientError
///
/// The complete failure taxonomy of the client core. The dispatcher and the
/// identity resolver classify every failure into one of these variants and
/// propagate it; they never swallow errors and never retry. Page-level code
/// is the only layer that catches and displays.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Sign-in or token validation rejected by the active provider.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Transport-level failure: the backend was never reached (connection
    /// refused, DNS failure, timeout). Distinct from an application error
    /// so callers can offer a retry instead of blaming the input.
    #[error("backend unreachable: {reason}")]
    NetworkUnavailable { reason: String },

    /// The backend was reached and returned an application-level error
    /// (4xx/5xx). Carries the server-supplied message when one was present.
    #[error("request rejected ({status}): {message}")]
    RequestRejected { status: u16, message: String },

    /// Access denied by role policy. Raised by consumers converting a route
    /// guard denial into an error display, never by the dispatcher itself.
    #[error("not authorized for this resource")]
    Unauthorized,
}

impl ClientError {
    /// Stable kind label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::InvalidCredentials => "invalid_credentials",
            ClientError::NetworkUnavailable { .. } => "network_unavailable",
            ClientError::RequestRejected { .. } => "request_rejected",
            ClientError::Unauthorized => "unauthorized",
        }
    }

    /// Shorthand for rejections whose body carried no usable message.
    pub fn rejected(status: u16) -> Self {
        ClientError::RequestRejected {
            status,
            message: format!("Backend error: {status}"),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    /// Transport errors (no HTTP response at all) become NetworkUnavailable.
    /// Errors that do carry a status are classified by the provider before
    /// this conversion would apply, so the status branch is a fallback.
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ClientError::rejected(status.as_u16()),
            None => ClientError::NetworkUnavailable {
                reason: err.to_string(),
            },
        }
    }
}
