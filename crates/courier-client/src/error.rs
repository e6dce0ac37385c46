use std::fmt;

use courier_crypto::CryptoError;

/// Closed error taxonomy for session operations.
///
/// Matching is always on kind; no error carries a dynamic payload that
/// callers would need to downcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The access token was rejected or is already invalid. Benign for
    /// session deletion, fatal for everything else.
    Unauthenticated,
    /// The transport could not reach the server.
    Connection(String),
    /// A cryptographic operation failed (bad key, bad blob).
    Crypto(String),
    /// A session for a different user is already active.
    StateConflict {
        /// Id of the currently active user.
        active: String,
        /// Id of the user the new session was requested for.
        requested: String,
    },
    /// The access token is not a well-formed session token.
    InvalidSessionToken(String),
    /// The group id does not correspond to any membership of the active user.
    UnknownGroup(String),
    /// The configured second-factor attempt bound was exhausted.
    SecondFactorTimeout,
    /// The second-factor wait was cancelled.
    Cancelled,
    /// The server answered with an unexpected status.
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a placeholder.
        message: String,
    },
    /// Local credential storage failed.
    Storage(String),
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Not authenticated. Please log in again."),
            Self::Connection(msg) => write!(f, "Cannot reach the server: {msg}"),
            Self::Crypto(msg) => write!(f, "Cryptographic operation failed: {msg}"),
            Self::StateConflict { active, requested } => write!(
                f,
                "A session for user {active} is already active; refusing to log in user {requested}"
            ),
            Self::InvalidSessionToken(msg) => write!(f, "Malformed session token: {msg}"),
            Self::UnknownGroup(group) => write!(f, "No membership for group {group}"),
            Self::SecondFactorTimeout => {
                write!(f, "Second factor was not approved within the configured bound.")
            }
            Self::Cancelled => write!(f, "Second factor wait was cancelled."),
            Self::Server { status, message } => write!(f, "Server error ({status}): {message}"),
            Self::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for LoginError {}

impl From<reqwest::Error> for LoginError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            match status.as_u16() {
                401 => Self::Unauthenticated,
                code => Self::Server {
                    status: code,
                    message: err.to_string(),
                },
            }
        } else {
            Self::Connection(err.to_string())
        }
    }
}

impl From<CryptoError> for LoginError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LoginError>;
