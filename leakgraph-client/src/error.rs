//! Error types for the graph client

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the graph database
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Connection target could not be parsed
    #[error("Invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Server unreachable or connection dropped
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Server rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Statement rejected or failed during execution
    #[error("Query error: {0}")]
    QueryError(String),

    /// A returned field could not be decoded
    #[error("Failed to decode field '{field}': {reason}")]
    DecodeError { field: String, reason: String },

    /// Session used after release
    #[error("Session already closed")]
    SessionClosed,

    /// Driver used after release
    #[error("Driver already closed")]
    DriverClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Stage of a request in which a driver error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Run,
    Fetch,
}

impl ClientError {
    /// Classify a driver error message by the phase it was raised in.
    ///
    /// Connection pools open sockets lazily, so a credential rejection can
    /// surface on the first statement rather than on connect.
    pub fn from_driver(phase: Phase, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_ascii_lowercase();
        if lowered.contains("authentication") || lowered.contains("unauthorized") {
            return ClientError::AuthenticationError(message);
        }

        match phase {
            Phase::Connect => ClientError::ConnectionError(message),
            Phase::Run | Phase::Fetch => {
                if lowered.contains("connection") || lowered.contains("i/o") {
                    ClientError::ConnectionError(message)
                } else {
                    ClientError::QueryError(message)
                }
            }
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        ClientError::ConfigError(msg.into())
    }

    /// True for failures reaching or authenticating against the server
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionError(_) | ClientError::AuthenticationError(_)
        )
    }
}
