//! Client error types

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket transport failed
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session is not connected
    #[error("Not connected")]
    NotConnected,

    /// Server closed the connection and every reconnect attempt failed
    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),

    /// Server rejected an operation
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
