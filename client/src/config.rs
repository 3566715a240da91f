//! Client configuration

use crate::backoff::ReconnectPolicy;

/// Chat session configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server WebSocket URL (e.g. "ws://localhost:5000/ws")
    pub ws_url: String,

    /// JWT token appended as the `token` query parameter
    pub token: String,

    /// Reconnect behaviour on connection loss
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(ws_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            token: token.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Override the reconnect policy
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Full connection URL including the auth token
    pub fn connect_url(&self) -> String {
        format!("{}?token={}", self.ws_url, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_url_carries_token() {
        let config = ClientConfig::new("ws://localhost:5000/ws", "abc.def.ghi");
        assert_eq!(config.connect_url(), "ws://localhost:5000/ws?token=abc.def.ghi");
    }
}
