//! Server configuration.

use crate::error::{ServerError, ServerResult};
use std::net::SocketAddr;
use std::time::Duration;

/// Default port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,
    /// Length of one rate-limit window.
    pub rate_limit_window: Duration,
    /// Requests allowed per client IP per window. Zero disables limiting.
    pub rate_limit_max: u32,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            body_limit: 10 * 1024 * 1024,
            rate_limit_window: Duration::from_secs(15 * 60),
            rate_limit_max: 100,
        }
    }

    /// Builds the default configuration, taking the port from the `PORT`
    /// environment variable when set.
    pub fn from_env() -> ServerResult<Self> {
        let config = Self::default();
        match std::env::var("PORT") {
            Ok(port) => {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| ServerError::Config(format!("PORT={port:?}: {e}")))?;
                Ok(config.with_port(port))
            }
            Err(_) => Ok(config),
        }
    }

    /// Sets the port, keeping the bind host.
    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }

    /// Sets the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the maximum request body size.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Sets the rate limit.
    pub fn with_rate_limit(mut self, max_requests: u32, window: Duration) -> Self {
        self.rate_limit_max = max_requests;
        self.rate_limit_window = window;
        self
    }

    /// Disables rate limiting.
    pub fn without_rate_limit(mut self) -> Self {
        self.rate_limit_max = 0;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))
    }
}
