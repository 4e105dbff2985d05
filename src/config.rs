//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `MAX_BODY_BYTES` (optional): largest request body an endpoint buffers, defaults to 2 MiB
/// - `FLUSH_BUFFER` (optional): body chunks in flight per response, defaults to 16
/// - `SESSION_COOKIE` (optional): name of the demo session cookie, defaults to `MyWebSite`
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_flush_buffer")]
    pub flush_buffer: usize,

    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_flush_buffer() -> usize {
    16
}

fn default_session_cookie() -> String {
    "MyWebSite".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into the expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: max_body_bytes -> MAX_BODY_BYTES
        envy::from_env::<Config>()
    }

    /// Per-endpoint settings derived from this configuration.
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig {
            max_body_bytes: self.max_body_bytes,
            flush_buffer: self.flush_buffer,
        }
    }
}

/// Settings an [`Endpoint`](crate::endpoint::Endpoint) applies to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Requests with a larger body are rejected before the pipeline runs.
    pub max_body_bytes: usize,

    /// Capacity of the channel carrying flushed chunks to the client.
    pub flush_buffer: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            flush_buffer: default_flush_buffer(),
        }
    }
}
