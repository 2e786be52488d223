//! Ollama client configuration.

use std::time::Duration;

/// Configuration for the Ollama client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Read timeout in seconds.
    pub read_timeout_secs: u64,
    /// Write (connect) timeout in seconds.
    pub write_timeout_secs: u64,
    /// Keep-alive sent with requests that do not set their own
    /// (e.g., "5m", "0" to unload immediately).
    pub keep_alive: Option<String>,
}

impl OllamaConfig {
    /// Default Ollama API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:11434";
    /// Default read timeout.
    pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;
    /// Default write timeout.
    pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 120;

    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `OLLAMA_BASE_URL` - Optional base URL
    /// - `OLLAMA_KEEP_ALIVE` - Optional keep alive duration
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned());
        let keep_alive = std::env::var("OLLAMA_KEEP_ALIVE").ok();

        Self {
            base_url,
            keep_alive,
            ..Self::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub const fn write_timeout(mut self, secs: u64) -> Self {
        self.write_timeout_secs = secs;
        self
    }

    /// Sets the keep alive duration.
    #[must_use]
    pub fn keep_alive(mut self, duration: impl Into<String>) -> Self {
        self.keep_alive = Some(duration.into());
        self
    }

    pub(crate) const fn read_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub(crate) const fn write_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            read_timeout_secs: Self::DEFAULT_READ_TIMEOUT_SECS,
            write_timeout_secs: Self::DEFAULT_WRITE_TIMEOUT_SECS,
            keep_alive: None,
        }
    }
}
