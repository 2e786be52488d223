//! Shared helpers for the wiremock-backed integration tests.

#![allow(dead_code)]

use ollama_client::{Ollama, OllamaConfig, policy};

/// Run blocking client code off the async runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// A client pointed at the mock server.
pub fn client(uri: &str) -> Ollama {
    Ollama::new(OllamaConfig::new().base_url(uri)).expect("client builds")
}

/// Restores the process-wide policy switches when dropped.
pub struct PolicyGuard;

impl PolicyGuard {
    pub fn exceptions(enable: bool) -> Self {
        policy::allow_exceptions(enable);
        Self
    }
}

impl Drop for PolicyGuard {
    fn drop(&mut self) {
        policy::allow_exceptions(true);
        policy::show_requests(false);
        policy::show_replies(false);
    }
}
