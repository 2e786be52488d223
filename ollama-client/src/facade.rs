//! Process-wide default client.
//!
//! Free functions mirroring [`Ollama`]'s operations against one shared
//! client, created on first use from
//! [`OllamaConfig::default`](crate::OllamaConfig::default). Replace it with
//! [`set_default_client`] or retarget it with [`set_server_url`].
//!
//! Each call works on a copy of the shared client, so a streaming sink may
//! call back into this module, setters included. A setter only affects calls
//! that start after it returns.
//!
//! ```rust,no_run
//! use ollama_client::{Request, facade};
//!
//! let reply = facade::generate(Request::generate("llama3", "Why is the sky blue?"))?;
//! println!("{reply}");
//! # Ok::<(), ollama_client::Error>(())
//! ```

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::client::Ollama;
use crate::error::Result;
use crate::policy::{self, Fallback};
use crate::request::Request;
use crate::response::Response;
use crate::stream::ResponseSink;

pub use crate::policy::{allow_exceptions, show_replies, show_requests};

static DEFAULT: RwLock<Option<Ollama>> = RwLock::new(None);

/// The shared client, created on first use. The lock is released before
/// the caller runs anything, so sinks may call back into this module.
fn current() -> Result<Ollama> {
    if let Some(client) = DEFAULT.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
        return Ok(client.clone());
    }
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(client) = guard.as_ref() {
        return Ok(client.clone());
    }
    let client = Ollama::with_defaults()?;
    *guard = Some(client.clone());
    Ok(client)
}

fn with_client<T: Fallback>(op: impl FnOnce(&Ollama) -> Result<T>) -> Result<T> {
    match current() {
        Ok(client) => op(&client),
        Err(e) => policy::settle(Err(e)),
    }
}

/// Runs `op` under the write lock. Only used by the setters, which rebuild
/// the HTTP client and never call out to user code.
fn with_client_mut<T: Fallback>(op: impl FnOnce(&mut Ollama) -> Result<T>) -> Result<T> {
    let mut guard = DEFAULT.write().unwrap_or_else(PoisonError::into_inner);
    let client = match &mut *guard {
        Some(client) => client,
        slot @ None => match Ollama::with_defaults() {
            Ok(client) => slot.insert(client),
            Err(e) => return policy::settle(Err(e)),
        },
    };
    op(client)
}

/// Install `client` as the process-wide default.
pub fn set_default_client(client: Ollama) {
    *DEFAULT.write().unwrap_or_else(PoisonError::into_inner) = Some(client);
}

/// A copy of the default client, creating it if needed.
///
/// # Errors
///
/// Returns [`Error::Transport`](crate::Error::Transport) if the client
/// cannot be built.
pub fn default_client() -> Result<Ollama> {
    current()
}

/// See [`Ollama::set_server_url`].
///
/// # Errors
///
/// Returns [`Error::Transport`](crate::Error::Transport) if the client
/// cannot be rebuilt.
pub fn set_server_url(base_url: impl Into<String>) -> Result<()> {
    with_client_mut(|client| client.set_server_url(base_url))
}

/// See [`Ollama::set_read_timeout`].
///
/// # Errors
///
/// Returns [`Error::Transport`](crate::Error::Transport) if the client
/// cannot be rebuilt.
pub fn set_read_timeout(secs: u64) -> Result<()> {
    with_client_mut(|client| client.set_read_timeout(secs))
}

/// See [`Ollama::set_write_timeout`].
///
/// # Errors
///
/// Returns [`Error::Transport`](crate::Error::Transport) if the client
/// cannot be rebuilt.
pub fn set_write_timeout(secs: u64) -> Result<()> {
    with_client_mut(|client| client.set_write_timeout(secs))
}

/// See [`Ollama::generate`].
///
/// # Errors
///
/// As [`Ollama::generate`].
pub fn generate(request: Request) -> Result<Response> {
    with_client(|client| client.generate(request))
}

/// See [`Ollama::generate_stream`].
///
/// # Errors
///
/// As [`Ollama::generate_stream`].
pub fn generate_stream(request: Request, sink: impl ResponseSink) -> Result<bool> {
    with_client(|client| client.generate_stream(request, sink))
}

/// See [`Ollama::chat`].
///
/// # Errors
///
/// As [`Ollama::chat`].
pub fn chat(request: Request) -> Result<Response> {
    with_client(|client| client.chat(request))
}

/// See [`Ollama::chat_stream`].
///
/// # Errors
///
/// As [`Ollama::chat_stream`].
pub fn chat_stream(request: Request, sink: impl ResponseSink) -> Result<bool> {
    with_client(|client| client.chat_stream(request, sink))
}

/// See [`Ollama::embed`].
///
/// # Errors
///
/// As [`Ollama::embed`].
pub fn embed(request: Request) -> Result<Response> {
    with_client(|client| client.embed(request))
}

/// See [`Ollama::load_model`].
///
/// # Errors
///
/// As [`Ollama::load_model`].
pub fn load_model(model: &str) -> Result<bool> {
    with_client(|client| client.load_model(model))
}

/// See [`Ollama::pull_model`].
///
/// # Errors
///
/// As [`Ollama::pull_model`].
pub fn pull_model(model: &str, insecure: bool) -> Result<bool> {
    with_client(|client| client.pull_model(model, insecure))
}

/// See [`Ollama::push_model`].
///
/// # Errors
///
/// As [`Ollama::push_model`].
pub fn push_model(model: &str, insecure: bool) -> Result<bool> {
    with_client(|client| client.push_model(model, insecure))
}

/// See [`Ollama::copy_model`].
///
/// # Errors
///
/// As [`Ollama::copy_model`].
pub fn copy_model(source: &str, destination: &str) -> Result<bool> {
    with_client(|client| client.copy_model(source, destination))
}

/// See [`Ollama::delete_model`].
///
/// # Errors
///
/// As [`Ollama::delete_model`].
pub fn delete_model(model: &str) -> Result<bool> {
    with_client(|client| client.delete_model(model))
}

/// See [`Ollama::create_model`].
///
/// # Errors
///
/// As [`Ollama::create_model`].
pub fn create_model(name: &str, modelfile: &str) -> Result<bool> {
    with_client(|client| client.create_model(name, modelfile))
}

/// See [`Ollama::create_model_from_file`].
///
/// # Errors
///
/// As [`Ollama::create_model_from_file`].
pub fn create_model_from_file(name: &str, path: impl AsRef<Path>) -> Result<bool> {
    with_client(|client| client.create_model_from_file(name, path))
}

/// See [`Ollama::show_model_info`].
///
/// # Errors
///
/// As [`Ollama::show_model_info`].
pub fn show_model_info(model: &str, verbose: bool) -> Result<Value> {
    with_client(|client| client.show_model_info(model, verbose))
}

/// See [`Ollama::list_models`].
///
/// # Errors
///
/// As [`Ollama::list_models`].
pub fn list_models() -> Result<Vec<String>> {
    with_client(Ollama::list_models)
}

/// See [`Ollama::list_models_json`].
///
/// # Errors
///
/// As [`Ollama::list_models_json`].
pub fn list_models_json() -> Result<Value> {
    with_client(Ollama::list_models_json)
}

/// See [`Ollama::list_running_models`].
///
/// # Errors
///
/// As [`Ollama::list_running_models`].
pub fn list_running_models() -> Result<Vec<String>> {
    with_client(Ollama::list_running_models)
}

/// See [`Ollama::running_models_json`].
///
/// # Errors
///
/// As [`Ollama::running_models_json`].
pub fn running_models_json() -> Result<Value> {
    with_client(Ollama::running_models_json)
}

/// See [`Ollama::blob_exists`].
///
/// # Errors
///
/// As [`Ollama::blob_exists`].
pub fn blob_exists(digest: &str) -> Result<bool> {
    with_client(|client| client.blob_exists(digest))
}

/// See [`Ollama::create_blob`].
///
/// # Errors
///
/// As [`Ollama::create_blob`].
pub fn create_blob(digest: &str, data: impl Into<Vec<u8>>) -> Result<bool> {
    with_client(|client| client.create_blob(digest, data))
}

/// See [`Ollama::is_running`].
#[must_use]
pub fn is_running() -> bool {
    with_client(|client| Ok(client.is_running())).unwrap_or(false)
}

/// See [`Ollama::get_version`].
///
/// # Errors
///
/// As [`Ollama::get_version`].
pub fn get_version() -> Result<String> {
    with_client(Ollama::get_version)
}
