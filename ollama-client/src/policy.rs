//! Diagnostics and error policy.
//!
//! Three process-wide switches control how the client behaves:
//!
//! - [`allow_exceptions`]: when enabled (the default) every failure is
//!   returned as `Err`. When disabled, public operations swallow the error,
//!   log it, and return a fallback value instead (`false`, an empty list, or
//!   an invalid [`Response`] carrying the error text).
//! - [`show_requests`]: log every serialised request body.
//! - [`show_replies`]: log every reply body, or every raw chunk while streaming.
//!
//! The switches are plain atomics meant to be set once during startup.
//! Wire logging goes to `tracing` under the [`WIRE_TARGET`] target.
//!
//! # Example
//!
//! ```rust
//! use ollama_client::policy;
//!
//! policy::allow_exceptions(false);
//! policy::show_requests(true);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::response::Response;

/// `tracing` target used for raw request/reply logging.
pub const WIRE_TARGET: &str = "ollama_client::wire";

static USE_EXCEPTIONS: AtomicBool = AtomicBool::new(true);
static LOG_REQUESTS: AtomicBool = AtomicBool::new(false);
static LOG_REPLIES: AtomicBool = AtomicBool::new(false);

/// Enable or disable error propagation for all public operations.
pub fn allow_exceptions(enable: bool) {
    USE_EXCEPTIONS.store(enable, Ordering::Relaxed);
}

/// Enable or disable logging of raw request bodies.
pub fn show_requests(enable: bool) {
    LOG_REQUESTS.store(enable, Ordering::Relaxed);
}

/// Enable or disable logging of raw reply bodies.
pub fn show_replies(enable: bool) {
    LOG_REPLIES.store(enable, Ordering::Relaxed);
}

/// Whether errors are propagated to the caller.
#[must_use]
pub fn exceptions_enabled() -> bool {
    USE_EXCEPTIONS.load(Ordering::Relaxed)
}

/// Whether request bodies are logged.
#[must_use]
pub fn requests_logged() -> bool {
    LOG_REQUESTS.load(Ordering::Relaxed)
}

/// Whether reply bodies are logged.
#[must_use]
pub fn replies_logged() -> bool {
    LOG_REPLIES.load(Ordering::Relaxed)
}

pub(crate) fn log_request(endpoint: &str, body: &str) {
    if requests_logged() {
        tracing::info!(target: WIRE_TARGET, endpoint, body, "request");
    }
}

pub(crate) fn log_reply(endpoint: &str, body: &str) {
    if replies_logged() {
        tracing::info!(target: WIRE_TARGET, endpoint, body, "reply");
    }
}

/// Value handed back in place of an error when exceptions are disabled.
pub trait Fallback {
    /// Build the fallback for a failed call.
    fn fallback(error: &Error) -> Self;
}

impl Fallback for () {
    fn fallback(_: &Error) -> Self {}
}

impl Fallback for bool {
    fn fallback(_: &Error) -> Self {
        false
    }
}

impl Fallback for String {
    fn fallback(_: &Error) -> Self {
        Self::new()
    }
}

impl<T> Fallback for Vec<T> {
    fn fallback(_: &Error) -> Self {
        Self::new()
    }
}

impl Fallback for Value {
    fn fallback(_: &Error) -> Self {
        Self::Null
    }
}

impl Fallback for Image {
    fn fallback(_: &Error) -> Self {
        Self::invalid()
    }
}

impl Fallback for Response {
    fn fallback(error: &Error) -> Self {
        Self::failed(error.to_string())
    }
}

/// Apply the exception policy to the outcome of a public operation.
///
/// With exceptions enabled the result passes through untouched. Otherwise an
/// error is logged and replaced by `T::fallback`, so the returned value is
/// always `Ok`.
///
/// # Errors
///
/// Returns the original error when exceptions are enabled.
pub fn settle<T: Fallback>(result: Result<T>) -> Result<T> {
    match result {
        Err(error) if !exceptions_enabled() => {
            tracing::debug!(error = %error, "suppressed error");
            Ok(T::fallback(&error))
        }
        other => other,
    }
}

/// Like [`settle`], but also promotes a response carrying an `error` field
/// to [`Error::Server`] when exceptions are enabled.
///
/// # Errors
///
/// Returns the original error, or [`Error::Server`], when exceptions are
/// enabled.
pub fn settle_response(result: Result<Response>) -> Result<Response> {
    let checked = result.and_then(|response| match response.error() {
        Some(message) if exceptions_enabled() => Err(Error::server(message)),
        _ => Ok(response),
    });
    settle(checked)
}
