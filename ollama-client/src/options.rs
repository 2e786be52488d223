//! Sampling and runtime options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::Object;

/// Options forwarded verbatim under the `options` key of a request.
///
/// Names are not validated; anything set here reaches the server as-is.
/// Typed setters exist for the common knobs.
///
/// ```rust
/// use ollama_client::Options;
///
/// let options = Options::new().seed(1).temperature(0.0).num_predict(18);
/// assert_eq!(options.get("seed"), Some(&1.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Object);

impl Options {
    /// Create an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option. Last write wins.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set an arbitrary option in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Read an option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove an option.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Random seed for reproducible sampling.
    #[must_use]
    pub fn seed(self, seed: i64) -> Self {
        self.set("seed", seed)
    }

    /// Sampling temperature.
    #[must_use]
    pub fn temperature(self, temperature: f64) -> Self {
        self.set("temperature", temperature)
    }

    /// Nucleus sampling threshold.
    #[must_use]
    pub fn top_p(self, top_p: f64) -> Self {
        self.set("top_p", top_p)
    }

    /// Top-k sampling cutoff.
    #[must_use]
    pub fn top_k(self, top_k: i64) -> Self {
        self.set("top_k", top_k)
    }

    /// Maximum number of tokens to generate.
    #[must_use]
    pub fn num_predict(self, tokens: i64) -> Self {
        self.set("num_predict", tokens)
    }

    /// Context window size.
    #[must_use]
    pub fn num_ctx(self, tokens: i64) -> Self {
        self.set("num_ctx", tokens)
    }

    /// Stop sequences.
    #[must_use]
    pub fn stop(self, sequences: Vec<String>) -> Self {
        self.set("stop", sequences)
    }

    pub(crate) fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Object> for Options {
    fn from(map: Object) -> Self {
        Self(map)
    }
}
