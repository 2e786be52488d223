//! Parsed server replies.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::error::Result;
use crate::json::{self, Object};
use crate::message::Message;
use crate::mode::MessageMode;

/// Token counters reported on the final frame of a generation or chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the prompt (`prompt_eval_count`).
    pub input_tokens: u32,
    /// Tokens generated (`eval_count`).
    pub output_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

impl Usage {
    /// Create usage statistics.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens.saturating_add(output_tokens),
        }
    }
}

/// One server payload, parsed under the mode of the request that produced it.
///
/// A default response is empty and invalid; it stands in for a failed call
/// when exceptions are disabled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    raw: String,
    json: Value,
    mode: MessageMode,
    error: Option<String>,
    valid: bool,
}

impl Response {
    /// Parse a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`](crate::Error::InvalidJson) when `raw`
    /// is not valid JSON.
    pub fn parse(raw: impl Into<String>, mode: MessageMode) -> Result<Self> {
        let raw = raw.into();
        let json = json::parse(&raw)?;
        Ok(Self::from_parts(raw, json, mode))
    }

    pub(crate) fn from_object(raw: String, object: Object, mode: MessageMode) -> Self {
        Self::from_parts(raw, Value::Object(object), mode)
    }

    fn from_parts(raw: String, json: Value, mode: MessageMode) -> Self {
        let error = json
            .get("error")
            .filter(|e| !e.is_null())
            .map(|e| match e {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            });
        Self {
            raw,
            json,
            mode,
            error,
            valid: true,
        }
    }

    /// An invalid response recording why the call failed.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the payload was received and parsed.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// The mode the payload was parsed under.
    #[must_use]
    pub const fn mode(&self) -> MessageMode {
        self.mode
    }

    /// The payload exactly as received.
    #[must_use]
    pub fn as_json_string(&self) -> &str {
        &self.raw
    }

    /// The parsed payload.
    #[must_use]
    pub const fn as_json(&self) -> &Value {
        &self.json
    }

    /// Consume the response, keeping the parsed payload.
    #[must_use]
    pub fn into_json(self) -> Value {
        self.json
    }

    /// The natural-language projection of the payload.
    ///
    /// `response` for generations, `message.content` for chats and the JSON
    /// text of the embedding vectors for embeddings. Empty when the field is
    /// missing.
    #[must_use]
    pub fn as_simple_string(&self) -> Cow<'_, str> {
        match self.mode {
            MessageMode::Generation => borrowed(json::str_field(&self.json, "response")),
            MessageMode::Chat => borrowed(
                self.json
                    .get("message")
                    .and_then(|m| json::str_field(m, "content")),
            ),
            MessageMode::Embedding => self
                .embedding_value()
                .map_or(Cow::Borrowed(""), |v| Cow::Owned(v.to_string())),
        }
    }

    /// Whether the payload carries an `error` field or the call failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// The error text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The error text, or an empty string.
    #[must_use]
    pub fn get_error(&self) -> &str {
        self.error().unwrap_or_default()
    }

    /// Whether this is the final frame of its reply.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.json.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Why generation stopped (`stop`, `length`, ...).
    #[must_use]
    pub fn done_reason(&self) -> Option<&str> {
        json::str_field(&self.json, "done_reason")
    }

    /// The model that produced the payload.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        json::str_field(&self.json, "model")
    }

    /// The opaque generation context to feed into the next request.
    #[must_use]
    pub fn context(&self) -> Option<&Value> {
        self.json.get("context").filter(|c| c.is_array())
    }

    /// The chat message of a chat payload.
    #[must_use]
    pub fn message(&self) -> Option<Message> {
        self.json
            .get("message")
            .and_then(|m| serde_json::from_value(m.clone()).ok())
    }

    /// Tool calls requested by the model in a chat payload.
    #[must_use]
    pub fn tool_calls(&self) -> Option<&Vec<Value>> {
        self.json
            .get("message")
            .and_then(|m| m.get("tool_calls"))
            .and_then(Value::as_array)
    }

    /// Embedding vectors of an embedding payload.
    ///
    /// A single legacy `embedding` vector is returned as a one-element batch.
    #[must_use]
    pub fn embeddings(&self) -> Option<Vec<Vec<f32>>> {
        if let Some(batch) = self.json.get("embeddings") {
            return serde_json::from_value(batch.clone()).ok();
        }
        self.json
            .get("embedding")
            .and_then(|single| serde_json::from_value::<Vec<f32>>(single.clone()).ok())
            .map(|vector| vec![vector])
    }

    /// Token counters, when the payload reports both.
    #[must_use]
    pub fn usage(&self) -> Option<Usage> {
        let count = |key| {
            self.json
                .get(key)
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };
        Some(Usage::new(
            count("prompt_eval_count")?,
            count("eval_count")?,
        ))
    }

    fn embedding_value(&self) -> Option<&Value> {
        self.json
            .get("embeddings")
            .or_else(|| self.json.get("embedding"))
    }
}

fn borrowed(text: Option<&str>) -> Cow<'_, str> {
    Cow::Borrowed(text.unwrap_or_default())
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_simple_string())
    }
}
