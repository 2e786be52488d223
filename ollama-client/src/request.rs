//! Request envelope.
//!
//! A [`Request`] is an open JSON object tagged with a [`MessageMode`].
//! Mode-aware constructors fill in the fields each endpoint requires, and a
//! keyed setter lets callers hand-roll anything else (tools, structured
//! output schemas, server-specific flags).
//!
//! ```rust
//! use ollama_client::{Message, Options, Request};
//!
//! let request = Request::chat("llama3", vec![Message::user("Why is the sky blue?")])
//!     .options(Options::new().temperature(0.0))
//!     .with("think", false);
//! ```

use std::ops::Index;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::json::{self, Object};
use crate::message::Message;
use crate::mode::MessageMode;
use crate::options::Options;
use crate::response::Response;

/// Keep-alive applied by the chat and embedding constructors.
pub const DEFAULT_KEEP_ALIVE: &str = "5m";

static NULL: Value = Value::Null;

/// Input of an embedding request: one text or a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    /// A single text.
    Single(String),
    /// Several texts embedded in one call.
    Batch(Vec<String>),
}

impl From<&str> for EmbeddingInput {
    fn from(text: &str) -> Self {
        Self::Single(text.to_owned())
    }
}

impl From<String> for EmbeddingInput {
    fn from(text: String) -> Self {
        Self::Single(text)
    }
}

impl From<Vec<String>> for EmbeddingInput {
    fn from(texts: Vec<String>) -> Self {
        Self::Batch(texts)
    }
}

impl From<Vec<&str>> for EmbeddingInput {
    fn from(texts: Vec<&str>) -> Self {
        Self::Batch(texts.into_iter().map(str::to_owned).collect())
    }
}

impl From<EmbeddingInput> for Value {
    fn from(input: EmbeddingInput) -> Self {
        match input {
            EmbeddingInput::Single(text) => Self::String(text),
            EmbeddingInput::Batch(texts) => texts.into(),
        }
    }
}

impl From<Image> for Value {
    fn from(image: Image) -> Self {
        Self::String(image.into())
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        let mut map = Object::new();
        map.insert("role".to_owned(), message.role.into());
        map.insert("content".to_owned(), message.content.into());
        if let Some(images) = message.images {
            map.insert("images".to_owned(), images_value(images));
        }
        Self::Object(map)
    }
}

fn images_value(images: Vec<Image>) -> Value {
    Value::Array(images.into_iter().map(Value::from).collect())
}

/// A request to one of the model endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    mode: MessageMode,
    fields: Object,
}

impl Request {
    /// Create an empty request for the given mode.
    ///
    /// Streaming-capable modes start with `stream: false`.
    #[must_use]
    pub fn new(mode: MessageMode) -> Self {
        let mut fields = Object::new();
        if mode.streams() {
            fields.insert("stream".to_owned(), Value::Bool(false));
        }
        Self { mode, fields }
    }

    /// Create a generation request.
    #[must_use]
    pub fn generate(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::new(MessageMode::Generation)
            .with("model", model.into())
            .with("prompt", prompt.into())
    }

    /// Create a chat request.
    #[must_use]
    pub fn chat(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self::new(MessageMode::Chat)
            .with("model", model.into())
            .messages(messages)
            .keep_alive(DEFAULT_KEEP_ALIVE)
    }

    /// Create an embedding request.
    #[must_use]
    pub fn embedding(model: impl Into<String>, input: impl Into<EmbeddingInput>) -> Self {
        Self::new(MessageMode::Embedding)
            .with("model", model.into())
            .with("input", input.into())
            .truncate(true)
            .keep_alive(DEFAULT_KEEP_ALIVE)
    }

    /// Rebuild a request from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArgument`] when `value` is not a JSON object.
    pub fn from_json(mode: MessageMode, value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(Error::bad_argument("request must be a JSON object"));
        };
        let mut request = Self::new(mode);
        for (key, value) in map {
            request.set(key, value);
        }
        Ok(request)
    }

    /// Parse a request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJson`] for malformed text and
    /// [`Error::BadArgument`] for non-object documents.
    pub fn parse(mode: MessageMode, text: &str) -> Result<Self> {
        Self::from_json(mode, json::parse(text)?)
    }

    /// The mode this request is dispatched under.
    #[must_use]
    pub const fn mode(&self) -> MessageMode {
        self.mode
    }

    /// Set a field. Last write wins; setting `null` removes the field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        match value.into() {
            Value::Null => {
                self.fields.remove(&key);
            }
            value => {
                self.fields.insert(key, value);
            }
        }
        self
    }

    /// Builder form of [`Request::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Read a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Whether a field is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The model name, if set.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        json::str_field_of(&self.fields, "model")
    }

    /// Whether the request asks for a streamed reply.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.get("stream").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Set the `stream` flag.
    #[must_use]
    pub fn stream(self, stream: bool) -> Self {
        self.with("stream", stream)
    }

    /// Attach sampling options.
    #[must_use]
    pub fn options(self, options: Options) -> Self {
        self.with("options", options.into_value())
    }

    /// Attach images to a generation request.
    #[must_use]
    pub fn images(self, images: impl Into<Vec<Image>>) -> Self {
        self.with("images", images_value(images.into()))
    }

    /// Replace the chat history.
    #[must_use]
    pub fn messages(self, messages: Vec<Message>) -> Self {
        let messages: Vec<Value> = messages.into_iter().map(Value::from).collect();
        self.with("messages", messages)
    }

    /// Append one turn to the chat history.
    pub fn push_message(&mut self, message: Message) -> &mut Self {
        match self.fields.get_mut("messages") {
            Some(Value::Array(messages)) => messages.push(message.into()),
            _ => {
                self.fields
                    .insert("messages".to_owned(), Value::Array(vec![message.into()]));
            }
        }
        self
    }

    /// Continue from a previous generation by copying its `context`.
    ///
    /// Does nothing when the previous response carries no context.
    #[must_use]
    pub fn context(self, previous: &Response) -> Self {
        match previous.context() {
            Some(context) => self.with("context", context.clone()),
            None => self,
        }
    }

    /// Request structured output: `"json"` or a JSON schema object.
    #[must_use]
    pub fn format(self, format: impl Into<Value>) -> Self {
        self.with("format", format)
    }

    /// Offer tools (function definitions) to the model.
    #[must_use]
    pub fn tools(self, tools: Value) -> Self {
        self.with("tools", tools)
    }

    /// How long the server keeps the model loaded after this call.
    #[must_use]
    pub fn keep_alive(self, duration: impl Into<String>) -> Self {
        self.with("keep_alive", duration.into())
    }

    /// Whether over-long embedding input is truncated instead of rejected.
    #[must_use]
    pub fn truncate(self, truncate: bool) -> Self {
        self.with("truncate", truncate)
    }

    /// Check that the fields the mode requires are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArgument`] naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        if self.model().is_none_or(str::is_empty) {
            return Err(Error::bad_argument("request has no model"));
        }
        match self.mode {
            MessageMode::Generation if !matches!(self.get("prompt"), Some(Value::String(_))) => {
                Err(Error::bad_argument("generation request has no prompt"))
            }
            MessageMode::Chat if !matches!(self.get("messages"), Some(Value::Array(_))) => {
                Err(Error::bad_argument("chat request has no messages"))
            }
            MessageMode::Embedding
                if !matches!(self.get("input"), Some(Value::String(_) | Value::Array(_))) =>
            {
                Err(Error::bad_argument("embedding request has no input"))
            }
            _ => Ok(()),
        }
    }

    /// The wire form of this request.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = self.fields.clone();
        if self.mode.streams() && !map.contains_key("stream") {
            map.insert("stream".to_owned(), Value::Bool(false));
        }
        Value::Object(map)
    }

    /// Serialise to compact JSON text.
    ///
    /// # Errors
    ///
    /// Never fails for requests built from JSON values; the signature mirrors
    /// [`json::dump`].
    pub fn dump(&self) -> Result<String> {
        json::dump(&self.to_json())
    }

    pub(crate) fn set_stream(&mut self, stream: bool) {
        self.set("stream", stream);
    }

    pub(crate) fn default_keep_alive(&mut self, keep_alive: Option<&str>) {
        if let Some(keep_alive) = keep_alive
            && !self.contains("keep_alive")
        {
            self.set("keep_alive", keep_alive);
        }
    }
}

impl Index<&str> for Request {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.fields.get(key).unwrap_or(&NULL)
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    mod constructors {
        use super::*;

        #[test]
        fn generation_matches_wire_shape() {
            let request = Request::generate("m", "hi");
            assert_eq!(
                request.to_json(),
                json!({"model": "m", "prompt": "hi", "stream": false})
            );
            assert_eq!(request.mode(), MessageMode::Generation);
        }

        #[test]
        fn chat_carries_history_and_keep_alive() {
            let request = Request::chat(
                "m",
                vec![
                    Message::user("hi"),
                    Message::assistant("hey"),
                    Message::user("more?"),
                ],
            );
            assert_eq!(
                request.to_json(),
                json!({
                    "model": "m",
                    "messages": [
                        {"role": "user", "content": "hi"},
                        {"role": "assistant", "content": "hey"},
                        {"role": "user", "content": "more?"}
                    ],
                    "stream": false,
                    "keep_alive": "5m"
                })
            );
            assert!(request.get("format").is_none());
        }

        #[test]
        fn embedding_defaults() {
            let request = Request::embedding("m", "x");
            assert_eq!(
                request.to_json(),
                json!({"model": "m", "input": "x", "truncate": true, "keep_alive": "5m"})
            );
            assert!(request.get("stream").is_none());
        }

        #[test]
        fn embedding_batch_input() {
            let request = Request::embedding("m", vec!["a", "b"]);
            assert_eq!(request["input"], json!(["a", "b"]));
        }

        #[test]
        fn untyped_request_for_tools() {
            let request = Request::new(MessageMode::Chat)
                .with("model", "llama3.1")
                .messages(vec![Message::user("weather in Madrid?")])
                .tools(json!([{"type": "function", "function": {"name": "get_current_weather"}}]));
            assert!(request.validate().is_ok());
            assert_eq!(request["tools"][0]["function"]["name"], "get_current_weather");
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn last_write_wins() {
            let mut request = Request::generate("m", "first");
            request.set("prompt", "second");
            assert_eq!(request["prompt"], "second");
        }

        #[test]
        fn null_removes_field() {
            let mut request = Request::generate("m", "p").format("json");
            request.set("format", Value::Null);
            assert!(!request.contains("format"));
            assert!(!request.dump().unwrap().contains("format"));
        }

        #[test]
        fn stream_always_serialised() {
            let mut request = Request::generate("m", "p");
            request.remove("stream");
            assert_eq!(request.to_json()["stream"], json!(false));
        }

        #[test]
        fn index_of_missing_key_is_null() {
            assert_eq!(Request::generate("m", "p")["nothing"], Value::Null);
        }

        #[test]
        fn options_nest_under_options_key() {
            let request = Request::generate("m", "p").options(Options::new().seed(1).set("x", "y"));
            assert_eq!(request["options"], json!({"seed": 1, "x": "y"}));
        }

        #[test]
        fn push_message_appends() {
            let mut request = Request::new(MessageMode::Chat).with("model", "m");
            request.push_message(Message::user("a"));
            request.push_message(Message::assistant("b"));
            assert_eq!(request["messages"].as_array().unwrap().len(), 2);
        }

        #[test]
        fn message_images_stay_on_message() {
            let request = Request::chat(
                "llava",
                vec![Message::user("what is this?").with_images(vec![Image::from_base64("QQ==")])],
            );
            assert_eq!(request["messages"][0]["images"], json!(["QQ=="]));
            assert!(!request.contains("images"));
        }

        #[test]
        fn generation_images_are_top_level() {
            let request = Request::generate("llava", "describe")
                .images(vec![Image::from_base64("QQ=="), Image::from_base64("Qg==")]);
            assert_eq!(request["images"], json!(["QQ==", "Qg=="]));
        }

        #[test]
        fn config_keep_alive_only_fills_gaps() {
            let mut generation = Request::generate("m", "p");
            generation.default_keep_alive(Some("10m"));
            assert_eq!(generation["keep_alive"], "10m");

            let mut chat = Request::chat("m", vec![Message::user("x")]);
            chat.default_keep_alive(Some("10m"));
            assert_eq!(chat["keep_alive"], "5m");
        }
    }

    mod context {
        use super::*;

        #[test]
        fn copies_context_from_previous_response() {
            let previous = Response::parse(
                r#"{"response":"ok","done":true,"context":[1,2,3]}"#,
                MessageMode::Generation,
            )
            .unwrap();
            let request = Request::generate("m", "again").context(&previous);
            assert_eq!(request.to_json()["context"], json!([1, 2, 3]));
        }

        #[test]
        fn missing_context_is_ignored() {
            let previous =
                Response::parse(r#"{"response":"ok","done":true}"#, MessageMode::Generation)
                    .unwrap();
            let request = Request::generate("m", "again").context(&previous);
            assert!(!request.contains("context"));
        }
    }

    mod validate {
        use super::*;

        #[test]
        fn requires_model() {
            let err = Request::new(MessageMode::Generation)
                .with("prompt", "p")
                .validate()
                .unwrap_err();
            assert!(matches!(err, Error::BadArgument(_)));
            assert!(Request::generate("", "p").validate().is_err());
        }

        #[test]
        fn requires_mode_payload() {
            let base = |mode| Request::new(mode).with("model", "m");
            assert!(base(MessageMode::Generation).validate().is_err());
            assert!(base(MessageMode::Chat).validate().is_err());
            assert!(base(MessageMode::Embedding).validate().is_err());
            assert!(Request::generate("m", "").validate().is_ok());
        }
    }

    mod round_trip {
        use super::*;

        #[test]
        fn parse_rejects_non_objects() {
            assert!(matches!(
                Request::parse(MessageMode::Chat, "[1]"),
                Err(Error::BadArgument(_))
            ));
            assert!(matches!(
                Request::parse(MessageMode::Chat, "{"),
                Err(Error::InvalidJson { .. })
            ));
        }

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-z ]{0,12}".prop_map(Value::from),
                prop::collection::vec(any::<u32>(), 0..4).prop_map(Value::from),
            ]
        }

        proptest! {
            #[test]
            fn serialised_form_parses_back(
                model in "[a-z0-9:]{1,12}",
                prompt in ".{0,40}",
                stream in any::<bool>(),
                extras in prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..5),
            ) {
                let mut request = Request::generate(model, prompt).stream(stream);
                for (key, value) in extras {
                    request.set(key, value);
                }
                let text = request.dump().unwrap();
                let back = Request::parse(MessageMode::Generation, &text).unwrap();
                prop_assert_eq!(back, request);
            }
        }
    }
}
