//! Ollama API client implementation.
//!
//! [`Ollama`] dispatches every operation of the Ollama HTTP API. Model calls
//! (generate, chat, embed) take a [`Request`] and come in two flavours:
//!
//! - aggregated: one [`Response`] built from the whole reply body;
//! - streaming: every NDJSON frame is handed to a [`ResponseSink`] as soon as
//!   it is complete, on the calling thread.
//!
//! All public operations honour the process-wide exception policy in
//! [`crate::policy`]. Model-management calls reject an empty model name
//! with [`Error::BadArgument`] before anything is sent.

use std::path::Path;

use serde_json::{Value, json};

use crate::config::OllamaConfig;
use crate::error::{Error, Result};
use crate::json;
use crate::mode::MessageMode;
use crate::policy;
use crate::request::Request;
use crate::response::Response;
use crate::stream::{NdjsonDecoder, ResponseSink, StreamControl};
use crate::transport::{HttpReply, StreamOutcome, Transport};

const RUNNING_BANNER: &str = "Ollama is running";

/// Ollama API client.
#[derive(Debug, Clone)]
pub struct Ollama {
    config: OllamaConfig,
    transport: Transport,
}

#[derive(Debug, Clone, Copy)]
enum Verb {
    Post,
    Delete,
}

impl Ollama {
    /// Create a new Ollama client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OllamaConfig::default())
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(OllamaConfig::new().base_url(base_url))
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Point the client at another server. The HTTP client is rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be rebuilt.
    pub fn set_server_url(&mut self, base_url: impl Into<String>) -> Result<()> {
        let base_url = base_url.into();
        policy::settle(self.transport.set_base_url(base_url.clone()).map(|()| {
            self.config.base_url = base_url;
        }))
    }

    /// Set the read timeout in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be rebuilt.
    pub fn set_read_timeout(&mut self, secs: u64) -> Result<()> {
        let config = self.config.clone().read_timeout(secs);
        policy::settle(
            self.transport
                .set_read_timeout(config.read_timeout_duration())
                .map(|()| self.config = config),
        )
    }

    /// Set the write timeout in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be rebuilt.
    pub fn set_write_timeout(&mut self, secs: u64) -> Result<()> {
        let config = self.config.clone().write_timeout(secs);
        policy::settle(
            self.transport
                .set_write_timeout(config.write_timeout_duration())
                .map(|()| self.config = config),
        )
    }

    /// Run a generation and return the complete reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArgument`] for a non-generation or incomplete
    /// request, [`Error::Server`] when the reply carries an `error` field,
    /// and transport, status or JSON errors from the exchange.
    pub fn generate(&self, request: Request) -> Result<Response> {
        policy::settle_response(self.send(request, MessageMode::Generation))
    }

    /// Run a generation, handing each streamed frame to `sink`.
    ///
    /// Returns `true` once the server finishes the stream and `false` when
    /// the sink stopped it early.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate). An `error` frame is delivered to the
    /// sink before the stream is aborted with [`Error::Server`].
    pub fn generate_stream(&self, request: Request, sink: impl ResponseSink) -> Result<bool> {
        policy::settle(self.stream(request, MessageMode::Generation, sink))
    }

    /// Run a chat turn and return the complete reply.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate), for chat requests.
    pub fn chat(&self, request: Request) -> Result<Response> {
        policy::settle_response(self.send(request, MessageMode::Chat))
    }

    /// Run a chat turn, handing each streamed frame to `sink`.
    ///
    /// # Errors
    ///
    /// As [`generate_stream`](Self::generate_stream), for chat requests.
    pub fn chat_stream(&self, request: Request, sink: impl ResponseSink) -> Result<bool> {
        policy::settle(self.stream(request, MessageMode::Chat, sink))
    }

    /// Compute embeddings.
    ///
    /// # Errors
    ///
    /// As [`generate`](Self::generate), for embedding requests.
    pub fn embed(&self, request: Request) -> Result<Response> {
        policy::settle_response(self.send(request, MessageMode::Embedding))
    }

    /// Ask the server to load `model` into memory.
    ///
    /// Returns the `done` flag of the empty generation used to trigger it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] for an unknown model, plus transport,
    /// status, JSON and server errors.
    pub fn load_model(&self, model: &str) -> Result<bool> {
        policy::settle(self.try_load_model(model))
    }

    /// Download `model` from the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] on 404, plus transport, status and
    /// server errors.
    pub fn pull_model(&self, model: &str, insecure: bool) -> Result<bool> {
        let payload = json!({"name": model, "insecure": insecure, "stream": false});
        policy::settle(
            require_name("model", model)
                .and_then(|()| self.exchange(Verb::Post, "/api/pull", &payload, Some(model)))
                .map(|_| true),
        )
    }

    /// Upload `model` to the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] on 404, plus transport, status and
    /// server errors.
    pub fn push_model(&self, model: &str, insecure: bool) -> Result<bool> {
        let payload = json!({"name": model, "insecure": insecure, "stream": false});
        policy::settle(
            require_name("model", model)
                .and_then(|()| self.exchange(Verb::Post, "/api/push", &payload, Some(model)))
                .map(|_| true),
        )
    }

    /// Copy `source` to a new model named `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] when `source` does not exist, plus
    /// transport and status errors.
    pub fn copy_model(&self, source: &str, destination: &str) -> Result<bool> {
        let payload = json!({"source": source, "destination": destination});
        policy::settle(
            require_name("source", source)
                .and_then(|()| require_name("destination", destination))
                .and_then(|()| self.exchange(Verb::Post, "/api/copy", &payload, Some(source)))
                .map(|_| true),
        )
    }

    /// Delete `model` from the server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] on 404, plus transport and status
    /// errors.
    pub fn delete_model(&self, model: &str) -> Result<bool> {
        let payload = json!({"name": model});
        policy::settle(
            require_name("model", model)
                .and_then(|()| self.exchange(Verb::Delete, "/api/delete", &payload, Some(model)))
                .map(|_| true),
        )
    }

    /// Create `name` from the text of a Modelfile.
    ///
    /// # Errors
    ///
    /// Returns transport, status, JSON and server errors.
    pub fn create_model(&self, name: &str, modelfile: &str) -> Result<bool> {
        policy::settle(self.try_create_model(name, modelfile))
    }

    /// Create `name` from a Modelfile on disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::File`] when the Modelfile cannot be read, and
    /// everything [`create_model`](Self::create_model) returns.
    pub fn create_model_from_file(&self, name: &str, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        policy::settle(
            std::fs::read_to_string(path)
                .map_err(|e| Error::file(path, e))
                .and_then(|modelfile| self.try_create_model(name, &modelfile)),
        )
    }

    /// Details of `model`: Modelfile, parameters, template and so on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotFound`] on 404, plus transport, status and
    /// JSON errors.
    pub fn show_model_info(&self, model: &str, verbose: bool) -> Result<Value> {
        let mut payload = json!({"name": model});
        if verbose {
            payload["verbose"] = Value::Bool(true);
        }
        policy::settle(
            require_name("model", model)
                .and_then(|()| self.exchange(Verb::Post, "/api/show", &payload, Some(model))),
        )
    }

    /// Names of the locally available models.
    ///
    /// # Errors
    ///
    /// Returns transport, status and JSON errors.
    pub fn list_models(&self) -> Result<Vec<String>> {
        policy::settle(self.fetch("/api/tags").map(|tags| model_names(&tags)))
    }

    /// The raw reply of `/api/tags`.
    ///
    /// # Errors
    ///
    /// Returns transport, status and JSON errors.
    pub fn list_models_json(&self) -> Result<Value> {
        policy::settle(self.fetch("/api/tags"))
    }

    /// Names of the models currently loaded in memory.
    ///
    /// # Errors
    ///
    /// Returns transport, status and JSON errors.
    pub fn list_running_models(&self) -> Result<Vec<String>> {
        policy::settle(self.fetch("/api/ps").map(|ps| model_names(&ps)))
    }

    /// The raw reply of `/api/ps`.
    ///
    /// # Errors
    ///
    /// Returns transport, status and JSON errors.
    pub fn running_models_json(&self) -> Result<Value> {
        policy::settle(self.fetch("/api/ps"))
    }

    /// Whether the server holds a blob with `digest`.
    ///
    /// # Errors
    ///
    /// Returns transport errors and status errors other than 404.
    pub fn blob_exists(&self, digest: &str) -> Result<bool> {
        policy::settle(self.try_blob_exists(digest))
    }

    /// Upload `data` as the blob `digest` (`sha256:<hex>`).
    ///
    /// # Errors
    ///
    /// Returns transport errors, and [`Error::HttpStatus`] when the server
    /// rejects the upload (e.g. a digest mismatch).
    pub fn create_blob(&self, digest: &str, data: impl Into<Vec<u8>>) -> Result<bool> {
        let path = format!("/api/blobs/{digest}");
        policy::settle(
            self.transport
                .post_bytes(&path, data.into())
                .and_then(|reply| reply.into_body(None))
                .map(|_| true),
        )
    }

    /// Whether an Ollama server answers at the base URL.
    ///
    /// Never fails: any transport error counts as not running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        match self.transport.get("/") {
            Ok(reply) => {
                policy::log_reply("/", &reply.body);
                reply.body == RUNNING_BANNER
            }
            Err(e) => {
                tracing::debug!(error = %e, "server is not reachable");
                false
            }
        }
    }

    /// The server version string.
    ///
    /// # Errors
    ///
    /// Returns transport, status and JSON errors.
    pub fn get_version(&self) -> Result<String> {
        policy::settle(self.fetch("/api/version").and_then(|reply| {
            json::str_field(&reply, "version")
                .map(str::to_owned)
                .ok_or_else(|| Error::invalid_json("reply has no version", reply.to_string()))
        }))
    }

    fn prepare(
        &self,
        request: &mut Request,
        expected: MessageMode,
        stream: bool,
    ) -> Result<String> {
        if request.mode() != expected {
            return Err(Error::bad_argument(format!(
                "{expected} operation received a {} request",
                request.mode()
            )));
        }
        request.validate()?;
        if expected.streams() {
            request.set_stream(stream);
        }
        request.default_keep_alive(self.config.keep_alive.as_deref());

        let body = request.dump()?;
        policy::log_request(expected.endpoint(), &body);
        Ok(body)
    }

    fn send(&self, mut request: Request, mode: MessageMode) -> Result<Response> {
        let body = self.prepare(&mut request, mode, false)?;
        let endpoint = mode.endpoint();
        let reply = self.transport.post_json(endpoint, body)?;
        policy::log_reply(endpoint, &reply.body);
        let text = reply.into_body(request.model())?;
        Response::parse(text, mode)
    }

    fn stream(
        &self,
        mut request: Request,
        mode: MessageMode,
        mut sink: impl ResponseSink,
    ) -> Result<bool> {
        let body = self.prepare(&mut request, mode, true)?;
        let endpoint = mode.endpoint();
        let mut decoder = NdjsonDecoder::new(mode);
        let mut failure = None;

        let outcome = self
            .transport
            .post_streaming(endpoint, body, request.model(), |chunk| {
                if policy::replies_logged() {
                    policy::log_reply(endpoint, &String::from_utf8_lossy(chunk));
                }
                deliver(decoder.feed(chunk), &mut sink, &mut failure)
            })?;

        if outcome == StreamOutcome::Completed && failure.is_none() {
            let control = deliver(decoder.finish()?, &mut sink, &mut failure);
            if failure.is_none() {
                return Ok(!control.is_stop());
            }
        }
        match failure {
            Some(message) => Err(Error::server(message)),
            None => Ok(outcome == StreamOutcome::Completed),
        }
    }

    fn try_load_model(&self, model: &str) -> Result<bool> {
        require_name("model", model)?;
        let mut payload = json!({"model": model, "prompt": "", "stream": false});
        if let Some(keep_alive) = &self.config.keep_alive {
            payload["keep_alive"] = Value::from(keep_alive.as_str());
        }
        let reply = self.exchange(Verb::Post, "/api/generate", &payload, Some(model))?;
        Ok(reply.get("done").and_then(Value::as_bool).unwrap_or(false))
    }

    fn try_create_model(&self, name: &str, modelfile: &str) -> Result<bool> {
        require_name("name", name)?;
        let payload = json!({"name": name, "modelfile": modelfile, "stream": false});
        let reply = self.exchange(Verb::Post, "/api/create", &payload, None)?;
        Ok(json::str_field(&reply, "status") == Some("success"))
    }

    fn try_blob_exists(&self, digest: &str) -> Result<bool> {
        let reply = self.transport.head(&format!("/api/blobs/{digest}"))?;
        match reply.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => reply.into_body(None).map(|_| false),
        }
    }

    fn exchange(
        &self,
        verb: Verb,
        path: &str,
        payload: &Value,
        model: Option<&str>,
    ) -> Result<Value> {
        let body = json::dump(payload)?;
        policy::log_request(path, &body);
        let reply = match verb {
            Verb::Post => self.transport.post_json(path, body)?,
            Verb::Delete => self.transport.delete_json(path, body)?,
        };
        read_reply(path, reply, model)
    }

    fn fetch(&self, path: &str) -> Result<Value> {
        let reply = self.transport.get(path)?;
        read_reply(path, reply, None)
    }
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::bad_argument(format!("{field} must not be empty")));
    }
    Ok(())
}

fn read_reply(path: &str, reply: HttpReply, model: Option<&str>) -> Result<Value> {
    policy::log_reply(path, &reply.body);
    let body = reply.into_body(model)?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value = json::parse(&body)?;
    match json::str_field(&value, "error") {
        Some(message) => Err(Error::server(message)),
        None => Ok(value),
    }
}

/// Hand frames to the sink until it stops or a frame reports an error.
fn deliver(
    frames: Vec<Response>,
    sink: &mut impl ResponseSink,
    failure: &mut Option<String>,
) -> StreamControl {
    for frame in frames {
        let error = frame.error().map(str::to_owned);
        let control = sink.on_event(frame);
        if let Some(message) = error {
            tracing::debug!(error = %message, "server reported an error mid-stream");
            *failure = Some(message);
            return StreamControl::Stop;
        }
        if control.is_stop() {
            return StreamControl::Stop;
        }
    }
    StreamControl::Continue
}

fn model_names(listing: &Value) -> Vec<String> {
    listing
        .get("models")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| json::str_field(m, "name"))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}
