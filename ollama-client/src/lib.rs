//! Ollama Client - A blocking Rust client for the Ollama HTTP API
//!
//! This crate covers text generation, chat, embeddings and model management
//! against a local or remote Ollama server. Replies are delivered either as a
//! single aggregated [`Response`] or frame by frame to a [`ResponseSink`]
//! while the server streams them.
//!
//! ```rust,no_run
//! use ollama_client::prelude::*;
//!
//! let ollama = Ollama::with_defaults()?;
//! let reply = ollama.generate(Request::generate("llama3", "Why is the sky blue?"))?;
//! println!("{reply}");
//!
//! ollama.generate_stream(Request::generate("llama3", "Tell me a joke."), |frame: Response| {
//!     print!("{frame}");
//!     StreamControl::Continue
//! })?;
//! # Ok::<(), ollama_client::Error>(())
//! ```
//!
//! Error propagation and wire logging are governed by the process-wide
//! switches in [`policy`].

pub mod client;
pub mod config;
pub mod error;
pub mod facade;
pub mod image;
pub mod json;
pub mod message;
pub mod mode;
pub mod options;
pub mod policy;
pub mod prelude;
pub mod request;
pub mod response;
pub mod stream;
mod transport;

pub use client::Ollama;
pub use config::OllamaConfig;
pub use error::{Error, Result};
pub use image::Image;
pub use message::Message;
pub use mode::MessageMode;
pub use options::Options;
pub use request::{EmbeddingInput, Request};
pub use response::{Response, Usage};
pub use stream::{NdjsonDecoder, ResponseSink, StreamControl};
