//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ollama_client::prelude::*;
//! ```

pub use crate::client::Ollama;
pub use crate::config::OllamaConfig;
pub use crate::error::{Error, Result};
pub use crate::image::Image;
pub use crate::message::Message;
pub use crate::mode::MessageMode;
pub use crate::options::Options;
pub use crate::policy::{allow_exceptions, show_replies, show_requests};
pub use crate::request::{EmbeddingInput, Request};
pub use crate::response::{Response, Usage};
pub use crate::stream::{ResponseSink, StreamControl};
