//! Message modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of exchange a request or response belongs to.
///
/// The mode decides which endpoint a request is sent to and which payload
/// field of a response is its natural-language projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageMode {
    /// Single-prompt completion (`/api/generate`).
    #[default]
    Generation,
    /// Multi-turn chat completion (`/api/chat`).
    Chat,
    /// Vector embedding (`/api/embed`).
    Embedding,
}

impl MessageMode {
    /// The API path serving this mode.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Generation => "/api/generate",
            Self::Chat => "/api/chat",
            Self::Embedding => "/api/embed",
        }
    }

    /// Whether the server can stream replies for this mode.
    #[must_use]
    pub const fn streams(self) -> bool {
        matches!(self, Self::Generation | Self::Chat)
    }
}

impl fmt::Display for MessageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generation => "generation",
            Self::Chat => "chat",
            Self::Embedding => "embedding",
        })
    }
}
