//! Base64 image encoding.
//!
//! Vision-capable models accept images as base64 strings, either in the
//! top-level `images` array of a generation request or attached to an
//! individual chat [`Message`](crate::message::Message).

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::policy;

/// A base64-encoded image.
///
/// Serialises as its bare base64 string.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    base64: String,
    valid: bool,
}

impl Image {
    /// Read an image file and encode its bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::File`] when the file cannot be read and exceptions are
    /// enabled; otherwise an invalid, empty image is returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let read = std::fs::read(path)
            .map(|bytes| Self::from_bytes(&bytes))
            .map_err(|e| Error::file(path, e));
        policy::settle(read)
    }

    /// Encode raw image bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            base64: STANDARD.encode(bytes),
            valid: true,
        }
    }

    /// Wrap an already-encoded base64 string.
    #[must_use]
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self {
            base64: encoded.into(),
            valid: true,
        }
    }

    /// An empty image marking a failed load.
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            base64: String::new(),
            valid: false,
        }
    }

    /// The base64 text.
    #[must_use]
    pub fn as_base64(&self) -> &str {
        &self.base64
    }

    /// Whether the image was loaded successfully.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Decode back to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadArgument`] when the text is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.base64)
            .map_err(|e| Error::bad_argument(format!("invalid base64 image: {e}")))
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("len", &self.base64.len())
            .field("valid", &self.valid)
            .finish()
    }
}

impl From<Image> for String {
    fn from(image: Image) -> Self {
        image.base64
    }
}

/// A single image where a list is expected.
impl From<Image> for Vec<Image> {
    fn from(image: Image) -> Self {
        vec![image]
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.base64)
    }
}

impl<'de> Deserialize<'de> for Image {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_base64)
    }
}
