//! Chat messages.

use serde::{Deserialize, Serialize};

use crate::image::Image;

/// One turn of a chat conversation.
///
/// Roles are free-form; the server understands `system`, `user`,
/// `assistant` and `tool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the turn.
    pub role: String,
    /// Text of the turn.
    pub content: String,
    /// Images attached to this turn only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Image>>,
}

impl Message {
    /// Create a message with an arbitrary role.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            images: None,
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Create a tool result message.
    #[must_use]
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new("tool", content)
    }

    /// Attach images to this message.
    #[must_use]
    pub fn with_images(mut self, images: impl Into<Vec<Image>>) -> Self {
        self.images = Some(images.into());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn role_constructors() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
        assert_eq!(Message::tool("t").role, "tool");
        assert_eq!(Message::new("narrator", "n").role, "narrator");
    }

    #[test]
    fn images_omitted_when_absent() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn images_serialise_as_base64_strings() {
        let msg = Message::user("look").with_images(vec![Image::from_base64("QUJD")]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["images"], serde_json::json!(["QUJD"]));
    }

    #[test]
    fn single_image_is_promoted_to_a_list() {
        let msg = Message::user("look").with_images(Image::from_base64("QUJD"));
        assert_eq!(msg.images, Some(vec![Image::from_base64("QUJD")]));
    }

    #[test]
    fn deserialises_server_message() {
        let msg: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"sure"}"#).unwrap();
        assert_eq!(msg, Message::assistant("sure"));
    }
}
