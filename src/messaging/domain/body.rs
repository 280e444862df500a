//! Message body payloads.
//!
//! A message carries exactly one payload kind: plain text or an image
//! reference. The variants are mutually exclusive by construction; emptiness
//! is rejected when the owning [`Message`](super::Message) is built.

use serde::{Deserialize, Serialize};

/// The payload of a message.
///
/// # Serialisation
///
/// Bodies are serialised with a `type` tag field:
///
/// ```json
/// { "type": "text", "text": "Is this still available?" }
/// { "type": "image", "url": "https://cdn.example/photo.jpg" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain text content.
    Text(TextBody),
    /// A reference to an uploaded image.
    Image(ImageRef),
}

impl MessageBody {
    /// Creates a text body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextBody::new(text))
    }

    /// Creates an image body.
    #[must_use]
    pub fn image(url: impl Into<String>) -> Self {
        Self::Image(ImageRef::new(url))
    }

    /// Returns `true` if the payload carries no usable content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Image(image) => image.is_empty(),
        }
    }

    /// Returns a short preview suitable for conversation list rows.
    #[must_use]
    pub fn preview(&self) -> &str {
        match self {
            Self::Text(text) => &text.text,
            Self::Image(_) => "[image]",
        }
    }
}

/// Text content within a message.
///
/// # Examples
///
/// ```
/// use veranda::messaging::domain::TextBody;
///
/// let text = TextBody::new("Is this still available?");
/// assert!(!text.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    /// The text content.
    pub text: String,
}

impl TextBody {
    /// Creates a new text body.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Returns `true` if the text content is empty or whitespace-only.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An image reference within a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Location of the uploaded image.
    pub url: String,
}

impl ImageRef {
    /// Creates a new image reference.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Returns `true` if the reference is empty or whitespace-only.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.trim().is_empty()
    }
}
