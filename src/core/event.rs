//! Event types exchanged between agent handlers and clients
//!
//! Everything a handler produces during a run is an [`Event`]. Events are
//! immutable once emitted and are recorded, in order, as the run's output.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the `content` of a part or artifact is encoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    #[default]
    Plain,
    Base64,
}

/// Author of a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[default]
    Agent,
}

/// One part of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub content_encoding: ContentEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

impl MessagePart {
    /// Create a part with the given content and MIME type
    pub fn new(content: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: None,
            content_type: content_type.into(),
            content: Some(content.into()),
            content_encoding: ContentEncoding::Plain,
            content_url: None,
        }
    }

    /// Create a `text/plain` part
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(content, "text/plain")
    }

    /// Create a base64 encoded part from raw bytes
    pub fn base64(bytes: impl AsRef<[u8]>, content_type: impl Into<String>) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            content_encoding: ContentEncoding::Base64,
            ..Self::new(encoded, content_type)
        }
    }

    /// Set the part name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Payload bytes with the content encoding removed
    ///
    /// Returns `None` when the part has no inline content or the base64
    /// payload is malformed.
    pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
        decode_content(self.content.as_deref()?, self.content_encoding)
    }
}

/// A message: an ordered sequence of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub role: MessageRole,
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Create an agent message from parts
    pub fn new(parts: Vec<MessagePart>) -> Self {
        Self {
            role: MessageRole::Agent,
            parts,
        }
    }

    /// Create a user message from parts
    pub fn user(parts: Vec<MessagePart>) -> Self {
        Self {
            role: MessageRole::User,
            parts,
        }
    }

    /// Create a single-part plain text agent message
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![MessagePart::text(text)])
    }

    /// Create a single-part plain text user message
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![MessagePart::text(text)])
    }

    /// Concatenated plain content of all parts
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter(|p| p.content_encoding == ContentEncoding::Plain)
            .filter_map(|p| p.content.as_deref())
            .collect()
    }
}

/// Named, typed output kept apart from conversational messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub content_encoding: ContentEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

impl Artifact {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content: Some(content.into()),
            content_encoding: ContentEncoding::Plain,
            content_url: None,
        }
    }

    /// Create a base64 encoded artifact from raw bytes
    pub fn base64(
        name: impl Into<String>,
        bytes: impl AsRef<[u8]>,
        content_type: impl Into<String>,
    ) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            content_encoding: ContentEncoding::Base64,
            ..Self::new(name, encoded, content_type)
        }
    }

    /// Payload bytes with the content encoding removed
    pub fn decoded_bytes(&self) -> Option<Vec<u8>> {
        decode_content(self.content.as_deref()?, self.content_encoding)
    }
}

fn decode_content(content: &str, encoding: ContentEncoding) -> Option<Vec<u8>> {
    match encoding {
        ContentEncoding::Plain => Some(content.as_bytes().to_vec()),
        ContentEncoding::Base64 => base64::engine::general_purpose::STANDARD
            .decode(content)
            .ok(),
    }
}

/// Request for externally supplied data before the handler may continue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwaitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AwaitRequest {
    /// An await request carrying a prompt message
    pub fn message(message: Message) -> Self {
        Self {
            message: Some(message),
            data: None,
        }
    }

    /// An await request carrying arbitrary data (e.g. a schema)
    pub fn data(data: Value) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }
}

/// Externally supplied payload that resumes a suspended handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwaitResume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AwaitResume {
    /// A resume payload carrying a message
    pub fn message(message: Message) -> Self {
        Self {
            message: Some(message),
            data: None,
        }
    }

    /// A resume payload carrying arbitrary data
    pub fn data(data: Value) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }
}

/// Free-form progress update from a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<String> for StatusUpdate {
    fn from(message: String) -> Self {
        StatusUpdate {
            message: Some(message),
            data: None,
        }
    }
}

impl From<&str> for StatusUpdate {
    fn from(message: &str) -> Self {
        StatusUpdate::from(message.to_string())
    }
}

/// One unit of handler output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Message(Message),
    Artifact(Artifact),
    Await(AwaitRequest),
    Status(StatusUpdate),
}

impl Event {
    /// Discriminant tag used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Message(_) => "message",
            Event::Artifact(_) => "artifact",
            Event::Await(_) => "await",
            Event::Status(_) => "status",
        }
    }

    /// Check if this event suspends the handler
    pub fn is_await(&self) -> bool {
        matches!(self, Event::Await(_))
    }

    /// Create a plain text message event
    pub fn text(text: impl Into<String>) -> Self {
        Event::Message(Message::text(text))
    }

    /// Create a status update event
    pub fn status(message: impl Into<String>) -> Self {
        Event::Status(StatusUpdate::from(message.into()))
    }

    /// The message carried by this event, if any
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Event::Message(message) => Some(message),
            _ => None,
        }
    }
}

impl From<Message> for Event {
    fn from(message: Message) -> Self {
        Event::Message(message)
    }
}

impl From<Artifact> for Event {
    fn from(artifact: Artifact) -> Self {
        Event::Artifact(artifact)
    }
}

impl From<AwaitRequest> for Event {
    fn from(request: AwaitRequest) -> Self {
        Event::Await(request)
    }
}

impl From<StatusUpdate> for Event {
    fn from(update: StatusUpdate) -> Self {
        Event::Status(update)
    }
}
