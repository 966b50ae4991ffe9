//! Event types for the Switchboard event bus
//!
//! This module defines the inbound and outbound message shapes exchanged
//! between connectors and the agent loop. Both are immutable once enqueued:
//! nothing downstream of `publish_*` mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An incoming conversational event from a connector (chat platform,
/// scheduler, CLI shim, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The connector this message came from (e.g., "telegram", "cron")
    pub connector: String,
    /// Unique identifier of the sender
    pub sender_id: String,
    /// Unique identifier of the conversation
    pub conversation_id: String,
    /// The text content of the message
    pub content: String,
    /// Optional media references attached by the connector
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,
    /// Session key for routing (format: "connector:conversation_id")
    pub session_key: String,
    /// When the message was accepted into the system
    pub received_at: DateTime<Utc>,
    /// Additional metadata key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// An outgoing reply to be delivered by a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// The connector to deliver this message through
    pub connector: String,
    /// The conversation to deliver to
    pub conversation_id: String,
    /// The text content to deliver
    pub content: String,
    /// Optional message ID this is a reply to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Additional metadata key-value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// A reference to media carried alongside a message. The core treats these
/// as opaque; only connectors and tool capabilities interpret them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    /// The kind of media being referenced
    pub kind: MediaKind,
    /// URL where the media is hosted, if remote
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Original filename, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Kinds of media a connector may reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

impl InboundMessage {
    /// Creates a new inbound message with the required fields.
    ///
    /// The session key is derived as "connector:conversation_id" and stays
    /// stable for the lifetime of the conversation.
    ///
    /// # Example
    /// ```
    /// use switchboard::bus::InboundMessage;
    ///
    /// let msg = InboundMessage::new("telegram", "user123", "chat456", "Hello");
    /// assert_eq!(msg.session_key, "telegram:chat456");
    /// ```
    pub fn new(connector: &str, sender_id: &str, conversation_id: &str, content: &str) -> Self {
        Self {
            connector: connector.to_string(),
            sender_id: sender_id.to_string(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            media: Vec::new(),
            session_key: format!("{}:{}", connector, conversation_id),
            received_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attaches a media reference (builder pattern).
    pub fn with_media(mut self, media: MediaRef) -> Self {
        self.media.push(media);
        self
    }

    /// Adds a metadata key-value pair (builder pattern).
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Checks if this message carries media references.
    pub fn has_media(&self) -> bool {
        !self.media.is_empty()
    }

    /// Returns `true` when the connector and conversation id form a usable
    /// session key. Empty components are a configuration error at the
    /// producing call site.
    pub fn has_valid_session_key(&self) -> bool {
        !self.connector.is_empty() && !self.conversation_id.is_empty()
    }
}

impl OutboundMessage {
    /// Creates a new outbound message.
    ///
    /// # Example
    /// ```
    /// use switchboard::bus::OutboundMessage;
    ///
    /// let msg = OutboundMessage::new("telegram", "chat456", "Hello back!");
    /// assert_eq!(msg.connector, "telegram");
    /// ```
    pub fn new(connector: &str, conversation_id: &str, content: &str) -> Self {
        Self {
            connector: connector.to_string(),
            conversation_id: conversation_id.to_string(),
            content: content.to_string(),
            reply_to: None,
            metadata: HashMap::new(),
        }
    }

    /// Sets the message ID this is a reply to (builder pattern).
    pub fn with_reply(mut self, message_id: &str) -> Self {
        self.reply_to = Some(message_id.to_string());
        self
    }

    /// Adds a metadata key-value pair (builder pattern).
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Creates an outbound message addressed back to an inbound message's
    /// conversation.
    ///
    /// # Example
    /// ```
    /// use switchboard::bus::{InboundMessage, OutboundMessage};
    ///
    /// let inbound = InboundMessage::new("telegram", "user123", "chat456", "Hello");
    /// let response = OutboundMessage::reply_to(&inbound, "Hello back!");
    /// assert_eq!(response.conversation_id, "chat456");
    /// ```
    pub fn reply_to(msg: &InboundMessage, content: &str) -> Self {
        let mut out = Self::new(&msg.connector, &msg.conversation_id, content);
        if let Some(id) = msg.metadata.get("message_id") {
            out.reply_to = Some(id.clone());
        }
        out
    }
}

impl MediaRef {
    /// Creates a new media reference of the given kind.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            url: None,
            filename: None,
        }
    }

    /// Sets the URL (builder pattern).
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Sets the filename (builder pattern).
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }
}
