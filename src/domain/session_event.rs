//! Outbound events delivered to connected clients.
//!
//! Every [`SessionEvent`] serializes to the wire envelope
//! `{"event": <name>, "data": <payload>}`. Event names keep the spelling
//! the browser client already listens for.

use serde::Serialize;

use super::{ConnectionId, StoredDocument};
use crate::error::ErrorBody;

/// Outbound event names the gateway may emit.
pub const OUTBOUND_EVENTS: &[&str] = &[
    "connection_established",
    "received_message",
    "document-content-update",
    "typing_indicator",
    "updateStyleBold",
    "updateStyleItalic",
    "updateStyleUnderline",
    "save-document-success",
    "user_joined",
    "user_left",
    "error",
];

/// Text style that can be toggled for every connected editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
}

impl TextStyle {
    /// Returns the wire event name used for this style, inbound and outbound.
    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Bold => "updateStyleBold",
            Self::Italic => "updateStyleItalic",
            Self::Underline => "updateStyleUnderline",
        }
    }
}

/// Event sent from the gateway to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum SessionEvent {
    /// Greets a freshly upgraded socket with its connection handle.
    #[serde(rename = "connection_established")]
    ConnectionEstablished {
        /// Handle the client must echo back in `clientId` fields.
        #[serde(rename = "clientId")]
        client_id: ConnectionId,
    },

    /// A chat message posted to a room.
    #[serde(rename = "received_message")]
    ReceivedMessage {
        /// Message text.
        message: String,
    },

    /// Full document content after a peer's edit (last write wins).
    #[serde(rename = "document-content-update")]
    DocumentContentUpdate(String),

    /// A peer started or stopped typing.
    #[serde(rename = "typing_indicator")]
    TypingIndicator {
        /// Display name from the peer's resolved identity.
        fullname: String,
        /// Whether the peer is currently typing.
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    /// Bold toggle relayed from another editor.
    #[serde(rename = "updateStyleBold")]
    StyleBold(bool),

    /// Italic toggle relayed from another editor.
    #[serde(rename = "updateStyleItalic")]
    StyleItalic(bool),

    /// Underline toggle relayed from another editor.
    #[serde(rename = "updateStyleUnderline")]
    StyleUnderline(bool),

    /// Acknowledges a persisted document to the saving connection only.
    #[serde(rename = "save-document-success")]
    SaveDocumentSuccess(StoredDocument),

    /// A connection joined a room (membership events enabled only).
    #[serde(rename = "user_joined")]
    UserJoined {
        /// Joining connection.
        #[serde(rename = "clientId")]
        client_id: ConnectionId,
        /// Room joined.
        room: String,
    },

    /// A connection left a room on disconnect (membership events enabled only).
    #[serde(rename = "user_left")]
    UserLeft {
        /// Departing connection.
        #[serde(rename = "clientId")]
        client_id: ConnectionId,
        /// Room left.
        room: String,
    },

    /// A handler rejected an inbound event from this connection.
    #[serde(rename = "error")]
    Error(ErrorBody),
}

impl SessionEvent {
    /// Builds the style toggle event for `style`.
    #[must_use]
    pub const fn style_toggle(style: TextStyle, value: bool) -> Self {
        match style {
            TextStyle::Bold => Self::StyleBold(value),
            TextStyle::Italic => Self::StyleItalic(value),
            TextStyle::Underline => Self::StyleUnderline(value),
        }
    }

    /// Returns the wire event name as a static string slice.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::ReceivedMessage { .. } => "received_message",
            Self::DocumentContentUpdate(_) => "document-content-update",
            Self::TypingIndicator { .. } => "typing_indicator",
            Self::StyleBold(_) => TextStyle::Bold.event_name(),
            Self::StyleItalic(_) => TextStyle::Italic.event_name(),
            Self::StyleUnderline(_) => TextStyle::Underline.event_name(),
            Self::SaveDocumentSuccess(_) => "save-document-success",
            Self::UserJoined { .. } => "user_joined",
            Self::UserLeft { .. } => "user_left",
            Self::Error(_) => "error",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn to_json(event: &SessionEvent) -> serde_json::Value {
        let Ok(json) = serde_json::to_value(event) else {
            panic!("serialization failed");
        };
        json
    }

    #[test]
    fn typing_indicator_wire_shape() {
        let json = to_json(&SessionEvent::TypingIndicator {
            fullname: "Alice".to_string(),
            is_typing: true,
        });
        assert_eq!(
            json,
            serde_json::json!({
                "event": "typing_indicator",
                "data": { "fullname": "Alice", "isTyping": true }
            })
        );
    }

    #[test]
    fn content_update_carries_bare_string() {
        let json = to_json(&SessionEvent::DocumentContentUpdate("<p>hi</p>".to_string()));
        assert_eq!(json.get("data"), Some(&serde_json::json!("<p>hi</p>")));
    }

    #[test]
    fn style_toggle_uses_style_event_name() {
        let event = SessionEvent::style_toggle(TextStyle::Italic, false);
        assert_eq!(event.event_name(), "updateStyleItalic");
        let json = to_json(&event);
        assert_eq!(json.get("event"), Some(&serde_json::json!("updateStyleItalic")));
        assert_eq!(json.get("data"), Some(&serde_json::json!(false)));
    }

    #[test]
    fn catalog_covers_style_events() {
        for style in [TextStyle::Bold, TextStyle::Italic, TextStyle::Underline] {
            let name = SessionEvent::style_toggle(style, true).event_name();
            assert!(OUTBOUND_EVENTS.contains(&name));
        }
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let event = SessionEvent::ReceivedMessage {
            message: "hi".to_string(),
        };
        let json = to_json(&event);
        assert_eq!(
            json.get("event").and_then(|v| v.as_str()),
            Some(event.event_name())
        );
    }
}
