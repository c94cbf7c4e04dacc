//! WebSocket inbound message types: envelope and per-event payloads.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.
//! The envelope is parsed first so failures can be attributed to the event
//! name; the payload is then decoded and validated against the schema of
//! that event and turned into a typed [`InboundEvent`].
//!
//! Room names go through one normalization for every event that carries
//! one: surrounding whitespace is trimmed and the result must be 1-200
//! characters. Identity claims (`fullname`, `email`) are checked by the
//! identity directory when they are mapped, not here.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::{ConnectionId, TextStyle};
use crate::error::GatewayError;

/// Inbound event names accepted by the gateway.
pub const INBOUND_EVENTS: &[&str] = &[
    "userid-to-clientId-map",
    "join_room",
    "send_message",
    "edit-document",
    "user_start_typing",
    "user_stop_typing",
    "updateStyleBold",
    "updateStyleItalic",
    "updateStyleUnderline",
    "save-document",
];

/// Top-level inbound frame.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Event name.
    pub event: String,
    /// Event-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Parses a text frame into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPayload`] if the frame is not a JSON
    /// object with a string `event` field.
    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(text)
            .map_err(|e| GatewayError::InvalidPayload(format!("malformed frame: {e}")))
    }
}

/// Longest accepted room name, in characters.
pub const MAX_ROOM_NAME_CHARS: usize = 200;

/// `userid-to-clientId-map` payload. The claim itself is validated by the
/// identity directory.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterIdentityPayload {
    /// Claimed display name.
    pub fullname: String,
    /// Claimed email.
    pub email: String,
    /// Connection handle to map.
    #[serde(rename = "clientId")]
    pub client_id: ConnectionId,
}

/// `send_message` payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessagePayload {
    /// Target room, normalized.
    pub room: String,
    /// Message text.
    #[validate(length(min = 1, max = 10000))]
    pub message: String,
}

/// `edit-document` payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EditDocumentPayload {
    /// Target room, normalized.
    pub room: String,
    /// Full document content. May be empty when the document is cleared.
    #[validate(length(max = 1000000))]
    pub content: String,
}

/// `user_start_typing` / `user_stop_typing` payload. `fullname` and
/// `email` are validated when the sender is remapped.
#[derive(Debug, Clone, Deserialize)]
pub struct TypingPayload {
    /// Target room, normalized.
    #[serde(rename = "roomId")]
    pub room_id: String,
    /// Claimed display name.
    pub fullname: String,
    /// Claimed email.
    pub email: String,
}

/// `save-document` payload. `fullname` and `email` are validated when the
/// saver is remapped.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveDocumentPayload {
    /// Claimed display name.
    pub fullname: String,
    /// Claimed email.
    pub email: String,
    /// Connection handle to map and acknowledge.
    #[serde(rename = "clientId")]
    pub client_id: ConnectionId,
    /// Document title.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Document body.
    #[validate(length(max = 1000000))]
    pub content: String,
}

/// A validated inbound event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Map a connection to a user.
    RegisterIdentity(RegisterIdentityPayload),
    /// Join a room by name.
    JoinRoom(String),
    /// Post a chat message to a room.
    SendMessage(SendMessagePayload),
    /// Publish new document content to a room.
    EditDocument(EditDocumentPayload),
    /// Started typing.
    StartTyping(TypingPayload),
    /// Stopped typing.
    StopTyping(TypingPayload),
    /// Toggle a text style for every other editor.
    StyleToggle {
        /// Style toggled.
        style: TextStyle,
        /// New value.
        value: bool,
    },
    /// Persist a document.
    SaveDocument(SaveDocumentPayload),
}

impl InboundEvent {
    /// Decodes and validates the payload of `envelope`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEvent`] for an unrecognized event name
    /// and [`GatewayError::InvalidPayload`] if the payload does not match
    /// the event's schema.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, GatewayError> {
        let Envelope { event, data } = envelope;
        let parsed = match event.as_str() {
            "userid-to-clientId-map" => Self::RegisterIdentity(deserialize(&event, data)?),
            "join_room" => {
                let room: String = deserialize(&event, data)?;
                Self::JoinRoom(room_name(&event, &room)?)
            }
            "send_message" => {
                let mut p: SendMessagePayload = decode(&event, data)?;
                p.room = room_name(&event, &p.room)?;
                Self::SendMessage(p)
            }
            "edit-document" => {
                let mut p: EditDocumentPayload = decode(&event, data)?;
                p.room = room_name(&event, &p.room)?;
                Self::EditDocument(p)
            }
            "user_start_typing" => Self::StartTyping(typing(&event, data)?),
            "user_stop_typing" => Self::StopTyping(typing(&event, data)?),
            "updateStyleBold" => style(TextStyle::Bold, &event, data)?,
            "updateStyleItalic" => style(TextStyle::Italic, &event, data)?,
            "updateStyleUnderline" => style(TextStyle::Underline, &event, data)?,
            "save-document" => Self::SaveDocument(decode(&event, data)?),
            _ => return Err(GatewayError::UnknownEvent(event)),
        };
        Ok(parsed)
    }
}

fn deserialize<T>(event: &str, data: serde_json::Value) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(data).map_err(|e| GatewayError::InvalidPayload(format!("{event}: {e}")))
}

fn decode<T>(event: &str, data: serde_json::Value) -> Result<T, GatewayError>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = deserialize(event, data)?;
    payload
        .validate()
        .map_err(|e| GatewayError::InvalidPayload(format!("{event}: {e}")))?;
    Ok(payload)
}

fn typing(event: &str, data: serde_json::Value) -> Result<TypingPayload, GatewayError> {
    let mut p: TypingPayload = deserialize(event, data)?;
    p.room_id = room_name(event, &p.room_id)?;
    Ok(p)
}

/// Trims `raw` and checks its length in characters.
fn room_name(event: &str, raw: &str) -> Result<String, GatewayError> {
    let room = raw.trim();
    let chars = room.chars().count();
    if chars == 0 || chars > MAX_ROOM_NAME_CHARS {
        return Err(GatewayError::InvalidPayload(format!(
            "{event}: room name must be 1-{MAX_ROOM_NAME_CHARS} characters"
        )));
    }
    Ok(room.to_string())
}

fn style(
    style: TextStyle,
    event: &str,
    data: serde_json::Value,
) -> Result<InboundEvent, GatewayError> {
    let value: bool = deserialize(event, data)?;
    Ok(InboundEvent::StyleToggle { style, value })
}
