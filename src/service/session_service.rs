//! Session service: one handler per inbound session event.

use std::sync::Arc;

use crate::domain::{
    ConnectionId, DocumentRecord, IdentityDirectory, OutboundSender, RoomRouter, SessionEvent,
    StoredDocument, TextStyle, UserRecord,
};
use crate::error::GatewayError;
use crate::persistence::{DocumentStore, Stores};

/// Orchestration layer for all session events.
///
/// Holds the [`IdentityDirectory`] for identity resolution, the
/// [`RoomRouter`] for delivery, and the [`DocumentStore`] for saves.
/// Handlers keep no state of their own. Identity-dependent handlers
/// re-map the connection on every call instead of trusting an earlier
/// registration, since a reconnecting client shows up under a new handle.
#[derive(Debug)]
pub struct SessionService {
    directory: IdentityDirectory,
    router: RoomRouter,
    documents: Arc<dyn DocumentStore>,
    emit_membership_events: bool,
}

impl SessionService {
    /// Creates a new `SessionService` over the given stores.
    #[must_use]
    pub fn new(stores: Stores, emit_membership_events: bool) -> Self {
        Self {
            directory: IdentityDirectory::new(stores.users),
            router: RoomRouter::new(),
            documents: stores.documents,
            emit_membership_events,
        }
    }

    /// Returns a reference to the inner [`IdentityDirectory`].
    #[must_use]
    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// Returns a reference to the inner [`RoomRouter`].
    #[must_use]
    pub fn router(&self) -> &RoomRouter {
        &self.router
    }

    /// Registers a freshly upgraded connection and greets it with its
    /// handle.
    pub fn connect(&self, connection: ConnectionId, sender: OutboundSender) {
        self.router.register(connection, sender);
        self.router.send_to(
            connection,
            SessionEvent::ConnectionEstablished {
                client_id: connection,
            },
        );
        tracing::info!(%connection, "client connected");
    }

    /// `userid-to-clientId-map`: maps `client_id` to the claimed user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::IdentityResolution`] for a malformed claim,
    /// or [`GatewayError::Persistence`] if the identity store fails.
    pub async fn register_identity(
        &self,
        fullname: &str,
        email: &str,
        client_id: ConnectionId,
    ) -> Result<UserRecord, GatewayError> {
        let user = self
            .directory
            .map_connection_to_user(fullname, email, client_id)
            .await?;
        self.prune_if_gone(client_id);
        Ok(user)
    }

    /// `join_room`: adds the connection to `room`.
    pub fn join_room(&self, connection: ConnectionId, room: &str) {
        let joined = self.router.join_room(connection, room);
        if joined && self.emit_membership_events {
            self.router.broadcast_to_room(
                room,
                &SessionEvent::UserJoined {
                    client_id: connection,
                    room: room.to_string(),
                },
                None,
            );
        }
    }

    /// `send_message`: relays a chat message to the rest of the room.
    pub fn send_message(&self, connection: ConnectionId, room: &str, message: String) {
        self.router.broadcast_to_room(
            room,
            &SessionEvent::ReceivedMessage { message },
            Some(connection),
        );
    }

    /// `edit-document`: relays the full document content to the rest of
    /// the room.
    pub fn edit_document(&self, connection: ConnectionId, room: &str, content: String) {
        tracing::debug!(%connection, room, "document edited");
        self.router.broadcast_to_room(
            room,
            &SessionEvent::DocumentContentUpdate(content),
            Some(connection),
        );
    }

    /// `user_start_typing` / `user_stop_typing`: re-maps the sender's
    /// identity and tells the rest of the room.
    ///
    /// The broadcast name comes from the resolved record, not the payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::IdentityResolution`] for a malformed claim,
    /// [`GatewayError::UnmappedConnection`] if the mapping vanished, or
    /// [`GatewayError::Persistence`] if the identity store fails.
    pub async fn set_typing(
        &self,
        connection: ConnectionId,
        room_id: &str,
        fullname: &str,
        email: &str,
        is_typing: bool,
    ) -> Result<(), GatewayError> {
        self.directory
            .map_connection_to_user(fullname, email, connection)
            .await?;
        let user = self.directory.resolve_user_for_connection(connection)?;

        self.router.broadcast_to_room(
            room_id,
            &SessionEvent::TypingIndicator {
                fullname: user.fullname,
                is_typing,
            },
            Some(connection),
        );
        Ok(())
    }

    /// `updateStyle*`: relays a style toggle to every other connection,
    /// regardless of room.
    pub fn toggle_style(&self, connection: ConnectionId, style: TextStyle, value: bool) {
        self.router
            .broadcast_to_all(&SessionEvent::style_toggle(style, value), Some(connection));
    }

    /// `save-document`: maps `client_id` to the claimed user, persists the
    /// document under that user, and acknowledges to `client_id` only.
    ///
    /// The acknowledgement is dropped if `client_id` disconnected while the
    /// write was in flight.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::IdentityResolution`] for a malformed claim,
    /// [`GatewayError::UnmappedConnection`] if the mapping vanished, or
    /// [`GatewayError::Persistence`] if either store fails.
    pub async fn save_document(
        &self,
        fullname: &str,
        email: &str,
        client_id: ConnectionId,
        title: String,
        content: String,
    ) -> Result<StoredDocument, GatewayError> {
        self.directory
            .map_connection_to_user(fullname, email, client_id)
            .await?;
        let user = self.directory.resolve_user_for_connection(client_id)?;

        let record = DocumentRecord {
            title,
            content,
            user_id: user.id,
        };
        let stored = self.documents.create_document(&record).await?;
        tracing::info!(
            %client_id,
            user_id = %user.id,
            document_id = %stored.id,
            "document saved"
        );

        if !self
            .router
            .send_to(client_id, SessionEvent::SaveDocumentSuccess(stored.clone()))
        {
            tracing::debug!(%client_id, document_id = %stored.id, "save acknowledgement dropped");
            self.prune_if_gone(client_id);
        }
        Ok(stored)
    }

    /// Drops a mapping written for a handle that is no longer connected,
    /// e.g. when it disconnected while the store call was in flight.
    fn prune_if_gone(&self, client_id: ConnectionId) {
        if !self.router.is_connected(client_id) && self.directory.forget(client_id).is_some() {
            tracing::debug!(%client_id, "pruned mapping for disconnected handle");
        }
    }

    /// Reports a rejected inbound event back to the connection that sent
    /// it.
    pub fn report_error(&self, connection: ConnectionId, event: Option<&str>, error: &GatewayError) {
        self.router
            .send_to(connection, SessionEvent::Error(error.to_body(event)));
    }

    /// Transport-originated disconnect: leaves every room, forgets the
    /// identity mapping, and drops the outbound queue.
    pub fn disconnect(&self, connection: ConnectionId) {
        let rooms = self.router.leave_all(connection);
        if self.emit_membership_events {
            for room in &rooms {
                self.router.broadcast_to_room(
                    room,
                    &SessionEvent::UserLeft {
                        client_id: connection,
                        room: room.clone(),
                    },
                    None,
                );
            }
        }
        self.directory.forget(connection);
        self.router.unregister(connection);
        tracing::info!(%connection, rooms = rooms.len(), "client disconnected");
    }
}
