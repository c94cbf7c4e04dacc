//! WebSocket connection loop.
//!
//! Each connection gets a reader loop that processes its inbound events one
//! at a time, in arrival order, and a writer task that drains the
//! connection's outbound queue onto the socket.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::messages::{Envelope, InboundEvent};
use crate::domain::{ConnectionId, SessionEvent};
use crate::error::GatewayError;
use crate::service::SessionService;

/// Runs a single WebSocket connection until the client goes away.
///
/// - Registers the connection with the router and greets it.
/// - Reads frames and dispatches them to the session handlers.
/// - On close, runs the disconnect handler, which drops the outbound
///   queue and ends the writer task.
pub async fn run_connection(socket: WebSocket, service: Arc<SessionService>, buffer: usize) {
    let connection_id = ConnectionId::new();
    let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(buffer);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(%connection_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if ws_tx.send(Message::text(json)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    service.connect(connection_id, event_tx);

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_text_message(&service, connection_id, text.as_str()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(%connection_id, error = %e, "ws read error");
                break;
            }
        }
    }

    service.disconnect(connection_id);
    let _ = writer.await;
    tracing::debug!(%connection_id, "ws connection closed");
}

/// Parses and dispatches one text frame. Failures are logged and reported
/// to this connection only.
async fn handle_text_message(service: &SessionService, connection_id: ConnectionId, text: &str) {
    let envelope = match Envelope::parse(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(%connection_id, error = %e, "rejected frame");
            service.report_error(connection_id, None, &e);
            return;
        }
    };

    let event_name = envelope.event.clone();
    let result = match InboundEvent::from_envelope(envelope) {
        Ok(event) => dispatch(service, connection_id, event).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::warn!(
            %connection_id,
            event = %event_name,
            code = e.error_code(),
            error = %e,
            "event rejected"
        );
        service.report_error(connection_id, Some(event_name.as_str()), &e);
    }
}

/// Routes a validated event to its handler.
///
/// # Errors
///
/// Propagates the handler's [`GatewayError`].
pub async fn dispatch(
    service: &SessionService,
    connection_id: ConnectionId,
    event: InboundEvent,
) -> Result<(), GatewayError> {
    match event {
        InboundEvent::RegisterIdentity(p) => {
            service
                .register_identity(&p.fullname, &p.email, p.client_id)
                .await?;
        }
        InboundEvent::JoinRoom(room) => service.join_room(connection_id, &room),
        InboundEvent::SendMessage(p) => service.send_message(connection_id, &p.room, p.message),
        InboundEvent::EditDocument(p) => service.edit_document(connection_id, &p.room, p.content),
        InboundEvent::StartTyping(p) => {
            service
                .set_typing(connection_id, &p.room_id, &p.fullname, &p.email, true)
                .await?;
        }
        InboundEvent::StopTyping(p) => {
            service
                .set_typing(connection_id, &p.room_id, &p.fullname, &p.email, false)
                .await?;
        }
        InboundEvent::StyleToggle { style, value } => {
            service.toggle_style(connection_id, style, value);
        }
        InboundEvent::SaveDocument(p) => {
            service
                .save_document(&p.fullname, &p.email, p.client_id, p.title, p.content)
                .await?;
        }
    }
    Ok(())
}
