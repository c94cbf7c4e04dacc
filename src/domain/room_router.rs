//! Room membership and outbound event fan-out.
//!
//! [`RoomRouter`] owns two tables: the outbound channel of every live
//! connection, and a map from room name to the set of member connections.
//! All operations are synchronous; delivery offers the event to the
//! recipient's bounded channel and never waits for it to be drained.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{ConnectionId, SessionEvent};

/// Sending half of a connection's outbound queue.
pub type OutboundSender = mpsc::Sender<SessionEvent>;

#[derive(Debug, Default)]
struct RouterState {
    peers: HashMap<ConnectionId, OutboundSender>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

/// Connection registry and broadcast scopes.
///
/// Membership and delivery are best-effort and unacknowledged:
///
/// - No ordering is guaranteed across recipients of one broadcast.
/// - An event for a connection that is gone, or whose queue is full, is
///   dropped without retry.
#[derive(Debug, Default)]
pub struct RoomRouter {
    state: RwLock<RouterState>,
}

impl RoomRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the outbound queue of a newly connected client.
    pub fn register(&self, connection: ConnectionId, sender: OutboundSender) {
        self.state.write().peers.insert(connection, sender);
        tracing::trace!(%connection, "peer registered");
    }

    /// Detaches a connection: leaves every room and drops its outbound
    /// queue. Returns the rooms it was a member of.
    pub fn unregister(&self, connection: ConnectionId) -> Vec<String> {
        let mut state = self.state.write();
        let rooms = leave_all_locked(&mut state, connection);
        state.peers.remove(&connection);
        rooms
    }

    /// Adds `connection` to `room`, creating the room on first join.
    ///
    /// Returns `true` if the connection was not already a member.
    pub fn join_room(&self, connection: ConnectionId, room: &str) -> bool {
        let mut state = self.state.write();
        let joined = state
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(connection);
        tracing::debug!(%connection, room, joined, "join room");
        joined
    }

    /// Removes `connection` from every room it joined and returns those
    /// rooms. Rooms left empty are dropped.
    pub fn leave_all(&self, connection: ConnectionId) -> Vec<String> {
        leave_all_locked(&mut self.state.write(), connection)
    }

    /// Delivers `event` to every member of `room` except `exclude`.
    ///
    /// Returns the number of connections the event was handed to.
    pub fn broadcast_to_room(
        &self,
        room: &str,
        event: &SessionEvent,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let state = self.state.read();
        let Some(members) = state.rooms.get(room) else {
            tracing::trace!(room, event = event.event_name(), "broadcast to empty room");
            return 0;
        };
        let sent = members
            .iter()
            .filter(|member| Some(**member) != exclude)
            .filter_map(|member| state.peers.get_key_value(member))
            .filter(|(member, sender)| deliver(**member, sender, event))
            .count();
        tracing::trace!(room, event = event.event_name(), sent, "room broadcast");
        sent
    }

    /// Delivers `event` to every live connection except `exclude`.
    pub fn broadcast_to_all(&self, event: &SessionEvent, exclude: Option<ConnectionId>) -> usize {
        let state = self.state.read();
        let sent = state
            .peers
            .iter()
            .filter(|(peer, _)| Some(**peer) != exclude)
            .filter(|(peer, sender)| deliver(**peer, sender, event))
            .count();
        tracing::trace!(event = event.event_name(), sent, "global broadcast");
        sent
    }

    /// Delivers `event` to a single connection.
    ///
    /// Returns `false`, without queueing anything, if the connection is no
    /// longer registered.
    pub fn send_to(&self, connection: ConnectionId, event: SessionEvent) -> bool {
        let state = self.state.read();
        match state.peers.get(&connection) {
            Some(sender) => deliver(connection, sender, &event),
            None => {
                tracing::debug!(%connection, event = event.event_name(), "target not connected");
                false
            }
        }
    }

    /// Returns the members of `room`.
    #[must_use]
    pub fn members(&self, room: &str) -> HashSet<ConnectionId> {
        self.state.read().rooms.get(room).cloned().unwrap_or_default()
    }

    /// Returns `true` if the connection has a registered outbound queue.
    #[must_use]
    pub fn is_connected(&self, connection: ConnectionId) -> bool {
        self.state.read().peers.contains_key(&connection)
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.state.read().peers.len()
    }

    /// Returns the number of non-empty rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.state.read().rooms.len()
    }
}

fn leave_all_locked(state: &mut RouterState, connection: ConnectionId) -> Vec<String> {
    let mut left = Vec::new();
    state.rooms.retain(|room, members| {
        if members.remove(&connection) {
            left.push(room.clone());
        }
        !members.is_empty()
    });
    if !left.is_empty() {
        tracing::debug!(%connection, rooms = ?left, "left rooms");
    }
    left
}

fn deliver(connection: ConnectionId, sender: &OutboundSender, event: &SessionEvent) -> bool {
    match sender.try_send(event.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(%connection, event = event.event_name(), "outbound queue full; event dropped");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn message(text: &str) -> SessionEvent {
        SessionEvent::ReceivedMessage {
            message: text.to_string(),
        }
    }

    fn connect(router: &RoomRouter) -> (ConnectionId, mpsc::Receiver<SessionEvent>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::channel(16);
        router.register(id, tx);
        (id, rx)
    }

    #[test]
    fn join_is_idempotent() {
        let router = RoomRouter::new();
        let (a, _rx) = connect(&router);
        assert!(router.join_room(a, "r1"));
        let once = router.members("r1");
        assert!(!router.join_room(a, "r1"));
        assert_eq!(router.members("r1"), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn room_broadcast_skips_sender() {
        let router = RoomRouter::new();
        let (a, mut rx_a) = connect(&router);
        let (b, mut rx_b) = connect(&router);
        let (c, mut rx_c) = connect(&router);
        router.join_room(c, "r1");
        router.join_room(a, "r1");
        router.join_room(b, "r1");

        let sent = router.broadcast_to_room("r1", &message("hi"), Some(a));
        assert_eq!(sent, 2);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().ok(), Some(message("hi")));
        assert_eq!(rx_c.try_recv().ok(), Some(message("hi")));
    }

    #[test]
    fn room_broadcast_stays_in_room() {
        let router = RoomRouter::new();
        let (a, _rx_a) = connect(&router);
        let (b, mut rx_b) = connect(&router);
        router.join_room(a, "r1");
        router.join_room(b, "r2");

        assert_eq!(router.broadcast_to_room("r1", &message("hi"), Some(a)), 0);
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn leave_all_stops_delivery() {
        let router = RoomRouter::new();
        let (a, mut rx_a) = connect(&router);
        let (b, _rx_b) = connect(&router);
        router.join_room(a, "r1");
        router.join_room(a, "r2");
        router.join_room(b, "r1");

        let mut left = router.leave_all(a);
        left.sort();
        assert_eq!(left, vec!["r1".to_string(), "r2".to_string()]);

        router.broadcast_to_room("r1", &message("one"), Some(b));
        router.broadcast_to_room("r2", &message("two"), None);
        assert!(rx_a.try_recv().is_err());
        // r2 had only `a` and is dropped once empty.
        assert_eq!(router.room_count(), 1);
    }

    #[test]
    fn global_broadcast_reaches_all_but_sender() {
        let router = RoomRouter::new();
        let (a, mut rx_a) = connect(&router);
        let (_b, mut rx_b) = connect(&router);
        let (_c, mut rx_c) = connect(&router);

        let event = SessionEvent::StyleBold(true);
        assert_eq!(router.broadcast_to_all(&event, Some(a)), 2);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().ok(), Some(event.clone()));
        assert_eq!(rx_c.try_recv().ok(), Some(event));
    }

    #[test]
    fn send_to_unknown_connection_is_noop() {
        let router = RoomRouter::new();
        assert!(!router.send_to(ConnectionId::new(), message("lost")));
    }

    #[test]
    fn send_to_targets_one_connection() {
        let router = RoomRouter::new();
        let (a, mut rx_a) = connect(&router);
        let (_b, mut rx_b) = connect(&router);
        assert!(router.send_to(a, message("only a")));
        assert_eq!(rx_a.try_recv().ok(), Some(message("only a")));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn unregister_removes_peer_and_memberships() {
        let router = RoomRouter::new();
        let (a, _rx_a) = connect(&router);
        router.join_room(a, "r1");
        assert_eq!(router.unregister(a), vec!["r1".to_string()]);
        assert!(!router.is_connected(a));
        assert_eq!(router.connection_count(), 0);
        assert!(router.members("r1").is_empty());
    }

    #[test]
    fn full_queue_drops_event() {
        let router = RoomRouter::new();
        let id = ConnectionId::new();
        let (tx, mut rx) = mpsc::channel(1);
        router.register(id, tx);
        assert!(router.send_to(id, message("first")));
        assert!(!router.send_to(id, message("second")));
        assert_eq!(rx.try_recv().ok(), Some(message("first")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_queue_counts_as_undelivered() {
        let router = RoomRouter::new();
        let (a, rx_a) = connect(&router);
        router.join_room(a, "r1");
        drop(rx_a);
        assert_eq!(router.broadcast_to_room("r1", &message("hi"), None), 0);
    }
}
