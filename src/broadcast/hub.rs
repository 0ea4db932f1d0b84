//! Broadcast hub
//!
//! The only writer to live connections. Delivery is `try_send` into each
//! connection's bounded queue, so the hub actor never waits on a socket.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::protocol::ServerEvent;
use crate::session::ConnectionId;

use super::frame::Outbound;

/// Addressing table for live connections
#[derive(Debug, Default)]
pub struct Broadcaster {
    /// Writer queues keyed by connection
    connections: BTreeMap<ConnectionId, mpsc::Sender<Outbound>>,
    /// Frames dropped because a queue was full or closed
    dropped: u64,
}

impl Broadcaster {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Start addressing a connection
    pub fn attach(&mut self, connection: ConnectionId, tx: mpsc::Sender<Outbound>) {
        self.connections.insert(connection, tx);
    }

    /// Stop addressing a connection
    ///
    /// Dropping the sender lets the writer drain what is queued and exit.
    pub fn detach(&mut self, connection: ConnectionId) -> bool {
        self.connections.remove(&connection).is_some()
    }

    /// Push an event to every live connection
    ///
    /// Returns how many queues accepted the frame.
    pub fn fan_out(&mut self, event: &ServerEvent) -> usize {
        let message = match event.encode() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Failed to encode event");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dropped = 0;
        for (connection, tx) in &self.connections {
            if deliver(*connection, tx, Outbound::Frame(message.clone())) {
                delivered += 1;
            } else {
                dropped += 1;
            }
        }
        self.dropped += dropped;

        tracing::trace!(
            event = event.name(),
            recipients = delivered,
            dropped = dropped,
            "Event broadcast"
        );
        delivered
    }

    /// Push an event to exactly one connection
    pub fn send_to(&mut self, connection: ConnectionId, event: &ServerEvent) -> bool {
        let Some(tx) = self.connections.get(&connection) else {
            return false;
        };

        let message = match event.encode() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Failed to encode event");
                return false;
            }
        };

        let sent = deliver(connection, tx, Outbound::Frame(message));
        if !sent {
            self.dropped += 1;
        }
        sent
    }

    /// Queue a close for one connection and stop addressing it
    pub fn close(&mut self, connection: ConnectionId, reason: Outbound) -> bool {
        match self.connections.remove(&connection) {
            Some(tx) => deliver(connection, &tx, reason),
            None => false,
        }
    }

    /// Check if a connection is addressable
    pub fn is_attached(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    /// Number of addressable connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if nobody is connected
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Frames dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Best-effort enqueue; failures are logged and swallowed
fn deliver(connection: ConnectionId, tx: &mpsc::Sender<Outbound>, item: Outbound) -> bool {
    match tx.try_send(item) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(connection_id = %connection, "Send queue full, dropping frame");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(connection_id = %connection, "Connection closing, dropping frame");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;
    use tokio_tungstenite::tungstenite::Message;

    fn event_name(item: Outbound) -> String {
        match item {
            Outbound::Frame(Message::Text(text)) => {
                let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                json["event"].as_str().unwrap().to_string()
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_fan_out_reaches_everyone() {
        let mut hub = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        hub.attach(ConnectionId(1), tx1);
        hub.attach(ConnectionId(2), tx2);

        let delivered = hub.fan_out(&ServerEvent::ChatLog(vec![ChatMessage::new("a", "b")]));
        assert_eq!(delivered, 2);

        assert_eq!(event_name(rx1.try_recv().unwrap()), "chat-log");
        assert_eq!(event_name(rx2.try_recv().unwrap()), "chat-log");
    }

    #[test]
    fn test_send_to_targets_one() {
        let mut hub = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        hub.attach(ConnectionId(1), tx1);
        hub.attach(ConnectionId(2), tx2);

        assert!(hub.send_to(ConnectionId(2), &ServerEvent::RemovedNotice));
        assert!(!hub.send_to(ConnectionId(3), &ServerEvent::RemovedNotice));

        assert!(rx1.try_recv().is_err());
        assert_eq!(event_name(rx2.try_recv().unwrap()), "removed-notice");
    }

    #[test]
    fn test_full_queue_drops_without_blocking_others() {
        let mut hub = Broadcaster::new();
        let (slow_tx, _slow_rx) = mpsc::channel(1);
        let (fast_tx, mut fast_rx) = mpsc::channel(8);
        hub.attach(ConnectionId(1), slow_tx);
        hub.attach(ConnectionId(2), fast_tx);

        hub.fan_out(&ServerEvent::RemovedNotice);
        let delivered = hub.fan_out(&ServerEvent::RemovedNotice);

        assert_eq!(delivered, 1);
        assert_eq!(hub.dropped(), 1);
        assert!(fast_rx.try_recv().is_ok());
        assert!(fast_rx.try_recv().is_ok());
    }

    #[test]
    fn test_closed_receiver_is_swallowed() {
        let mut hub = Broadcaster::new();
        let (tx, rx) = mpsc::channel(4);
        hub.attach(ConnectionId(1), tx);
        drop(rx);

        assert_eq!(hub.fan_out(&ServerEvent::RemovedNotice), 0);
        assert_eq!(hub.dropped(), 1);
    }

    #[test]
    fn test_close_detaches() {
        let mut hub = Broadcaster::new();
        let (tx, mut rx) = mpsc::channel(4);
        hub.attach(ConnectionId(1), tx);

        assert!(hub.close(ConnectionId(1), Outbound::removed()));
        assert!(!hub.is_attached(ConnectionId(1)));
        assert!(rx.try_recv().unwrap().is_close());

        // Sender dropped with the table entry
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
