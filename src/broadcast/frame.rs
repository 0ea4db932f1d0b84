//! Items queued for a connection's writer task

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Something the writer task should put on the wire
#[derive(Debug, Clone)]
pub enum Outbound {
    /// An encoded event
    Frame(Message),
    /// Send a close frame and stop writing
    Close(CloseFrame),
}

impl Outbound {
    /// Close frame used for presenter removal
    pub fn removed() -> Self {
        Outbound::Close(CloseFrame {
            code: CloseCode::Policy,
            reason: "removed by presenter".into(),
        })
    }

    /// Close frame used when the server stops reading from a quiet client
    pub fn idle() -> Self {
        Outbound::Close(CloseFrame {
            code: CloseCode::Away,
            reason: "idle timeout".into(),
        })
    }

    /// Convert into the message the writer sends
    pub fn into_message(self) -> Message {
        match self {
            Outbound::Frame(message) => message,
            Outbound::Close(frame) => Message::Close(Some(frame)),
        }
    }

    /// Check if this item ends the connection
    pub fn is_close(&self) -> bool {
        matches!(self, Outbound::Close(_))
    }
}
