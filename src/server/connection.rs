//! Per-connection handler
//!
//! Each accepted socket gets one task running [`Connection::run`]:
//!
//! 1. WebSocket upgrade, with the token and origin checks
//! 2. Attach to the hub with a bounded outbound queue
//! 3. Reader loop feeding decoded commands to the hub
//! 4. Writer task draining the queue and sending pings
//!
//! The connection ends when the client closes, goes quiet for longer than
//! the idle timeout, or the writer sends a close frame on the hub's behalf.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::{self, Message};

use crate::broadcast::Outbound;
use crate::error::{Error, Result};
use crate::hub::HubHandle;
use crate::protocol;
use crate::server::config::{ServerConfig, MIN_PING_INTERVAL};
use crate::server::handshake::{validate_upgrade, HandshakeRejection, UpgradeInfo};
use crate::session::{ConnectionId, SessionContext, SessionState};

/// How long a closing writer gets to flush its close frame
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Why the read side stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadEnd {
    /// Client sent a close frame or the stream ended
    ClientClosed,
    /// Nothing received within the idle timeout
    Idle,
    /// The writer finished first, usually after a forced close
    WriterDone,
}

/// A single client connection
pub struct Connection {
    connection_id: ConnectionId,
    socket: TcpStream,
    peer_addr: SocketAddr,
    config: ServerConfig,
    hub: HubHandle,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        connection_id: ConnectionId,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        hub: HubHandle,
    ) -> Self {
        Self {
            connection_id,
            socket,
            peer_addr,
            config,
            hub,
        }
    }

    /// Run the connection to completion
    pub async fn run(self) -> Result<()> {
        let Connection {
            connection_id,
            socket,
            peer_addr,
            config,
            hub,
        } = self;

        let mut upgrade: Option<UpgradeInfo> = None;
        let mut rejection: Option<HandshakeRejection> = None;
        let allowed_origins = &config.allowed_origins;

        let callback = |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
            match validate_upgrade(request, allowed_origins) {
                Ok(info) => {
                    upgrade = Some(info);
                    Ok(response)
                }
                Err(reason) => {
                    let response = reason.clone().into_response();
                    rejection = Some(reason);
                    Err(response)
                }
            }
        };

        let accepted = tokio_tungstenite::accept_hdr_async(socket, callback).await;
        let ws = match accepted {
            Ok(ws) => ws,
            Err(e) => {
                return Err(match rejection {
                    Some(reason) => {
                        tracing::info!(
                            connection_id = %connection_id,
                            peer = %peer_addr,
                            reason = %reason,
                            "Upgrade rejected"
                        );
                        Error::HandshakeRejected(reason.to_string())
                    }
                    None => e.into(),
                });
            }
        };

        let info = upgrade.ok_or_else(|| Error::HandshakeRejected("no upgrade request".into()))?;
        let context = SessionContext::new(connection_id, peer_addr, info.identity)
            .with_origin(info.origin);
        let mut state = SessionState::new(context.clone());

        tracing::info!(
            connection_id = %connection_id,
            peer = %peer_addr,
            identity = %context.identity,
            "Client connected"
        );

        let (tx, rx) = mpsc::channel(config.send_queue_capacity.max(1));
        hub.connect(context, tx.clone()).await?;
        state.activate();

        let (sink, mut stream) = ws.split();
        let mut writer: JoinHandle<Result<()>> =
            tokio::spawn(write_loop(sink, rx, config.ping_interval));

        let end = tokio::select! {
            end = read_loop(&mut stream, &mut state, &hub, config.idle_timeout) => end,
            result = &mut writer => {
                match result {
                    Ok(Err(e)) => tracing::debug!(connection_id = %connection_id, error = %e, "Writer error"),
                    Err(e) => tracing::debug!(connection_id = %connection_id, error = %e, "Writer task failed"),
                    Ok(Ok(())) => {}
                }
                ReadEnd::WriterDone
            }
        };

        let was_active = state.is_active();
        state.close();
        if end == ReadEnd::Idle && tx.try_send(Outbound::idle()).is_err() {
            tracing::debug!(connection_id = %connection_id, "Idle close not queued");
        }
        drop(tx);

        if let Err(e) = hub.disconnect(connection_id).await {
            tracing::debug!(connection_id = %connection_id, error = %e, "Hub gone before disconnect");
        }

        match end {
            ReadEnd::WriterDone => {}
            ReadEnd::Idle => {
                if tokio::time::timeout(CLOSE_GRACE, &mut writer).await.is_err() {
                    writer.abort();
                }
            }
            ReadEnd::ClientClosed => writer.abort(),
        }

        state.finish();
        tracing::info!(
            connection_id = %connection_id,
            reason = ?end,
            was_active,
            idle_ms = state.last_seen.elapsed().as_millis() as u64,
            frames = state.frames_received,
            rejected = state.frames_rejected,
            duration_ms = state.duration().as_millis() as u64,
            "Client disconnected"
        );

        Ok(())
    }
}

/// Read frames until the client leaves or goes quiet
///
/// Decode failures are dropped without a reply.
async fn read_loop<S>(
    stream: &mut S,
    state: &mut SessionState,
    hub: &HubHandle,
    idle_timeout: Duration,
) -> ReadEnd
where
    S: Stream<Item = std::result::Result<Message, tungstenite::Error>> + Unpin,
{
    let connection_id = state.context.connection_id;

    loop {
        let message = match tokio::time::timeout(idle_timeout, stream.next()).await {
            Err(_) => {
                tracing::debug!(connection_id = %connection_id, "Idle timeout");
                return ReadEnd::Idle;
            }
            Ok(None) => return ReadEnd::ClientClosed,
            Ok(Some(Err(e))) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Read error");
                return ReadEnd::ClientClosed;
            }
            Ok(Some(Ok(message))) => message,
        };

        match message {
            Message::Text(text) => match protocol::decode(text.as_str()) {
                Ok(command) => {
                    state.on_frame(true);
                    tracing::trace!(
                        connection_id = %connection_id,
                        command = command.name(),
                        "Command received"
                    );
                    if hub.command(connection_id, command).await.is_err() {
                        return ReadEnd::ClientClosed;
                    }
                }
                Err(e) => {
                    state.on_frame(false);
                    tracing::debug!(connection_id = %connection_id, error = %e, "Dropping frame");
                }
            },
            Message::Binary(data) => {
                state.on_frame(false);
                tracing::debug!(connection_id = %connection_id, len = data.len(), "Ignoring binary frame");
            }
            Message::Close(_) => return ReadEnd::ClientClosed,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => state.touch(),
        }
    }
}

/// Drain the outbound queue onto the socket
///
/// Stops after a close frame or once every sender is gone.
async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Outbound>,
    ping_interval: Duration,
) -> Result<()>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let mut ping = tokio::time::interval(ping_interval.max(MIN_PING_INTERVAL));
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping.tick().await;

    loop {
        tokio::select! {
            item = rx.recv() => {
                let Some(item) = item else {
                    break;
                };
                let closing = item.is_close();
                sink.send(item.into_message()).await?;
                if closing {
                    break;
                }
            }
            _ = ping.tick() => {
                sink.send(Message::Ping(Vec::new().into())).await?;
            }
        }
    }

    // Best effort; the peer may already be gone
    let _ = sink.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::sink;
    use futures_util::stream;

    #[tokio::test]
    async fn test_write_loop_stops_after_close() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Outbound::Frame(Message::text("one"))).await.unwrap();
        tx.send(Outbound::removed()).await.unwrap();
        tx.send(Outbound::Frame(Message::text("never"))).await.unwrap();

        let mut sent = Vec::new();
        let sink = sink::unfold(&mut sent, |sent, message: Message| async move {
            sent.push(message);
            Ok::<_, tungstenite::Error>(sent)
        });

        write_loop(Box::pin(sink), rx, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], Message::text("one"));
        assert!(matches!(sent[1], Message::Close(Some(_))));
    }

    #[tokio::test]
    async fn test_write_loop_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel::<Outbound>(8);
        drop(tx);

        let sink = sink::drain::<Message>()
            .sink_map_err(|never: std::convert::Infallible| -> tungstenite::Error { match never {} });
        write_loop(sink, rx, Duration::from_secs(60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_loop_with_zero_ping_interval() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Outbound::idle()).await.unwrap();

        let mut sent = Vec::new();
        let sink = sink::unfold(&mut sent, |sent, message: Message| async move {
            sent.push(message);
            Ok::<_, tungstenite::Error>(sent)
        });

        write_loop(Box::pin(sink), rx, Duration::ZERO).await.unwrap();

        assert!(matches!(sent.last(), Some(Message::Close(Some(_)))));
    }

    #[tokio::test]
    async fn test_read_loop_ends_on_close_frame() {
        use crate::hub::{self, SessionHub};
        use crate::session::Identity;
        use std::net::{IpAddr, Ipv4Addr};

        let (hub, _task) = hub::spawn(SessionHub::new(), 8);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5050);
        let mut state = SessionState::new(SessionContext::new(
            ConnectionId(1),
            addr,
            Identity::new("tok"),
        ));

        let frames: Vec<std::result::Result<Message, tungstenite::Error>> = vec![
            Ok(Message::text("not json")),
            Ok(Message::text(r#"{"type":"get-poll"}"#)),
            Ok(Message::Close(None)),
            Ok(Message::text(r#"{"type":"get-poll"}"#)),
        ];
        let mut stream = stream::iter(frames);

        let end = read_loop(&mut stream, &mut state, &hub, Duration::from_secs(5)).await;

        assert_eq!(end, ReadEnd::ClientClosed);
        assert_eq!(state.frames_received, 2);
        assert_eq!(state.frames_rejected, 1);
    }

    #[tokio::test]
    async fn test_read_loop_idle_timeout() {
        use crate::hub::{self, SessionHub};
        use crate::session::Identity;
        use std::net::{IpAddr, Ipv4Addr};

        let (hub, _task) = hub::spawn(SessionHub::new(), 8);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5050);
        let mut state = SessionState::new(SessionContext::new(
            ConnectionId(1),
            addr,
            Identity::new("tok"),
        ));
        let mut stream = stream::pending::<std::result::Result<Message, tungstenite::Error>>();

        let end = read_loop(&mut stream, &mut state, &hub, Duration::from_millis(20)).await;
        assert_eq!(end, ReadEnd::Idle);
        assert_eq!(state.frames_received, 0);
    }
}
