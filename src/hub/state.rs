//! Session hub state machine
//!
//! Applies one command at a time to the registry, poll engine and chat log,
//! then pushes the resulting state through the broadcaster. Every rejection
//! is silent: state stays as it was and nothing is sent.

use tokio::sync::mpsc;

use crate::broadcast::{Broadcaster, Outbound};
use crate::chat::ChatLog;
use crate::poll::{NewPoll, PollEngine};
use crate::protocol::{ClientCommand, ServerEvent};
use crate::registry::{ParticipantRegistry, Role};
use crate::session::{ConnectionId, Identity, SessionContext};
use crate::stats::{HubCounters, HubStats};

/// All shared session state, owned by the hub actor
#[derive(Debug)]
pub struct SessionHub {
    registry: ParticipantRegistry,
    polls: PollEngine,
    chat: ChatLog,
    broadcaster: Broadcaster,
    counters: HubCounters,
}

impl SessionHub {
    /// Create a hub with the seeded poll and an unbounded chat log
    pub fn new() -> Self {
        Self::with_chat_limit(None)
    }

    /// Create a hub whose chat log keeps at most `limit` messages
    pub fn with_chat_limit(limit: Option<usize>) -> Self {
        Self {
            registry: ParticipantRegistry::new(),
            polls: PollEngine::new(),
            chat: ChatLog::with_limit(limit),
            broadcaster: Broadcaster::new(),
            counters: HubCounters::new(),
        }
    }

    /// A connection finished its handshake
    ///
    /// The chat log is replayed to it right away.
    pub fn connect(&mut self, context: SessionContext, tx: mpsc::Sender<Outbound>) {
        let connection = context.connection_id;

        self.registry.attach(connection, context.identity.clone());
        self.broadcaster.attach(connection, tx);
        self.counters.total_connections += 1;

        tracing::info!(
            connection_id = %connection,
            identity = %context.identity,
            peer = %context.peer_addr,
            live = self.broadcaster.len(),
            "Connection attached"
        );

        let log = ServerEvent::ChatLog(self.chat.snapshot());
        self.broadcaster.send_to(connection, &log);
    }

    /// A connection's socket is gone
    pub fn disconnect(&mut self, connection: ConnectionId) {
        self.broadcaster.detach(connection);
        let removed = self.registry.detach(connection);

        tracing::info!(
            connection_id = %connection,
            was_registered = removed.is_some(),
            live = self.broadcaster.len(),
            "Connection detached"
        );

        if removed.is_some() {
            self.broadcast_participants();
        }
    }

    /// Apply one validated command from `connection`
    ///
    /// Commands from a connection that is no longer attached (removed by the
    /// presenter, or already gone) are dropped.
    pub fn apply(&mut self, connection: ConnectionId, command: ClientCommand) {
        if !self.broadcaster.is_attached(connection) {
            tracing::debug!(
                connection_id = %connection,
                command = command.name(),
                "Dropping command from detached connection"
            );
            return;
        }

        tracing::debug!(
            connection_id = %connection,
            command = command.name(),
            "Applying command"
        );

        match command {
            ClientCommand::RegisterPresenter {
                identity,
                display_name,
            } => self.register(connection, identity, &display_name, Role::Presenter),
            ClientCommand::RegisterParticipant {
                identity,
                display_name,
            } => self.register(connection, identity, &display_name, Role::Participant),
            ClientCommand::RemoveParticipant { target } => self.remove_participant(connection, target),
            ClientCommand::GetPoll => {
                let event = ServerEvent::PollState(self.polls.snapshot());
                self.broadcaster.send_to(connection, &event);
            }
            ClientCommand::SubmitVote { option_id } => self.submit_vote(connection, option_id),
            ClientCommand::CreatePoll(new_poll) => self.create_poll(connection, new_poll),
            ClientCommand::PostMessage { text, display_name } => {
                if self.chat.append(&display_name, &text) {
                    self.counters.messages_posted += 1;
                    let event = ServerEvent::ChatLog(self.chat.snapshot());
                    self.broadcaster.fan_out(&event);
                }
            }
            ClientCommand::RequestChatLog => {
                let event = ServerEvent::ChatLog(self.chat.snapshot());
                self.broadcaster.send_to(connection, &event);
            }
        }
    }

    fn register(&mut self, connection: ConnectionId, identity: Identity, name: &str, role: Role) {
        if self.registry.register(connection, identity, name, role) {
            self.broadcast_participants();
        }
    }

    fn remove_participant(&mut self, presenter: ConnectionId, target: ConnectionId) {
        if !self.authorized(presenter, Role::Presenter, "remove-participant") {
            return;
        }

        if !self.registry.contains(target) {
            tracing::debug!(
                connection_id = %presenter,
                target = %target,
                "Removal target not registered"
            );
            return;
        }

        // The target's identity goes with its record, so anything it sent
        // before the close lands is ignored.
        self.registry.detach(target);

        self.broadcaster.send_to(target, &ServerEvent::RemovedNotice);
        self.broadcaster.close(target, Outbound::removed());

        tracing::info!(
            connection_id = %presenter,
            target = %target,
            "Participant removed by presenter"
        );

        self.broadcast_participants();
    }

    fn submit_vote(&mut self, connection: ConnectionId, option_id: u32) {
        let Some(identity) = self.registry.identity(connection).cloned() else {
            tracing::debug!(connection_id = %connection, "Vote from detached connection");
            return;
        };

        if self.polls.submit_vote(&identity, option_id) {
            self.counters.votes_cast += 1;
        }

        let event = ServerEvent::PollState(self.polls.snapshot());
        self.broadcaster.fan_out(&event);
    }

    fn create_poll(&mut self, connection: ConnectionId, new_poll: NewPoll) {
        if !self.authorized(connection, Role::Presenter, "create-poll") {
            return;
        }

        self.polls.create_poll(new_poll);
        self.counters.polls_created += 1;

        let event = ServerEvent::PollState(self.polls.snapshot());
        self.broadcaster.fan_out(&event);
    }

    fn authorized(&mut self, connection: ConnectionId, role: Role, command: &str) -> bool {
        if self.registry.authorize(connection, role) {
            return true;
        }

        self.counters.unauthorized_commands += 1;
        tracing::debug!(
            connection_id = %connection,
            command = command,
            required = %role,
            "Unauthorized command dropped"
        );
        false
    }

    fn broadcast_participants(&mut self) {
        let event = ServerEvent::ParticipantList(self.registry.list_distinct());
        self.broadcaster.fan_out(&event);
    }

    /// Registry, for inspection
    pub fn registry(&self) -> &ParticipantRegistry {
        &self.registry
    }

    /// Poll engine, for inspection
    pub fn polls(&self) -> &PollEngine {
        &self.polls
    }

    /// Chat log, for inspection
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Current statistics
    pub fn stats(&self) -> HubStats {
        HubStats {
            total_connections: self.counters.total_connections,
            active_connections: self.registry.live_count() as u64,
            registered_participants: self.registry.len() as u64,
            polls_created: self.counters.polls_created,
            votes_cast: self.counters.votes_cast,
            messages_posted: self.counters.messages_posted,
            chat_log_len: self.chat.len() as u64,
            unauthorized_commands: self.counters.unauthorized_commands,
            frames_dropped: self.broadcaster.dropped(),
            uptime: self.counters.started_at.elapsed(),
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}
