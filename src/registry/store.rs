//! Participant registry implementation
//!
//! Owned by the hub actor, so no locking here. Records keep the order of
//! first registration.

use std::collections::{HashMap, HashSet};

use crate::session::{ConnectionId, Identity};

use super::participant::{Participant, Role};

/// Registry of live connections and their participant records
#[derive(Debug, Default)]
pub struct ParticipantRegistry {
    /// Identity token of every live connection, registered or not
    live: HashMap<ConnectionId, Identity>,
    /// Participant records in order of first registration
    records: Vec<Participant>,
}

impl ParticipantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly accepted connection
    pub fn attach(&mut self, connection: ConnectionId, identity: Identity) {
        self.live.insert(connection, identity);
    }

    /// Identity token a live connection presented at handshake
    pub fn identity(&self, connection: ConnectionId) -> Option<&Identity> {
        self.live.get(&connection)
    }

    /// Forget a closed connection, returning its record if it had one
    pub fn detach(&mut self, connection: ConnectionId) -> Option<Participant> {
        self.live.remove(&connection);
        self.remove(connection)
    }

    /// Number of live connections
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Register a connection with a role
    ///
    /// Returns `false` without touching anything if the connection already
    /// has a record, whatever role it asked for.
    pub fn register(
        &mut self,
        connection: ConnectionId,
        identity: Identity,
        display_name: &str,
        role: Role,
    ) -> bool {
        if self.contains(connection) {
            tracing::debug!(
                connection_id = %connection,
                role = %role,
                "Duplicate registration ignored"
            );
            return false;
        }

        tracing::info!(
            connection_id = %connection,
            identity = %identity,
            display_name = display_name,
            role = %role,
            "Participant registered"
        );

        self.records
            .push(Participant::new(connection, identity, display_name, role));
        true
    }

    /// Check whether the connection holds `required`
    ///
    /// Unregistered connections are never authorized.
    pub fn authorize(&self, connection: ConnectionId, required: Role) -> bool {
        self.get(connection)
            .map(|p| p.role == required)
            .unwrap_or(false)
    }

    /// Remove the record for a connection, returning it if there was one
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Participant> {
        let index = self
            .records
            .iter()
            .position(|p| p.connection_handle == connection)?;
        let removed = self.records.remove(index);

        tracing::info!(
            connection_id = %connection,
            identity = %removed.identity,
            remaining = self.records.len(),
            "Participant removed"
        );

        Some(removed)
    }

    /// Records deduplicated by connection handle, in registration order
    pub fn list_distinct(&self) -> Vec<Participant> {
        let mut seen = HashSet::with_capacity(self.records.len());
        self.records
            .iter()
            .filter(|p| seen.insert(p.connection_handle))
            .cloned()
            .collect()
    }

    /// Look up a connection's record
    pub fn get(&self, connection: ConnectionId) -> Option<&Participant> {
        self.records
            .iter()
            .find(|p| p.connection_handle == connection)
    }

    /// Check if a connection is registered
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.get(connection).is_some()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nobody is registered
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identity {
        Identity::new(s)
    }

    #[test]
    fn test_register_is_idempotent_per_connection() {
        let mut registry = ParticipantRegistry::new();

        assert!(registry.register(ConnectionId(1), id("a"), "alice", Role::Participant));
        assert!(!registry.register(ConnectionId(1), id("a"), "alice", Role::Participant));
        // A different role does not overwrite the first record either
        assert!(!registry.register(ConnectionId(1), id("a"), "alice", Role::Presenter));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(ConnectionId(1)).unwrap().role, Role::Participant);
    }

    #[test]
    fn test_same_identity_on_two_connections() {
        let mut registry = ParticipantRegistry::new();

        registry.register(ConnectionId(1), id("a"), "alice", Role::Participant);
        registry.register(ConnectionId(2), id("a"), "alice", Role::Participant);

        let list = registry.list_distinct();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].connection_handle, ConnectionId(1));
        assert_eq!(list[1].connection_handle, ConnectionId(2));
    }

    #[test]
    fn test_authorize() {
        let mut registry = ParticipantRegistry::new();
        registry.register(ConnectionId(1), id("t"), "host", Role::Presenter);
        registry.register(ConnectionId(2), id("s"), "student", Role::Participant);

        assert!(registry.authorize(ConnectionId(1), Role::Presenter));
        assert!(!registry.authorize(ConnectionId(2), Role::Presenter));
        assert!(registry.authorize(ConnectionId(2), Role::Participant));
        assert!(!registry.authorize(ConnectionId(99), Role::Presenter));
    }

    #[test]
    fn test_remove_only_touches_target() {
        let mut registry = ParticipantRegistry::new();
        registry.register(ConnectionId(1), id("a"), "a", Role::Participant);
        registry.register(ConnectionId(2), id("b"), "b", Role::Participant);
        registry.register(ConnectionId(3), id("c"), "c", Role::Participant);

        let removed = registry.remove(ConnectionId(2)).unwrap();
        assert_eq!(removed.identity, id("b"));

        let handles: Vec<_> = registry
            .list_distinct()
            .into_iter()
            .map(|p| p.connection_handle)
            .collect();
        assert_eq!(handles, vec![ConnectionId(1), ConnectionId(3)]);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = ParticipantRegistry::new();
        registry.register(ConnectionId(1), id("a"), "a", Role::Participant);

        assert!(registry.remove(ConnectionId(5)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_live_identity_tracking() {
        let mut registry = ParticipantRegistry::new();
        registry.attach(ConnectionId(1), id("tok-1"));
        registry.attach(ConnectionId(2), id("tok-2"));
        registry.register(ConnectionId(2), id("u2"), "bea", Role::Participant);

        assert_eq!(registry.identity(ConnectionId(1)), Some(&id("tok-1")));
        assert_eq!(registry.live_count(), 2);

        // Unregistered connection leaves without a record
        assert!(registry.detach(ConnectionId(1)).is_none());
        assert_eq!(registry.detach(ConnectionId(2)).unwrap().display_name, "bea");
        assert_eq!(registry.live_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_distinct_keeps_registration_order() {
        let mut registry = ParticipantRegistry::new();
        registry.register(ConnectionId(9), id("z"), "z", Role::Participant);
        registry.register(ConnectionId(2), id("t"), "t", Role::Presenter);
        registry.register(ConnectionId(5), id("m"), "m", Role::Participant);
        registry.register(ConnectionId(9), id("z"), "z", Role::Participant);

        let handles: Vec<_> = registry
            .list_distinct()
            .into_iter()
            .map(|p| p.connection_handle)
            .collect();
        assert_eq!(handles, vec![ConnectionId(9), ConnectionId(2), ConnectionId(5)]);
    }
}
