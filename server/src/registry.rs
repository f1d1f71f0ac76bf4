//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Connection registry
//!
//! Tracks every open client connection keyed by its id/token. The registry
//! is touched by exactly one thread (the event loop), so it needs no
//! internal locking; the invariant it maintains is that an id present in
//! the map always names a live, poll-registered connection.

use crate::connection::Connection;
use crate::types::ConnectionId;
use std::collections::HashMap;

/// Registry of open client connections plus the id allocator.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    first_id: usize,
    next_id: usize,
}

impl ConnectionRegistry {
    /// Create an empty registry allocating ids starting at `first_id`
    ///
    /// Ids below `first_id` are reserved for the listener and waker tokens.
    pub fn new(first_id: usize) -> Self {
        Self {
            connections: HashMap::new(),
            first_id,
            next_id: first_id,
        }
    }

    /// Allocate the next free connection id.
    ///
    /// Ids advance monotonically and wrap back to `first_id` on overflow,
    /// skipping any id still present in the registry.
    pub fn allocate_id(&mut self) -> ConnectionId {
        while self.connections.contains_key(&ConnectionId::new(self.next_id)) {
            self.advance();
        }
        let id = ConnectionId::new(self.next_id);
        self.advance();
        id
    }

    fn advance(&mut self) {
        self.next_id = self.next_id.checked_add(1).unwrap_or(self.first_id);
    }

    /// Insert a connection under its own id
    pub fn insert(&mut self, connection: Connection) {
        self.connections.insert(connection.id(), connection);
    }

    /// Remove and return a connection
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    /// Get a connection by id
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Get a connection by id, mutably
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Snapshot of all live connection ids
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Number of open connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drain every connection out of the registry
    pub fn drain(&mut self) -> impl Iterator<Item = Connection> + '_ {
        self.connections.drain().map(|(_, conn)| conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::net::TcpStream;

    fn test_connection(id: ConnectionId) -> (Connection, std::net::TcpStream) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::net::TcpStream::connect(addr).unwrap();
        let (accepted, peer_addr) = listener.accept().unwrap();
        accepted.set_nonblocking(true).unwrap();

        let conn = Connection::new(TcpStream::from_std(accepted), peer_addr, id, 1024);
        (conn, client)
    }

    #[test]
    fn test_allocate_ids_monotonically() {
        let mut registry = ConnectionRegistry::new(2);

        assert_eq!(registry.allocate_id(), ConnectionId::new(2));
        assert_eq!(registry.allocate_id(), ConnectionId::new(3));
        assert_eq!(registry.allocate_id(), ConnectionId::new(4));
    }

    #[test]
    fn test_allocate_skips_live_ids() {
        let mut registry = ConnectionRegistry::new(2);

        let id = registry.allocate_id();
        let (conn, _client) = test_connection(id);
        registry.insert(conn);

        // Force the allocator to walk over the live id again.
        registry.next_id = id.as_usize();
        assert_ne!(registry.allocate_id(), id);
    }

    #[test]
    fn test_insert_remove_round_trip() {
        let mut registry = ConnectionRegistry::new(2);
        assert!(registry.is_empty());

        let id = registry.allocate_id();
        let (conn, _client) = test_connection(id);
        registry.insert(conn);

        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).is_some());
        assert_eq!(registry.ids(), vec![id]);

        let removed = registry.remove(id).unwrap();
        assert_eq!(removed.id(), id);
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drain_empties_the_registry() {
        let mut registry = ConnectionRegistry::new(2);
        let mut clients = Vec::new();

        for _ in 0..3 {
            let id = registry.allocate_id();
            let (conn, client) = test_connection(id);
            registry.insert(conn);
            clients.push(client);
        }

        assert_eq!(registry.drain().count(), 3);
        assert!(registry.is_empty());
    }
}
