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

//! Broadcast dispatcher
//!
//! Fans one decoded message out to every connection except its sender. Each
//! peer gets an independent queue-then-flush attempt, so a slow or blocked
//! peer never delays the others; bytes the socket refuses stay queued and
//! write interest is armed for that peer alone.

use crate::error::{Result, ServerError};
use crate::registry::ConnectionRegistry;
use crate::types::ConnectionId;
use metrics::counter;
use tracing::{debug, warn};

/// Result of one broadcast fan-out
#[derive(Debug, Clone, Default)]
pub struct BroadcastResult {
    /// Number of peers the message was addressed to (everyone but the sender)
    pub total: usize,
    /// Peers whose sockets accepted the whole payload immediately
    pub delivered: usize,
    /// Peers left with bytes queued and write interest armed
    pub queued: usize,
    /// Peers whose sockets failed hard and were torn down
    pub dropped: usize,
}

impl BroadcastResult {
    /// Check if every addressed peer took the payload immediately
    pub fn all_delivered(&self) -> bool {
        self.delivered == self.total
    }
}

/// Format the annotated payload for one message.
///
/// The tag identifies the sender by its remote port, which is stable and
/// unique for the lifetime of the connection. The trailing newline is the
/// wire delimiter.
pub fn format_message(source_port: u16, line: &str) -> String {
    format!("client[{source_port}]: {line}\n")
}

/// Deliver `line` from `source` to every other live connection.
///
/// Sockets that fail hard during the fan-out are deregistered and removed
/// before this returns; the caller learns how many through
/// [`BroadcastResult::dropped`]. The sender itself is never written to,
/// even when the line is the quit token.
pub fn broadcast(
    connections: &mut ConnectionRegistry,
    registry: &mio::Registry,
    source: ConnectionId,
    line: &str,
) -> Result<BroadcastResult> {
    let source_port = connections
        .get(source)
        .ok_or(ServerError::ConnectionNotFound(source))?
        .peer_addr()
        .port();
    let payload = format_message(source_port, line);

    let mut result = BroadcastResult::default();
    let mut dead = Vec::new();

    for id in connections.ids() {
        if id == source {
            continue;
        }
        let Some(conn) = connections.get_mut(id) else {
            continue;
        };
        result.total += 1;

        conn.queue(payload.as_bytes());
        if !conn.flush() {
            dead.push(id);
            continue;
        }

        if conn.wants_write() {
            if conn.update_interest(registry).is_err() {
                dead.push(id);
                continue;
            }
            result.queued += 1;
        } else {
            result.delivered += 1;
        }
    }

    for id in dead {
        if let Some(mut conn) = connections.remove(id) {
            conn.deregister(registry);
            warn!(id = %id, peer_addr = %conn.peer_addr(), "peer dropped during broadcast");
        }
        result.dropped += 1;
    }

    counter!("chatrelay.messages.relayed").increment(1);
    debug!(
        source = %source,
        total = result.total,
        delivered = result.delivered,
        queued = result.queued,
        dropped = result.dropped,
        "broadcast complete"
    );

    Ok(result)
}
