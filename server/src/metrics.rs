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

//! Lock-free metrics for the chat relay server
//!
//! The event loop itself is single-threaded, but metrics are read from other
//! threads (monitoring, tests waiting on connection counts), so everything
//! here is atomic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free relay metrics
///
/// Use [`ServerMetrics::snapshot`] to get a consistent point-in-time view.
#[derive(Debug)]
pub struct ServerMetrics {
    total_connections: AtomicU64,
    active_connections: AtomicU64,
    messages_relayed: AtomicU64,
    connections_rejected: AtomicU64,
    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            messages_relayed: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record a new connection being opened
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection being closed
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a connection rejected at the connection limit
    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one message fanned out to the room
    pub fn message_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current number of active connections
    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the total number of connections since server start
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Get the number of messages relayed since server start
    pub fn messages_relayed(&self) -> u64 {
        self.messages_relayed.load(Ordering::Relaxed)
    }

    /// Get the number of connections rejected at the limit
    pub fn connections_rejected(&self) -> u64 {
        self.connections_rejected.load(Ordering::Relaxed)
    }

    /// Get a consistent snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections(),
            active_connections: self.active_connections(),
            messages_relayed: self.messages_relayed(),
            connections_rejected: self.connections_rejected(),
            uptime: self.started_at.elapsed(),
        }
    }
}

/// Point-in-time view of the relay metrics
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total connections since server start
    pub total_connections: u64,
    /// Currently open connections
    pub active_connections: u64,
    /// Messages fanned out since server start
    pub messages_relayed: u64,
    /// Connections dropped at the connection limit
    pub connections_rejected: u64,
    /// Time since the metrics were created
    pub uptime: Duration,
}
