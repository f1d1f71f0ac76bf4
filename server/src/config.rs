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

//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

/// Default quit token; a client sending exactly this line is disconnected
/// after the line has been forwarded.
pub(crate) const DEFAULT_QUIT_TOKEN: &str = "quit";

/// Server configuration
///
/// # Example
///
/// ```
/// use chatrelay_server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::default()
///     .with_max_connections(500)
///     .with_poll_timeout(Some(Duration::from_secs(1)));
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections; sockets accepted beyond
    /// this limit are dropped immediately
    pub max_connections: usize,

    /// Capacity of the readiness event batch per poll
    pub event_capacity: usize,

    /// Optional poll timeout
    ///
    /// `None` blocks until a handle is ready. A timeout only bounds how long
    /// the loop sleeps between shutdown checks; it is not required for
    /// correctness.
    pub poll_timeout: Option<Duration>,

    /// Size of the scratch buffer for a single non-blocking read
    pub read_chunk_size: usize,

    /// Message that disconnects its sender after being forwarded
    pub quit_token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8888)),
            max_connections: 1024,
            event_capacity: 256,
            poll_timeout: None,
            read_chunk_size: 4096,
            quit_token: DEFAULT_QUIT_TOKEN.to_string(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with the given bind address
    ///
    /// All other settings use their default values.
    pub fn new(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Set the maximum number of concurrent connections
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the readiness event batch capacity
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Set the poll timeout
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set the per-read scratch buffer size
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the quit token
    pub fn with_quit_token(mut self, token: impl Into<String>) -> Self {
        self.quit_token = token.into();
        self
    }
}
