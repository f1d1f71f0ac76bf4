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

//! Chat Relay Server Implementation
//!
//! A single-process, single-threaded chat relay. Every client socket is
//! non-blocking and multiplexed through one readiness loop; there is no task
//! or thread per connection, and no locking around connection state.
//!
//! # Architecture
//!
//! ```text
//! ChatServer (event loop + lifecycle)
//!     ↓
//! ConnectionRegistry → Connection (read buffer, outbound queue)
//!     ↓
//! broadcast (fan-out to every other connection)
//! ```
//!
//! The loop blocks in `mio::Poll::poll` until at least one registered handle
//! is ready, then dispatches each event by token: the listener token accepts
//! new connections, the waker token re-checks the shutdown flag, and any
//! other token maps to a client connection's read or write handler. Each
//! handler runs to completion (bounded by "until the socket would block")
//! before the loop re-enters the wait, so no two handlers ever observe the
//! registry mid-update.
//!
//! Messages are newline-delimited text. A decoded line is forwarded to every
//! other live connection as `client[<peer-port>]: <line>`; the literal
//! message `quit` disconnects the sender after it has been forwarded.
//!
//! # Example
//!
//! ```no_run
//! use chatrelay_server::{ChatServer, ServerConfig};
//!
//! fn main() -> chatrelay_server::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1:8888".parse().unwrap());
//!     let mut server = ChatServer::new(config)?;
//!
//!     // Runs until a ShutdownHandle fires or the listener fails.
//!     server.run()
//! }
//! ```

mod broadcast;
mod config;
mod connection;
mod error;
mod metrics;
mod registry;
mod server;
mod types;

pub use broadcast::{BroadcastResult, broadcast, format_message};
pub use config::ServerConfig;
pub use connection::{Connection, ReadOutcome};
pub use error::{Result, ServerError};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use registry::ConnectionRegistry;
pub use server::{ChatServer, ShutdownHandle};
pub use types::ConnectionId;
