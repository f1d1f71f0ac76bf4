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

//! Chat relay server: event loop and lifecycle
//!
//! `ChatServer` binds the listener, owns the poll and the connection
//! registry, and drives everything from one thread. Readiness events are
//! dispatched by token: the reserved listener token accepts, the reserved
//! waker token lets [`ShutdownHandle`] interrupt the wait, and every other
//! token is a client connection's read/write handler.

use crate::broadcast::broadcast;
use crate::config::ServerConfig;
use crate::connection::{Connection, ReadOutcome};
use crate::error::Result;
use crate::metrics::ServerMetrics;
use crate::registry::ConnectionRegistry;
use crate::types::ConnectionId;
use metrics::{counter, gauge};
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token, Waker};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Token reserved for the listening socket
const LISTENER: Token = Token(0);
/// Token reserved for the shutdown waker
const WAKER: Token = Token(1);
/// First token handed out to client connections
const FIRST_CLIENT_ID: usize = 2;

/// Handle for requesting server shutdown from another thread.
///
/// Sets the shutdown flag and wakes the poll so the event loop observes it
/// without waiting for socket traffic.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Request shutdown of the event loop
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(err) = self.waker.wake() {
            warn!(?err, "failed to wake event loop for shutdown");
        }
    }

    /// Check whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The chat relay server
///
/// # Example
///
/// ```no_run
/// use chatrelay_server::{ChatServer, ServerConfig};
///
/// # fn main() -> chatrelay_server::Result<()> {
/// let mut server = ChatServer::new(ServerConfig::default())?;
/// let handle = server.shutdown_handle();
///
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(60));
///     handle.shutdown();
/// });
///
/// server.run()
/// # }
/// ```
#[derive(Debug)]
pub struct ChatServer {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    poll: Poll,
    connections: ConnectionRegistry,
    metrics: Arc<ServerMetrics>,
    shutdown: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ChatServer {
    /// Bind the listener and set up the poll.
    ///
    /// A bind or poll setup failure is not recoverable and surfaces here.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let mut listener = TcpListener::bind(config.bind_address)?;
        let local_addr = listener.local_addr()?;

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        info!(%local_addr, "chat relay bound");

        Ok(Self {
            config,
            listener,
            local_addr,
            poll,
            connections: ConnectionRegistry::new(FIRST_CLIENT_ID),
            metrics: Arc::new(ServerMetrics::new()),
            shutdown: Arc::new(AtomicBool::new(false)),
            waker,
        })
    }

    /// Get the actual bound address (useful when binding port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the number of open connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the server metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Get a handle for requesting shutdown from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: self.shutdown.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run the event loop.
    ///
    /// Blocks until shutdown is requested or the listener fails fatally.
    /// Either way, every live connection is closed before this returns.
    pub fn run(&mut self) -> Result<()> {
        info!(addr = %self.local_addr, "chat relay listening");
        let result = self.event_loop();
        self.close_all();
        if let Err(err) = &result {
            error!(?err, "chat relay terminated");
        }
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.config.event_capacity);

        while !self.shutdown.load(Ordering::SeqCst) {
            if let Err(err) = self.poll.poll(&mut events, self.config.poll_timeout) {
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err.into());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_ready()?,
                    // Shutdown flag is re-checked at the top of the loop.
                    WAKER => {}
                    token => {
                        let id = ConnectionId::from(token);
                        if event.is_readable() {
                            self.read_ready(id);
                        }
                        if event.is_writable() {
                            self.write_ready(id);
                        }
                    }
                }
            }
        }

        info!("shutdown requested");
        Ok(())
    }

    /// Accept every pending connection attempt.
    ///
    /// Draining until `WouldBlock` re-arms accept interest, so concurrent
    /// attempts are never starved. Only listener-level failures propagate;
    /// they are fatal to the loop.
    fn accept_ready(&mut self) -> Result<()> {
        loop {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => {
                    if self.connections.len() >= self.config.max_connections {
                        warn!(
                            %peer_addr,
                            limit = self.config.max_connections,
                            "connection limit reached, rejecting"
                        );
                        self.metrics.connection_rejected();
                        counter!("chatrelay.connections.rejected").increment(1);
                        drop(stream);
                        continue;
                    }

                    let id = self.connections.allocate_id();
                    let mut conn =
                        Connection::new(stream, peer_addr, id, self.config.read_chunk_size);
                    if let Err(err) = conn.register(self.poll.registry()) {
                        warn!(%peer_addr, ?err, "failed to register connection");
                        continue;
                    }

                    info!(id = %id, %peer_addr, "client connected");
                    self.connections.insert(conn);
                    self.metrics.connection_opened();
                    counter!("chatrelay.connections.total").increment(1);
                    gauge!("chatrelay.connections.active").increment(1.0);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset
                    ) =>
                {
                    warn!(?err, "transient accept error");
                    continue;
                }
                Err(err) => {
                    error!(?err, "listener failure");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    /// Drain a read-ready connection and relay its complete lines.
    fn read_ready(&mut self, id: ConnectionId) {
        // A teardown earlier in this poll batch may already have removed it.
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };

        match conn.read_ready() {
            ReadOutcome::Open(lines) => {
                for line in &lines {
                    self.relay(id, line);
                    if *line == self.config.quit_token {
                        // The quit line has been forwarded; anything the
                        // sender buffered after it is discarded.
                        self.teardown(id, "quit");
                        return;
                    }
                }
            }
            ReadOutcome::Closed(lines) => {
                // Lines that were complete before the close still go out.
                for line in &lines {
                    self.relay(id, line);
                }
                self.teardown(id, "peer closed");
            }
        }
    }

    /// Drain a write-ready connection's outbound queue.
    fn write_ready(&mut self, id: ConnectionId) {
        let Some(conn) = self.connections.get_mut(id) else {
            return;
        };

        if conn.flush() {
            // Disarm write interest once the queue is empty.
            if conn.update_interest(self.poll.registry()).is_err() {
                self.teardown(id, "reregister failed");
            }
        } else {
            self.teardown(id, "write failed");
        }
    }

    /// Fan one line out to the rest of the room.
    fn relay(&mut self, source: ConnectionId, line: &str) {
        match broadcast(&mut self.connections, self.poll.registry(), source, line) {
            Ok(result) => {
                self.metrics.message_relayed();
                // Peers that died mid-broadcast were removed there; settle
                // the connection accounting for them here.
                for _ in 0..result.dropped {
                    self.metrics.connection_closed();
                    gauge!("chatrelay.connections.active").decrement(1.0);
                }
            }
            Err(err) => warn!(source = %source, ?err, "broadcast failed"),
        }
    }

    /// Deregister, close, and forget one connection.
    fn teardown(&mut self, id: ConnectionId, reason: &str) {
        if let Some(mut conn) = self.connections.remove(id) {
            conn.deregister(self.poll.registry());
            info!(id = %id, peer_addr = %conn.peer_addr(), reason, "client disconnected");
            self.metrics.connection_closed();
            gauge!("chatrelay.connections.active").decrement(1.0);
        }
    }

    /// Close every connection and the listener.
    fn close_all(&mut self) {
        let open = self.connections.len();
        for mut conn in self.connections.drain() {
            conn.deregister(self.poll.registry());
            debug!(id = %conn.id(), peer_addr = %conn.peer_addr(), "closing connection");
        }
        for _ in 0..open {
            self.metrics.connection_closed();
        }
        gauge!("chatrelay.connections.active").set(0.0);

        if let Err(err) = self.poll.registry().deregister(&mut self.listener) {
            warn!(?err, "failed to deregister listener");
        }
        info!("chat relay stopped");
    }
}
