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

//! Per-connection state and non-blocking I/O
//!
//! A `Connection` owns one accepted client socket plus the two buffers the
//! readiness loop needs: a read-accumulation buffer that grows as partial
//! reads arrive, and an outbound queue holding bytes the socket has not yet
//! accepted. The registry owns every `Connection`; the event loop and the
//! broadcast dispatcher only ever reach one through its id.

use crate::types::ConnectionId;
use bytes::{Buf, BytesMut};
use chatrelay_linecodec::LineDecoder;
use mio::Interest;
use mio::net::TcpStream;
use std::io::{ErrorKind, Read, Write};
use std::net::SocketAddr;
use tracing::{trace, warn};

/// Result of draining a read-ready socket.
///
/// Both variants carry the complete lines extracted during the drain, in
/// arrival order; `Closed` additionally signals that the peer is gone and the
/// connection must be torn down once those lines have been dispatched.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Connection remains open
    Open(Vec<String>),
    /// Peer closed the stream or the socket failed
    Closed(Vec<String>),
}

/// One accepted client connection
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    id: ConnectionId,
    peer_addr: SocketAddr,
    decoder: LineDecoder,
    read_buf: BytesMut,
    send_buf: BytesMut,
    chunk: Vec<u8>,
    interest: Interest,
}

impl Connection {
    /// Wrap an accepted non-blocking stream
    pub fn new(
        stream: TcpStream,
        peer_addr: SocketAddr,
        id: ConnectionId,
        read_chunk_size: usize,
    ) -> Self {
        Self {
            stream,
            id,
            peer_addr,
            decoder: LineDecoder::new(),
            read_buf: BytesMut::new(),
            send_buf: BytesMut::new(),
            chunk: vec![0; read_chunk_size.max(1)],
            interest: Interest::READABLE,
        }
    }

    /// Get the connection ID
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Register the connection with the poll for read interest
    pub fn register(&mut self, registry: &mio::Registry) -> std::io::Result<()> {
        registry.register(&mut self.stream, self.id.token(), self.interest)
    }

    /// Deregister the connection from the poll
    ///
    /// Dropping the connection afterwards closes the socket.
    pub fn deregister(&mut self, registry: &mio::Registry) {
        if let Err(err) = registry.deregister(&mut self.stream) {
            warn!(id = %self.id, ?err, "failed to deregister connection");
        }
    }

    /// Drain the socket until it would block, extracting complete lines.
    ///
    /// A zero-length read or a hard I/O error yields [`ReadOutcome::Closed`]
    /// with whatever complete lines arrived first; `WouldBlock` simply ends
    /// the drain.
    pub fn read_ready(&mut self) -> ReadOutcome {
        let mut closed = false;

        loop {
            match self.stream.read(&mut self.chunk) {
                Ok(0) => {
                    trace!(id = %self.id, "peer closed the stream");
                    closed = true;
                    break;
                }
                Ok(n) => {
                    trace!(id = %self.id, len = n, "read from socket");
                    self.read_buf.extend_from_slice(&self.chunk[..n]);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(id = %self.id, peer_addr = %self.peer_addr, ?err, "read failed");
                    closed = true;
                    break;
                }
            }
        }

        let lines = self.decoder.decode_all(&mut self.read_buf);
        if closed {
            ReadOutcome::Closed(lines)
        } else {
            ReadOutcome::Open(lines)
        }
    }

    /// Append bytes to the outbound queue without touching the socket
    pub fn queue(&mut self, payload: &[u8]) {
        self.send_buf.extend_from_slice(payload);
    }

    /// Drain as much of the outbound queue as the socket accepts.
    ///
    /// Returns `false` if the socket failed and the connection must be torn
    /// down; `WouldBlock` leaves the remainder queued and returns `true`.
    pub fn flush(&mut self) -> bool {
        while !self.send_buf.is_empty() {
            match self.stream.write(&self.send_buf) {
                Ok(0) => {
                    warn!(id = %self.id, remaining = self.send_buf.len(), "write returned zero");
                    break;
                }
                Ok(n) => {
                    trace!(id = %self.id, len = n, remaining = self.send_buf.len() - n, "wrote to socket");
                    self.send_buf.advance(n);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    warn!(id = %self.id, peer_addr = %self.peer_addr, ?err, "write failed");
                    return false;
                }
            }
        }
        true
    }

    /// Whether the outbound queue still holds unsent bytes
    pub fn wants_write(&self) -> bool {
        !self.send_buf.is_empty()
    }

    /// Align the poll registration with the outbound queue state.
    ///
    /// Write interest is armed only while the queue is non-empty, so an idle
    /// connection never generates write-ready wake-ups.
    pub fn update_interest(&mut self, registry: &mio::Registry) -> std::io::Result<()> {
        let wanted = if self.wants_write() {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };

        if wanted != self.interest {
            registry.reregister(&mut self.stream, self.id.token(), wanted)?;
            self.interest = wanted;
        }
        Ok(())
    }
}
