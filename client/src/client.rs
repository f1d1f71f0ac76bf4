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

//! Chat client connection
//!
//! Sending happens on the caller's thread; receiving runs on a cloned socket
//! in a dedicated thread so room traffic is delivered while the caller blocks
//! on its input source.

use crate::config::ClientConfig;
use crate::error::ClientError;
use bytes::BytesMut;
use chatrelay_linecodec::{LineDecoder, LineEncoder};
use std::io::{BufRead, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// A connected chat client
#[derive(Debug)]
pub struct ChatClient {
    stream: TcpStream,
    config: ClientConfig,
    encoder: LineEncoder,
}

impl ChatClient {
    /// Connect to the chat relay named by the configuration
    pub fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(config.address())?;
        stream.set_nodelay(true)?;
        info!(addr = %config.address(), "connected to chat relay");

        Ok(Self {
            stream,
            config,
            encoder: LineEncoder::new(),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the local address of the connection.
    ///
    /// The local port is the tag the server annotates this client's
    /// messages with.
    pub fn local_addr(&self) -> Result<SocketAddr, ClientError> {
        Ok(self.stream.local_addr()?)
    }

    /// Send one line to the room
    pub fn send_line(&self, line: &str) -> Result<(), ClientError> {
        let mut buf = BytesMut::with_capacity(line.len() + 1);
        self.encoder.encode(line, &mut buf);
        (&self.stream).write_all(&buf)?;
        debug!(len = buf.len(), "sent line");
        Ok(())
    }

    /// Spawn the receiver thread.
    ///
    /// The thread reads the socket until the server closes it, handing each
    /// decoded message to `sink`. It exits on its own once the connection is
    /// gone.
    pub fn spawn_receiver<F>(&self, sink: F) -> Result<JoinHandle<()>, ClientError>
    where
        F: FnMut(String) + Send + 'static,
    {
        let stream = self.stream.try_clone()?;
        Ok(std::thread::spawn(move || receive_loop(stream, sink)))
    }

    /// Drive a full session from an input source.
    ///
    /// Each line read from `input` is sent to the room; every message the
    /// room sends back goes to `sink`. The session ends when `input` reaches
    /// EOF or yields the quit token, after which the outbound half is shut
    /// down and the receiver is drained to completion.
    pub fn run<R, F>(self, input: R, sink: F) -> Result<(), ClientError>
    where
        R: BufRead,
        F: FnMut(String) + Send + 'static,
    {
        let receiver = self.spawn_receiver(sink)?;

        for line in input.lines() {
            let line = line?;
            self.send_line(&line)?;
            if line == self.config.quit_token {
                break;
            }
        }

        // EOF on the outbound half tells the server we are done even when
        // the input ended without the quit token.
        if let Err(err) = self.stream.shutdown(Shutdown::Write) {
            debug!(?err, "outbound shutdown failed");
        }

        receiver.join().map_err(|_| ClientError::ReceiverFailed)
    }
}

fn receive_loop<F>(mut stream: TcpStream, mut sink: F)
where
    F: FnMut(String),
{
    let decoder = LineDecoder::new();
    let mut buf = BytesMut::new();
    let mut chunk = [0u8; 4096];

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => {
                info!("server closed the connection");
                break;
            }
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                for message in decoder.decode_all(&mut buf) {
                    sink(message);
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(?err, "receive failed");
                break;
            }
        }
    }
}
