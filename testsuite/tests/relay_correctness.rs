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

//! End-to-end correctness tests for the chat relay
//!
//! Each test boots a real server on an ephemeral port, attaches raw TCP
//! clients, and checks the relay contract on the wire: annotation format,
//! sender exclusion, ordering, quit handling, and disconnect behavior.

use chatrelay_client::{ChatClient, ClientConfig};
use chatrelay_server::{ChatServer, ServerConfig, ServerMetrics, ShutdownHandle};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// ============================================================================
// Harness
// ============================================================================

struct Relay {
    addr: SocketAddr,
    handle: ShutdownHandle,
    metrics: Arc<ServerMetrics>,
    join: Option<JoinHandle<chatrelay_server::Result<()>>>,
}

impl Relay {
    /// Boot a relay on an ephemeral port and run it on its own thread.
    fn start() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let mut server = ChatServer::new(config).unwrap();
        let addr = server.local_addr();
        let handle = server.shutdown_handle();
        let metrics = server.metrics();
        let join = std::thread::spawn(move || server.run());

        Self {
            addr,
            handle,
            metrics,
            join: Some(join),
        }
    }

    /// Block until the server counts `n` active connections.
    fn wait_for_clients(&self, n: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.metrics.active_connections() != n {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {n} active connections, have {}",
                self.metrics.active_connections()
            );
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn stop(mut self) {
        self.handle.shutdown();
        if let Some(join) = self.join.take() {
            join.join().unwrap().unwrap();
        }
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.handle.shutdown();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Raw blocking TCP client speaking the wire protocol directly.
struct TestClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TestClient {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_nodelay(true).unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { stream, reader }
    }

    /// The port the server will annotate this client's messages with.
    fn tag(&self) -> u16 {
        self.stream.local_addr().unwrap().port()
    }

    fn send(&mut self, line: &str) {
        self.stream.write_all(line.as_bytes()).unwrap();
        self.stream.write_all(b"\n").unwrap();
    }

    /// Receive one message, without its trailing newline.
    fn recv(&mut self) -> String {
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).unwrap();
        assert!(n > 0, "connection closed while expecting a message");
        line.truncate(line.trim_end_matches('\n').len());
        line
    }

    /// Assert nothing arrives within a short window.
    fn assert_silent(&mut self) {
        self.stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => panic!("connection closed while expecting silence"),
            Ok(_) => panic!("unexpected message: {line:?}"),
            Err(err) => assert!(
                matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
                "unexpected error: {err:?}"
            ),
        }
    }

    /// Assert the server has closed this connection.
    fn expect_eof(&mut self) {
        self.stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut line = String::new();
        assert_eq!(self.reader.read_line(&mut line).unwrap(), 0);
    }
}

fn annotated(tag: u16, line: &str) -> String {
    format!("client[{tag}]: {line}")
}

// ============================================================================
// Relay contract
// ============================================================================

#[test]
fn test_broadcast_reaches_everyone_but_the_sender() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    let mut c3 = TestClient::connect(relay.addr);
    relay.wait_for_clients(3);

    c1.send("hello room");

    let expected = annotated(c1.tag(), "hello room");
    assert_eq!(c2.recv(), expected);
    assert_eq!(c3.recv(), expected);
    c1.assert_silent();

    relay.stop();
}

#[test]
fn test_messages_arrive_in_send_order() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    for i in 0..5 {
        c1.send(&format!("message {i}"));
    }
    for i in 0..5 {
        assert_eq!(c2.recv(), annotated(c1.tag(), &format!("message {i}")));
    }

    relay.stop();
}

#[test]
fn test_payloads_relay_verbatim() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    c1.send("héllo wörld \u{2603}");
    assert_eq!(c2.recv(), annotated(c1.tag(), "héllo wörld \u{2603}"));

    c1.send("");
    assert_eq!(c2.recv(), annotated(c1.tag(), ""));

    relay.stop();
}

#[test]
fn test_quit_is_forwarded_then_sender_disconnected() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    c1.send("quit");

    assert_eq!(c2.recv(), annotated(c1.tag(), "quit"));
    c1.expect_eof();
    relay.wait_for_clients(1);

    // The room keeps working after the departure.
    let mut c3 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);
    c2.send("still here");
    assert_eq!(c3.recv(), annotated(c2.tag(), "still here"));

    relay.stop();
}

#[test]
fn test_quit_only_matches_the_whole_line() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    c1.send("quitting time");
    c1.send("please do not quit");
    assert_eq!(c2.recv(), annotated(c1.tag(), "quitting time"));
    assert_eq!(c2.recv(), annotated(c1.tag(), "please do not quit"));

    // Still connected.
    c1.send("proof");
    assert_eq!(c2.recv(), annotated(c1.tag(), "proof"));

    relay.stop();
}

#[test]
fn test_peer_close_removes_the_connection() {
    let relay = Relay::start();
    let c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    drop(c1);
    relay.wait_for_clients(1);

    // Alone in the room: nothing echoes back.
    c2.send("anyone there?");
    c2.assert_silent();

    relay.stop();
}

#[test]
fn test_lines_sent_before_close_still_relay() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    let tag = c1.tag();
    c1.send("parting words");
    drop(c1);

    assert_eq!(c2.recv(), annotated(tag, "parting words"));
    relay.wait_for_clients(1);

    relay.stop();
}

#[test]
fn test_fragmented_writes_reassemble_into_one_message() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    for fragment in ["fra", "gmen", "ted line\n"] {
        c1.stream.write_all(fragment.as_bytes()).unwrap();
        c1.stream.flush().unwrap();
        std::thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(c2.recv(), annotated(c1.tag(), "fragmented line"));

    relay.stop();
}

#[test]
fn test_shutdown_closes_every_connection() {
    let relay = Relay::start();
    let mut c1 = TestClient::connect(relay.addr);
    let mut c2 = TestClient::connect(relay.addr);
    relay.wait_for_clients(2);

    let metrics = relay.metrics.clone();
    relay.stop();

    c1.expect_eof();
    c2.expect_eof();
    assert_eq!(metrics.active_connections(), 0);
    assert_eq!(metrics.total_connections(), 2);
}

// ============================================================================
// Client library against a live relay
// ============================================================================

#[test]
fn test_chat_client_sends_and_receives() {
    let relay = Relay::start();
    let mut raw = TestClient::connect(relay.addr);
    relay.wait_for_clients(1);

    let config = ClientConfig::new(relay.addr.ip().to_string(), relay.addr.port());
    let client = ChatClient::connect(config).unwrap();
    relay.wait_for_clients(2);
    let client_tag = client.local_addr().unwrap().port();

    let (tx, rx) = mpsc::channel();
    let receiver = client
        .spawn_receiver(move |message| tx.send(message).unwrap())
        .unwrap();

    client.send_line("from the library").unwrap();
    assert_eq!(raw.recv(), annotated(client_tag, "from the library"));

    raw.send("from the wire");
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        annotated(raw.tag(), "from the wire")
    );

    client.send_line("quit").unwrap();
    relay.wait_for_clients(1);
    receiver.join().unwrap();

    relay.stop();
}

#[test]
fn test_chat_client_run_session() {
    let relay = Relay::start();
    let mut raw = TestClient::connect(relay.addr);
    relay.wait_for_clients(1);

    let config = ClientConfig::new(relay.addr.ip().to_string(), relay.addr.port());
    let client = ChatClient::connect(config).unwrap();
    relay.wait_for_clients(2);
    let client_tag = client.local_addr().unwrap().port();

    let (tx, rx) = mpsc::channel();
    let input = std::io::Cursor::new("one\ntwo\nquit\n");
    let session = std::thread::spawn(move || {
        client.run(input, move |message| {
            let _ = tx.send(message);
        })
    });

    assert_eq!(raw.recv(), annotated(client_tag, "one"));
    assert_eq!(raw.recv(), annotated(client_tag, "two"));
    assert_eq!(raw.recv(), annotated(client_tag, "quit"));

    session.join().unwrap().unwrap();
    drop(rx);
    relay.wait_for_clients(1);

    relay.stop();
}
