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

//! # Chat Relay Server Example
//!
//! Runs the relay on the default address and prints structured logs for
//! every connection and message.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example chat_server -- [bind-address]
//! ```
//!
//! Connect with `cargo run --example chat_client`, or with netcat:
//!
//! ```bash
//! nc 127.0.0.1 8888
//! ```
//!
//! Send `quit` on a line of its own to leave the room.

use chatrelay_server::{ChatServer, ServerConfig};
use std::net::SocketAddr;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let bind_address: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8888".to_string())
        .parse()?;

    let mut server = ChatServer::new(ServerConfig::new(bind_address))?;
    println!("Chat relay listening on {}", server.local_addr());
    println!("Connect with: nc {}", server.local_addr());

    println!("Press Ctrl-D to stop");

    let handle = server.shutdown_handle();
    shutdown_on_stdin_eof(move || handle.shutdown());

    server.run()?;

    Ok(())
}

/// Shut the relay down when stdin reaches EOF (Ctrl-D on the terminal).
fn shutdown_on_stdin_eof<F: FnOnce() + Send + 'static>(shutdown: F) {
    std::thread::spawn(move || {
        let mut sink = String::new();
        while let Ok(n) = std::io::stdin().read_line(&mut sink) {
            if n == 0 {
                break;
            }
            sink.clear();
        }
        shutdown();
    });
}
