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

//! # Chat Relay Client Example
//!
//! Interactive terminal client for the chat relay. Lines typed on stdin are
//! sent to the room; messages from the room print as they arrive.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example chat_client -- [host] [port]
//! ```
//!
//! Type `quit` to leave the room, or press Ctrl-D to hang up.

use chatrelay_client::{ChatClient, ClientConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.next().unwrap_or_else(|| "8888".to_string()).parse()?;

    let client = ChatClient::connect(ClientConfig::new(host, port))?;
    println!(
        "Connected as client[{}]; type 'quit' to leave",
        client.local_addr()?.port()
    );

    let stdin = std::io::stdin();
    client.run(stdin.lock(), |message| println!("{message}"))?;

    println!("Disconnected");
    Ok(())
}
