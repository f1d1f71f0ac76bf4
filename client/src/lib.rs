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

//! # Chatrelay Client
//!
//! Line-oriented chat client for the chatrelay server. The client keeps the
//! transmit path on the caller's thread and moves receiving onto a dedicated
//! reader thread, so messages from the room appear as they arrive while the
//! caller blocks on its own input source.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chatrelay_client::{ChatClient, ClientConfig};
//!
//! fn main() -> Result<(), chatrelay_client::ClientError> {
//!     let config = ClientConfig::new("127.0.0.1", 8888);
//!     let client = ChatClient::connect(config)?;
//!
//!     // Reads lines from stdin until EOF or the quit token, printing
//!     // everything the room sends back.
//!     let stdin = std::io::stdin();
//!     client.run(stdin.lock(), |message| println!("{message}"))
//! }
//! ```

mod client;
mod config;
mod error;

pub use self::client::ChatClient;
pub use self::config::ClientConfig;
pub use self::error::ClientError;
