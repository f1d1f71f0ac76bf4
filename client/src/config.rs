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

//! Client configuration

/// Chat client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server hostname or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Line that ends the session when sent.
    ///
    /// Must match the token the server watches for.
    pub quit_token: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            quit_token: "quit".to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the quit token
    pub fn with_quit_token(mut self, token: impl Into<String>) -> Self {
        self.quit_token = token.into();
        self
    }

    /// The `host:port` address string to connect to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
