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

//! Core types for the chat relay server

use mio::Token;
use std::fmt;

/// Unique identifier for a connection.
///
/// The id doubles as the connection's `mio::Token`, so the value space is
/// shared with the reserved listener and waker tokens; client ids are
/// allocated starting above those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(usize);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the underlying usize value
    pub fn as_usize(&self) -> usize {
        self.0
    }

    /// The poll token for this connection
    pub fn token(self) -> Token {
        Token(self.0)
    }
}

impl From<Token> for ConnectionId {
    fn from(token: Token) -> Self {
        Self(token.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_ordering() {
        let id1 = ConnectionId::new(1);
        let id2 = ConnectionId::new(2);

        assert_eq!(id1.as_usize(), 1);
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_connection_id_token_round_trip() {
        let id = ConnectionId::new(42);
        assert_eq!(ConnectionId::from(id.token()), id);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }
}
