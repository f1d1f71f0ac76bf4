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

//! Error types for the chat relay server

use crate::types::ConnectionId;
use thiserror::Error;

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;

/// Chat relay server error types
///
/// Per-connection failures (peer reset, broken pipe, zero-length read) are
/// handled locally by tearing the affected connection down and never surface
/// here; these variants cover the listener and API boundaries, where an error
/// is fatal to the loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error on the listener or the poll itself
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection with the given ID was not found
    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),
}

impl ServerError {
    /// Check if the error names a missing connection rather than an I/O failure
    pub fn is_connection_error(&self) -> bool {
        matches!(self, ServerError::ConnectionNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::ConnectionNotFound(ConnectionId::new(42));
        assert_eq!(err.to_string(), "Connection conn-42 not found");
    }

    #[test]
    fn test_error_is_connection_error() {
        assert!(ServerError::ConnectionNotFound(ConnectionId::new(1)).is_connection_error());

        let io = ServerError::Io(std::io::Error::other("boom"));
        assert!(!io.is_connection_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "bind");
        let err: ServerError = io.into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
