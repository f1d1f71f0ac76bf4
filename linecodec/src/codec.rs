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

//! Incremental line decoder and encoder

use bytes::{BufMut, BytesMut};
use tracing::trace;

/// Incremental decoder for newline-delimited text.
///
/// The decoder itself is stateless; all accumulation state lives in the
/// caller's `BytesMut`, so one decoder can serve any number of buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDecoder;

impl LineDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Extract the next complete line from `buf`.
    ///
    /// Consumes the line and its delimiter from the buffer. The `\n` is
    /// stripped from the decoded output, as is a `\r` immediately before it
    /// (telnet-style clients terminate lines with `\r\n`). Returns `None`
    /// and leaves the buffer untouched when no delimiter is present.
    ///
    /// Malformed UTF-8 is decoded lossily and never fails.
    pub fn decode(&self, buf: &mut BytesMut) -> Option<String> {
        let pos = buf.iter().position(|&b| b == b'\n')?;
        let frame = buf.split_to(pos + 1);

        let mut body = &frame[..pos];
        if body.last() == Some(&b'\r') {
            body = &body[..body.len() - 1];
        }

        Some(String::from_utf8_lossy(body).into_owned())
    }

    /// Drain every complete line currently in `buf`, in arrival order.
    pub fn decode_all(&self, buf: &mut BytesMut) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.decode(buf) {
            lines.push(line);
        }
        if !lines.is_empty() {
            trace!(count = lines.len(), remaining = buf.len(), "decoded lines");
        }
        lines
    }
}

/// Encoder for newline-delimited text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineEncoder;

impl LineEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self
    }

    /// Append `line` and its delimiter to `dst`.
    ///
    /// The caller supplies the payload without a trailing newline; the
    /// delimiter is always exactly one `\n` byte.
    pub fn encode(&self, line: &str, dst: &mut BytesMut) {
        dst.reserve(line.len() + 1);
        dst.put_slice(line.as_bytes());
        dst.put_u8(b'\n');
    }
}
