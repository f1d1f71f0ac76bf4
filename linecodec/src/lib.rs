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

//! Newline-delimited text framing for chatrelay
//!
//! The chat wire format is plain text: one message per line, delimited by a
//! single `\n` byte, no length prefix. Because the relay reads from
//! non-blocking sockets, message bytes arrive in arbitrary fragments; the
//! [`LineDecoder`] accumulates fragments in a caller-owned buffer and yields
//! complete lines as soon as their delimiter arrives, leaving any trailing
//! partial line in place for the next read.
//!
//! Decoding is best-effort UTF-8: malformed sequences are replaced, never
//! rejected, so a misbehaving client cannot take its connection down with a
//! stray byte.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use chatrelay_linecodec::LineDecoder;
//!
//! let decoder = LineDecoder::new();
//! let mut buf = BytesMut::from(&b"hello\nwor"[..]);
//!
//! assert_eq!(decoder.decode(&mut buf), Some("hello".to_string()));
//! assert_eq!(decoder.decode(&mut buf), None);
//! assert_eq!(&buf[..], b"wor");
//! ```

mod codec;

pub use codec::{LineDecoder, LineEncoder};
