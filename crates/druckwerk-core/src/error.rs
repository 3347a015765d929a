// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error type for the Druckwerk wire codec.
//
// Two families of failure exist on the wire (RFC 8010 gives no recovery
// mechanism for either): I/O errors from the underlying stream, and
// structural errors where the byte layout itself is wrong.  A structural
// error leaves the stream at an indeterminate offset, so the only sane
// recovery policy for callers is to discard the connection.

use thiserror::Error;

/// Top-level error type for all Druckwerk encode/decode operations.
#[derive(Debug, Error)]
pub enum WireError {
    // -- Stream errors --
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a length-prefixed field.
    #[error("truncated {0}")]
    Truncated(&'static str),

    // -- Structural decode errors --
    /// A value tag byte that maps to no known value type (RFC 8010 §3.5.2).
    #[error("unknown value tag 0x{0:02X}")]
    UnknownValueTag(u8),

    /// A byte in the reserved delimiter range (0x00..=0x0F) that maps to no
    /// assigned delimiter (RFC 8010 §3.5.1).
    #[error("unknown delimiter tag 0x{0:02X}")]
    UnknownDelimiterTag(u8),

    /// A fixed-width value payload arrived with the wrong length
    /// (e.g. an integer that is not exactly 4 bytes).
    #[error("value tag 0x{tag:02X} has invalid payload length {len}")]
    ValueLength { tag: u8, len: usize },

    /// An additional-value occurrence (name-length = 0, RFC 8010 §3.1.4)
    /// arrived with no preceding named attribute to attach to.
    #[error("additional value with no preceding attribute")]
    OrphanValue,

    // -- Structural encode errors --
    /// A name or value payload does not fit the 2-byte length field.
    #[error("{field} too long ({len} bytes, max 65535)")]
    FieldTooLong { field: &'static str, len: usize },

    /// A multi-valued attribute mixed value kinds; every element must share
    /// the set's wire-type tag.
    #[error("mixed value kinds in multi-valued attribute {0:?}")]
    MixedValueSet(String),

    /// A multi-valued attribute with zero elements has no wire form.
    #[error("empty value set for attribute {0:?}")]
    EmptyValueSet(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WireError>;
