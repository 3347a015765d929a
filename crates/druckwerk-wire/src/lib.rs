// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwerk Wire — the binary encoding of IPP requests (RFC 8010 §3).
//
// This crate is the codec only: it turns a `Request` into the exact byte
// layout third-party IPP peers validate, and parses one back from a blocking
// byte stream.  Transport (HTTP framing, TCP), attribute semantics (which
// name takes which kind), and printer business logic all live elsewhere and
// talk to this crate through `Request`, `std::io::Read`, and `std::io::Write`.
//
// Layering, innermost first:
//
//   tag       — delimiter and value tag bytes (the constant registry)
//   value     — one tagged (name, value) occurrence <-> bytes
//   attribute — one attribute, including the multi-value empty-name rule
//   request   — header, group state machine, end marker, document payload

pub mod attribute;
pub mod request;
pub mod tag;
pub mod value;

pub use request::{RequestDecoder, encode_request};
pub use tag::{DelimiterTag, ValueTag};
