// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Druckwerk IPP wire codec.
//
// A request is a fixed header, three attribute groups, and (on decode only)
// an opaque trailing document stream.  Attribute values are a closed set of
// kinds, one per RFC 8010 value tag, so encode/decode can match exhaustively
// instead of inspecting types at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// IPP protocol version carried in the first two header bytes.
///
/// Both bytes are signed per RFC 8010 §3.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub major: i8,
    pub minor: i8,
}

impl Version {
    /// IPP/2.0 — the default for freshly constructed requests.
    pub const V2_0: Version = Version { major: 2, minor: 0 };

    /// IPP/1.1 — what most legacy printers speak.
    pub const V1_1: Version = Version { major: 1, minor: 1 };
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// An RFC 2579 DateAndTime value — the 11-byte dateTime layout of
/// RFC 8010 §3.9.
///
/// Kept as raw calendar fields rather than a resolved timestamp: the wire
/// layout carries deci-seconds and a UTC offset with an explicit direction
/// byte, and the codec's job is byte fidelity, not calendar arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub deci_seconds: u8,
    /// UTC offset direction: `b'+'` or `b'-'`.
    pub utc_direction: u8,
    pub utc_hours: u8,
    pub utc_minutes: u8,
}

/// A printer resolution value (RFC 8010 §3.9): two 4-byte integers and a
/// 1-byte unit code (3 = dots per inch, 4 = dots per centimetre).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub cross_feed: i32,
    pub feed: i32,
    pub units: i8,
}

/// A single attribute value, one variant per RFC 8010 §3.5.2 value tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// integer (0x21): 4-byte signed big-endian.
    Integer(i32),
    /// boolean (0x22): 1 byte, 0x00 or 0x01.
    Boolean(bool),
    /// enum (0x23): same wire encoding as integer.
    Enum(i32),
    /// octetString (0x30): raw bytes, uninterpreted.
    OctetString(Vec<u8>),
    /// dateTime (0x31): 11-byte RFC 2579 DateAndTime.
    DateTime(DateTime),
    /// resolution (0x32): 9-byte cross-feed/feed/units.
    Resolution(Resolution),
    /// rangeOfInteger (0x33): two 4-byte signed big-endian bounds.
    RangeOfInteger { lower: i32, upper: i32 },
    /// textWithLanguage (0x35): nested language + text strings.
    TextWithLanguage { language: String, text: String },
    /// nameWithLanguage (0x36): nested language + name strings.
    NameWithLanguage { language: String, name: String },
    /// textWithoutLanguage (0x41): UTF-8 string.
    Text(String),
    /// nameWithoutLanguage (0x42): UTF-8 string.
    Name(String),
    /// keyword (0x44): US-ASCII keyword string.
    Keyword(String),
    /// uri (0x45): US-ASCII URI string.
    Uri(String),
    /// uriScheme (0x46): US-ASCII scheme string.
    UriScheme(String),
    /// charset (0x47): e.g. "utf-8".
    Charset(String),
    /// naturalLanguage (0x48): e.g. "en".
    NaturalLanguage(String),
    /// mimeMediaType (0x49): e.g. "application/pdf".
    MimeMediaType(String),
}

/// The value slot of one named attribute: a scalar, or an ordered
/// multi-valued set (RFC 8011 "1setOf").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    Single(Value),
    Set(Vec<Value>),
}

impl AttributeValue {
    /// Append an additional value, promoting a scalar into a set on the
    /// second occurrence.
    pub fn push(&mut self, value: Value) {
        let current = std::mem::replace(self, AttributeValue::Set(Vec::new()));
        *self = match current {
            AttributeValue::Single(first) => AttributeValue::Set(vec![first, value]),
            AttributeValue::Set(mut values) => {
                values.push(value);
                AttributeValue::Set(values)
            }
        };
    }

    /// Number of values (1 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            AttributeValue::Single(_) => 1,
            AttributeValue::Set(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, AttributeValue::Set(values) if values.is_empty())
    }

    /// Iterate over the values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        match self {
            AttributeValue::Single(value) => std::slice::from_ref(value).iter(),
            AttributeValue::Set(values) => values.iter(),
        }
    }

    /// The first value, if any.
    pub fn first(&self) -> Option<&Value> {
        self.values().next()
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::Single(value)
    }
}

impl From<Vec<Value>> for AttributeValue {
    fn from(values: Vec<Value>) -> Self {
        AttributeValue::Set(values)
    }
}

/// One decoded attribute occurrence.
///
/// An empty `name` is the wire signal for "additional value for the previous
/// attribute" (RFC 8010 §3.1.4), not a real empty-named attribute.  The
/// request codec owns that association; this type is purely one occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
}

/// One attribute group: name → value(s).
///
/// A BTreeMap keeps iteration deterministic within one call, which the
/// protocol does not require for job/printer groups but the tests do.
pub type AttributeGroup = BTreeMap<String, AttributeValue>;

/// A complete IPP request: header, three attribute groups, and (on the
/// decode side) an optional trailing document stream handled separately.
///
/// The document payload is deliberately not a field here: encode never emits
/// it (RFC 8010 leaves it to the transport) and decode streams it straight
/// into a caller-supplied sink without buffering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub version: Version,
    /// Operation code (e.g. 0x0002 Print-Job) — or the status code when the
    /// same layout carries a response.
    pub operation: u16,
    /// Request identifier, echoed back by the peer.
    pub request_id: u32,
    pub operation_attributes: AttributeGroup,
    pub job_attributes: AttributeGroup,
    pub printer_attributes: AttributeGroup,
}

impl Request {
    /// Create a new request with protocol defaults and empty groups.
    pub fn new(operation: u16, request_id: u32) -> Self {
        Self {
            version: Version::V2_0,
            operation,
            request_id,
            operation_attributes: AttributeGroup::new(),
            job_attributes: AttributeGroup::new(),
            printer_attributes: AttributeGroup::new(),
        }
    }
}
