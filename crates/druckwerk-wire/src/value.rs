// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Value codec: one tagged (name, value) occurrence to and from bytes.
//
// Per-attribute wire layout (RFC 8010 §3.1.4, all integers big-endian):
//
// ```text
//   value-tag:     1 byte
//   name-length:   2 bytes
//   name:          name-length bytes
//   value-length:  2 bytes
//   value:         value-length bytes
// ```
//
// The 2-byte length prefixes (not delimiters) are what keep the format
// unambiguous around arbitrary binary payloads; peers validate the 1/2/2
// byte widths strictly, so they are never varied here.

use std::io::Read;

use druckwerk_core::{DateTime, Resolution, Result, Value, WireError};

use crate::tag::ValueTag;

/// Maximum byte length representable by the 2-byte length fields.
pub const MAX_FIELD_LEN: usize = u16::MAX as usize;

// ---------------------------------------------------------------------------
// Kind -> tag mapping
// ---------------------------------------------------------------------------

/// The wire tag for a value.
///
/// Total by construction: every variant of the closed `Value` set has
/// exactly one tag, so "kind cannot be mapped" is impossible here.  The
/// residual encode failure lives in the attribute layer, where a
/// multi-valued set may mix kinds.
pub fn tag_for(value: &Value) -> ValueTag {
    match value {
        Value::Integer(_) => ValueTag::Integer,
        Value::Boolean(_) => ValueTag::Boolean,
        Value::Enum(_) => ValueTag::Enum,
        Value::OctetString(_) => ValueTag::OctetString,
        Value::DateTime(_) => ValueTag::DateTime,
        Value::Resolution(_) => ValueTag::Resolution,
        Value::RangeOfInteger { .. } => ValueTag::RangeOfInteger,
        Value::TextWithLanguage { .. } => ValueTag::TextWithLanguage,
        Value::NameWithLanguage { .. } => ValueTag::NameWithLanguage,
        Value::Text(_) => ValueTag::TextWithoutLanguage,
        Value::Name(_) => ValueTag::NameWithoutLanguage,
        Value::Keyword(_) => ValueTag::Keyword,
        Value::Uri(_) => ValueTag::Uri,
        Value::UriScheme(_) => ValueTag::UriScheme,
        Value::Charset(_) => ValueTag::Charset,
        Value::NaturalLanguage(_) => ValueTag::NaturalLanguage,
        Value::MimeMediaType(_) => ValueTag::MimeMediaType,
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode one occurrence under the given wire tag.
///
/// The tag is passed in rather than re-derived so that additional values of
/// a multi-valued attribute are emitted under the set's declared tag.
/// An empty `name` encodes the zero-length name field that means
/// "additional value for the previous attribute".
pub fn encode_value(tag: ValueTag, name: &str, value: &Value, buf: &mut Vec<u8>) -> Result<()> {
    let name_bytes = name.as_bytes();
    if name_bytes.len() > MAX_FIELD_LEN {
        return Err(WireError::FieldTooLong {
            field: "attribute name",
            len: name_bytes.len(),
        });
    }

    let payload = encode_payload(value);
    if payload.len() > MAX_FIELD_LEN {
        return Err(WireError::FieldTooLong {
            field: "attribute value",
            len: payload.len(),
        });
    }

    buf.push(tag as u8);
    buf.extend_from_slice(&(name_bytes.len() as u16).to_be_bytes());
    buf.extend_from_slice(name_bytes);
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(())
}

/// Serialize a value payload according to its kind.
fn encode_payload(value: &Value) -> Vec<u8> {
    match value {
        Value::Integer(n) | Value::Enum(n) => n.to_be_bytes().to_vec(),
        Value::Boolean(b) => vec![if *b { 0x01 } else { 0x00 }],
        Value::OctetString(bytes) => bytes.clone(),
        Value::DateTime(dt) => {
            let mut out = Vec::with_capacity(11);
            out.extend_from_slice(&dt.year.to_be_bytes());
            out.extend_from_slice(&[
                dt.month,
                dt.day,
                dt.hour,
                dt.minutes,
                dt.seconds,
                dt.deci_seconds,
                dt.utc_direction,
                dt.utc_hours,
                dt.utc_minutes,
            ]);
            out
        }
        Value::Resolution(res) => {
            let mut out = Vec::with_capacity(9);
            out.extend_from_slice(&res.cross_feed.to_be_bytes());
            out.extend_from_slice(&res.feed.to_be_bytes());
            out.push(res.units as u8);
            out
        }
        Value::RangeOfInteger { lower, upper } => {
            let mut out = Vec::with_capacity(8);
            out.extend_from_slice(&lower.to_be_bytes());
            out.extend_from_slice(&upper.to_be_bytes());
            out
        }
        Value::TextWithLanguage { language, text }
        | Value::NameWithLanguage {
            language,
            name: text,
        } => {
            // Nested layout: lang-length(2) lang string-length(2) string.
            let mut out = Vec::with_capacity(4 + language.len() + text.len());
            out.extend_from_slice(&(language.len() as u16).to_be_bytes());
            out.extend_from_slice(language.as_bytes());
            out.extend_from_slice(&(text.len() as u16).to_be_bytes());
            out.extend_from_slice(text.as_bytes());
            out
        }
        Value::Text(s)
        | Value::Name(s)
        | Value::Keyword(s)
        | Value::Uri(s)
        | Value::UriScheme(s)
        | Value::Charset(s)
        | Value::NaturalLanguage(s)
        | Value::MimeMediaType(s) => s.as_bytes().to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode one occurrence whose tag byte has already been consumed.
///
/// Reads name-length, name, value-length, and value from the stream, then
/// reconstructs the typed value.  Short reads surface as
/// [`WireError::Truncated`] with the field that was cut off.
pub fn decode_value<R: Read>(tag: ValueTag, reader: &mut R) -> Result<(String, Value)> {
    let name_len = read_u16(reader, "name-length field")? as usize;
    let name_bytes = read_vec(reader, name_len, "attribute name")?;
    let name = String::from_utf8_lossy(&name_bytes).into_owned();

    let value_len = read_u16(reader, "value-length field")? as usize;
    let payload = read_vec(reader, value_len, "attribute value")?;

    let value = decode_payload(tag, &payload)?;
    Ok((name, value))
}

/// Reconstruct a typed value from its payload bytes.
///
/// Fixed-width kinds check the exact payload size; a mismatch means the
/// stream is already desynchronized, so it is a structural error rather
/// than a best-effort read.
fn decode_payload(tag: ValueTag, payload: &[u8]) -> Result<Value> {
    let wrong_len = || WireError::ValueLength {
        tag: tag as u8,
        len: payload.len(),
    };

    match tag {
        ValueTag::Integer => Ok(Value::Integer(be_i32(payload).ok_or_else(wrong_len)?)),
        ValueTag::Enum => Ok(Value::Enum(be_i32(payload).ok_or_else(wrong_len)?)),
        ValueTag::Boolean => match payload {
            [0x00] => Ok(Value::Boolean(false)),
            [0x01] => Ok(Value::Boolean(true)),
            _ => Err(wrong_len()),
        },
        ValueTag::OctetString => Ok(Value::OctetString(payload.to_vec())),
        ValueTag::DateTime => {
            if payload.len() != 11 {
                return Err(wrong_len());
            }
            Ok(Value::DateTime(DateTime {
                year: u16::from_be_bytes([payload[0], payload[1]]),
                month: payload[2],
                day: payload[3],
                hour: payload[4],
                minutes: payload[5],
                seconds: payload[6],
                deci_seconds: payload[7],
                utc_direction: payload[8],
                utc_hours: payload[9],
                utc_minutes: payload[10],
            }))
        }
        ValueTag::Resolution => {
            if payload.len() != 9 {
                return Err(wrong_len());
            }
            Ok(Value::Resolution(Resolution {
                cross_feed: i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
                feed: i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]),
                units: payload[8] as i8,
            }))
        }
        ValueTag::RangeOfInteger => {
            if payload.len() != 8 {
                return Err(wrong_len());
            }
            Ok(Value::RangeOfInteger {
                lower: i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
                upper: i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]),
            })
        }
        ValueTag::TextWithLanguage | ValueTag::NameWithLanguage => {
            let (language, rest) = decode_nested_string(payload, tag)?;
            let (string, rest) = decode_nested_string(rest, tag)?;
            if !rest.is_empty() {
                return Err(wrong_len());
            }
            Ok(match tag {
                ValueTag::TextWithLanguage => Value::TextWithLanguage {
                    language,
                    text: string,
                },
                _ => Value::NameWithLanguage {
                    language,
                    name: string,
                },
            })
        }
        ValueTag::TextWithoutLanguage => Ok(Value::Text(lossy(payload))),
        ValueTag::NameWithoutLanguage => Ok(Value::Name(lossy(payload))),
        ValueTag::Keyword => Ok(Value::Keyword(lossy(payload))),
        ValueTag::Uri => Ok(Value::Uri(lossy(payload))),
        ValueTag::UriScheme => Ok(Value::UriScheme(lossy(payload))),
        ValueTag::Charset => Ok(Value::Charset(lossy(payload))),
        ValueTag::NaturalLanguage => Ok(Value::NaturalLanguage(lossy(payload))),
        ValueTag::MimeMediaType => Ok(Value::MimeMediaType(lossy(payload))),
    }
}

/// One `length(2) bytes` string inside a withLanguage payload.
fn decode_nested_string(payload: &[u8], tag: ValueTag) -> Result<(String, &[u8])> {
    let wrong_len = || WireError::ValueLength {
        tag: tag as u8,
        len: payload.len(),
    };
    if payload.len() < 2 {
        return Err(wrong_len());
    }
    let len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    if payload.len() < 2 + len {
        return Err(wrong_len());
    }
    Ok((lossy(&payload[2..2 + len]), &payload[2 + len..]))
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn be_i32(payload: &[u8]) -> Option<i32> {
    let bytes: [u8; 4] = payload.try_into().ok()?;
    Some(i32::from_be_bytes(bytes))
}

// ---------------------------------------------------------------------------
// Stream read helpers
// ---------------------------------------------------------------------------

/// Read exactly two big-endian bytes, naming the field on a short read.
pub(crate) fn read_u16<R: Read>(reader: &mut R, field: &'static str) -> Result<u16> {
    let mut bytes = [0u8; 2];
    read_all(reader, &mut bytes, field)?;
    Ok(u16::from_be_bytes(bytes))
}

fn read_vec<R: Read>(reader: &mut R, len: usize, field: &'static str) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    read_all(reader, &mut bytes, field)?;
    Ok(bytes)
}

pub(crate) fn read_all<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    field: &'static str,
) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            WireError::Truncated(field)
        } else {
            WireError::Io(e)
        }
    })
}
