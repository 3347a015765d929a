// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tag registry: the single-byte wire codes that structure an IPP message.
//
// Two disjoint families (RFC 8010 §3.5): delimiter tags (0x00..=0x0F) switch
// the active attribute group or end the attribute section; value tags
// (0x10..) type the attribute occurrence that follows.  The version bytes at
// the head of a message are not tags.

use druckwerk_core::{Result, WireError};

/// Delimiter tags (RFC 8010 §3.5.1).
///
/// Each one changes which group subsequent attributes belong to, until the
/// next delimiter or the end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DelimiterTag {
    /// operation-attributes-tag.
    OperationAttributes = 0x01,
    /// job-attributes-tag.
    JobAttributes = 0x02,
    /// end-of-attributes-tag — terminates the attribute section.
    EndOfAttributes = 0x03,
    /// printer-attributes-tag.
    PrinterAttributes = 0x04,
}

impl DelimiterTag {
    /// Whether a byte falls in the reserved delimiter range.
    ///
    /// RFC 8010 reserves 0x00..=0x0F for delimiters; only four codes are
    /// assigned, but anything in the range is definitely not a value tag.
    pub fn is_delimiter(byte: u8) -> bool {
        byte <= 0x0F
    }
}

impl TryFrom<u8> for DelimiterTag {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(Self::OperationAttributes),
            0x02 => Ok(Self::JobAttributes),
            0x03 => Ok(Self::EndOfAttributes),
            0x04 => Ok(Self::PrinterAttributes),
            other => Err(WireError::UnknownDelimiterTag(other)),
        }
    }
}

/// Value tags (RFC 8010 §3.5.2).
///
/// One code per kind in the closed value set.  Anything else on the wire is
/// a structural error: a single misread tag desynchronizes the rest of the
/// stream, so unknown codes are rejected rather than skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueTag {
    /// integer: 4 bytes, signed big-endian.
    Integer = 0x21,
    /// boolean: 1 byte, 0x00 = false, 0x01 = true.
    Boolean = 0x22,
    /// enum: same encoding as integer.
    Enum = 0x23,
    /// octetString with an unspecified format.
    OctetString = 0x30,
    /// dateTime: 11-byte RFC 2579 DateAndTime.
    DateTime = 0x31,
    /// resolution: 9 bytes (cross-feed, feed, units).
    Resolution = 0x32,
    /// rangeOfInteger: 8 bytes (lower, upper).
    RangeOfInteger = 0x33,
    /// textWithLanguage: nested language + text.
    TextWithLanguage = 0x35,
    /// nameWithLanguage: nested language + name.
    NameWithLanguage = 0x36,
    /// textWithoutLanguage (UTF-8 string).
    TextWithoutLanguage = 0x41,
    /// nameWithoutLanguage (UTF-8 string).
    NameWithoutLanguage = 0x42,
    /// keyword (US-ASCII, e.g. "one-sided").
    Keyword = 0x44,
    /// uri (US-ASCII).
    Uri = 0x45,
    /// uriScheme (US-ASCII).
    UriScheme = 0x46,
    /// charset (US-ASCII, e.g. "utf-8").
    Charset = 0x47,
    /// naturalLanguage (US-ASCII, e.g. "en").
    NaturalLanguage = 0x48,
    /// mimeMediaType (US-ASCII, e.g. "application/pdf").
    MimeMediaType = 0x49,
}

impl TryFrom<u8> for ValueTag {
    type Error = WireError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x21 => Ok(Self::Integer),
            0x22 => Ok(Self::Boolean),
            0x23 => Ok(Self::Enum),
            0x30 => Ok(Self::OctetString),
            0x31 => Ok(Self::DateTime),
            0x32 => Ok(Self::Resolution),
            0x33 => Ok(Self::RangeOfInteger),
            0x35 => Ok(Self::TextWithLanguage),
            0x36 => Ok(Self::NameWithLanguage),
            0x41 => Ok(Self::TextWithoutLanguage),
            0x42 => Ok(Self::NameWithoutLanguage),
            0x44 => Ok(Self::Keyword),
            0x45 => Ok(Self::Uri),
            0x46 => Ok(Self::UriScheme),
            0x47 => Ok(Self::Charset),
            0x48 => Ok(Self::NaturalLanguage),
            0x49 => Ok(Self::MimeMediaType),
            other => Err(WireError::UnknownValueTag(other)),
        }
    }
}
