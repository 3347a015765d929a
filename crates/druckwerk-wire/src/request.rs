// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request codec: header, attribute-group state machine, end marker, and the
// trailing document stream.
//
// Message layout (RFC 8010 §3.1, all integers big-endian):
//
// ```text
// version-number:   2 bytes (major, minor — signed)
// operation-id:     2 bytes
// request-id:       4 bytes
// attribute-groups: delimiter tag, then attributes, repeated
// end-of-attributes-tag: 1 byte (0x03)
// document-data:    remainder, opaque and unbounded
// ```
//
// Decode consumes the stream byte-for-byte with no lookahead beyond the
// single tag byte, so a failure strands the stream at an indeterminate
// offset.  There is no mid-stream retry; callers discard the connection.

use std::io::{Read, Write};

use tracing::{debug, warn};

use druckwerk_core::{AttributeGroup, AttributeValue, Request, Result, Version, WireError};

use crate::attribute::{decode_attribute, encode_attribute};
use crate::tag::{DelimiterTag, ValueTag};
use crate::value::read_all;

// ---------------------------------------------------------------------------
// Protocol-mandatory operation attributes (RFC 8011 §4.1.4)
// ---------------------------------------------------------------------------

/// Name of the mandatory leading charset attribute.
pub const ATTR_ATTRIBUTES_CHARSET: &str = "attributes-charset";

/// Name of the mandatory natural-language attribute (second on the wire).
pub const ATTR_ATTRIBUTES_NATURAL_LANGUAGE: &str = "attributes-natural-language";

/// Target-printer URI — some peers require it early in the operation group.
pub const ATTR_PRINTER_URI: &str = "printer-uri";

/// Job identifier — ordered right after printer-uri when present.
pub const ATTR_JOB_ID: &str = "job-id";

/// Charset injected when the caller did not set one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Natural language injected when the caller did not set one.
pub const DEFAULT_NATURAL_LANGUAGE: &str = "en";

/// Operation attributes that must keep this relative order on the wire.
///
/// This is a peer-compatibility requirement, not aesthetics: several IPP
/// implementations reject requests whose charset/language/URI attributes
/// arrive late.  Everything else in the group may follow in any order.
const OPERATION_ATTRIBUTE_ORDER: [&str; 4] = [
    ATTR_ATTRIBUTES_CHARSET,
    ATTR_ATTRIBUTES_NATURAL_LANGUAGE,
    ATTR_PRINTER_URI,
    ATTR_JOB_ID,
];

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a request into its binary wire form.
///
/// The mandatory charset and natural-language attributes are always emitted
/// first in the operation group — with the caller's values when set, the
/// protocol defaults otherwise — followed by printer-uri and job-id when
/// present, then the rest of the group.  Empty job/printer groups are
/// omitted entirely (no delimiter).  The caller's request is never mutated.
///
/// Document data is not written here; a transport that uploads a document
/// appends it after these bytes.
pub fn encode_request(req: &Request) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(256);

    buf.push(req.version.major as u8);
    buf.push(req.version.minor as u8);
    buf.extend_from_slice(&req.operation.to_be_bytes());
    buf.extend_from_slice(&req.request_id.to_be_bytes());

    buf.push(DelimiterTag::OperationAttributes as u8);
    encode_mandatory_pair(req, &mut buf)?;
    encode_operation_attributes(req, &mut buf)?;

    for (delimiter, group) in [
        (DelimiterTag::JobAttributes, &req.job_attributes),
        (DelimiterTag::PrinterAttributes, &req.printer_attributes),
    ] {
        if group.is_empty() {
            continue;
        }
        buf.push(delimiter as u8);
        for (name, value) in group {
            encode_attribute(name, value, &mut buf)?;
        }
    }

    buf.push(DelimiterTag::EndOfAttributes as u8);
    Ok(buf)
}

/// Emit attributes-charset and attributes-natural-language, exactly once
/// each, in that order.
fn encode_mandatory_pair(req: &Request, buf: &mut Vec<u8>) -> Result<()> {
    use druckwerk_core::Value;

    let charset = req
        .operation_attributes
        .get(ATTR_ATTRIBUTES_CHARSET)
        .cloned()
        .unwrap_or_else(|| Value::Charset(DEFAULT_CHARSET.into()).into());
    encode_attribute(ATTR_ATTRIBUTES_CHARSET, &charset, buf)?;

    let language = req
        .operation_attributes
        .get(ATTR_ATTRIBUTES_NATURAL_LANGUAGE)
        .cloned()
        .unwrap_or_else(|| Value::NaturalLanguage(DEFAULT_NATURAL_LANGUAGE.into()).into());
    encode_attribute(ATTR_ATTRIBUTES_NATURAL_LANGUAGE, &language, buf)
}

/// Emit the caller's operation attributes: the fixed-order subset first,
/// then the remainder in map order.  The mandatory pair is skipped — it was
/// already emitted in its fixed leading slot.
fn encode_operation_attributes(req: &Request, buf: &mut Vec<u8>) -> Result<()> {
    for name in [ATTR_PRINTER_URI, ATTR_JOB_ID] {
        if let Some(value) = req.operation_attributes.get(name) {
            encode_attribute(name, value, buf)?;
        }
    }

    for (name, value) in &req.operation_attributes {
        if OPERATION_ATTRIBUTE_ORDER.contains(&name.as_str()) {
            continue;
        }
        encode_attribute(name, value, buf)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Reads and decodes one request from a blocking byte stream.
pub struct RequestDecoder<R> {
    reader: R,
}

impl<R: Read> RequestDecoder<R> {
    /// Create a decoder that reads from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Decode one request.
    ///
    /// If `sink` is given, every byte after the attribute section — the
    /// document payload — is copied into it verbatim.  The copy is
    /// unbounded; the transport terminates it by closing the stream.
    ///
    /// End-of-stream exactly where the next tag byte was expected is
    /// treated as an implicit end marker: peers may close the connection
    /// instead of sending the final 0x03.  End-of-stream anywhere else is
    /// an error.
    pub fn decode(&mut self, sink: Option<&mut dyn Write>) -> Result<Request> {
        let mut header = [0u8; 8];
        read_all(&mut self.reader, &mut header, "request header")?;

        let mut req = Request {
            version: Version {
                major: header[0] as i8,
                minor: header[1] as i8,
            },
            operation: u16::from_be_bytes([header[2], header[3]]),
            request_id: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
            operation_attributes: AttributeGroup::new(),
            job_attributes: AttributeGroup::new(),
            printer_attributes: AttributeGroup::new(),
        };

        debug!(
            version = %req.version,
            operation = %format!("0x{:04X}", req.operation),
            request_id = req.request_id,
            "decoding request attributes"
        );

        let mut active_group: Option<DelimiterTag> = None;
        let mut previous_name: Option<String> = None;

        loop {
            let Some(byte) = self.read_tag_byte()? else {
                // Clean end-of-stream where a tag was expected: the peer
                // omitted the explicit end marker.
                break;
            };

            if byte == DelimiterTag::EndOfAttributes as u8 {
                break;
            }

            let value_tag_byte = if DelimiterTag::is_delimiter(byte) {
                let delimiter = DelimiterTag::try_from(byte)?;
                active_group = Some(delimiter);
                // A continuation value cannot cross a group boundary.
                previous_name = None;
                // The next byte is the first attribute's value tag; the
                // stream must not end inside a freshly opened group.
                let mut next = [0u8; 1];
                read_all(&mut self.reader, &mut next, "value tag after group delimiter")?;
                next[0]
            } else {
                byte
            };

            let tag = ValueTag::try_from(value_tag_byte)?;
            let attr = decode_attribute(&mut self.reader, tag)?;

            let Some(group_tag) = active_group else {
                // Attribute before any group delimiter — malformed; drop it
                // rather than desynchronize, the stream itself is intact.
                warn!(name = %attr.name, "attribute outside of any group -- discarded");
                continue;
            };
            let group = group_mut(&mut req, group_tag);

            if attr.name.is_empty() {
                let slot = previous_name
                    .as_ref()
                    .and_then(|name| group.get_mut(name))
                    .ok_or(WireError::OrphanValue)?;
                slot.push(attr.value);
            } else {
                previous_name = Some(attr.name.clone());
                group.insert(attr.name, AttributeValue::Single(attr.value));
            }
        }

        if let Some(sink) = sink {
            let copied = std::io::copy(&mut self.reader, sink)?;
            debug!(bytes = copied, "copied document payload");
        }

        Ok(req)
    }

    /// Read the next tag byte, mapping clean end-of-stream to `None`.
    fn read_tag_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.reader.read_exact(&mut byte) {
            Ok(()) => Ok(Some(byte[0])),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// The group map a delimiter tag selects.
fn group_mut(req: &mut Request, tag: DelimiterTag) -> &mut AttributeGroup {
    match tag {
        DelimiterTag::OperationAttributes => &mut req.operation_attributes,
        DelimiterTag::JobAttributes => &mut req.job_attributes,
        DelimiterTag::PrinterAttributes => &mut req.printer_attributes,
        // EndOfAttributes exits the decode loop before reaching here.
        DelimiterTag::EndOfAttributes => unreachable!("end tag never selects a group"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use druckwerk_core::Value;
    use std::io::Read as _;

    /// Find the first occurrence of `needle` in `haystack`.
    fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn decode_bytes(bytes: &[u8]) -> Result<Request> {
        RequestDecoder::new(bytes).decode(None)
    }

    #[test]
    fn header_layout_is_exact() {
        let req = Request::new(0x000B, 0x0102_0304);
        let bytes = encode_request(&req).unwrap();

        assert_eq!(&bytes[..8], &[2, 0, 0x00, 0x0B, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(bytes[8], DelimiterTag::OperationAttributes as u8);
        assert_eq!(*bytes.last().unwrap(), DelimiterTag::EndOfAttributes as u8);
    }

    #[test]
    fn roundtrip_preserves_header_and_groups() {
        let mut req = Request::new(0x0002, 77);
        req.operation_attributes.insert(
            ATTR_PRINTER_URI.into(),
            Value::Uri("ipp://printer.local:631/ipp/print".into()).into(),
        );
        req.operation_attributes
            .insert("requesting-user-name".into(), Value::Name("anna".into()).into());
        req.job_attributes
            .insert("copies".into(), Value::Integer(2).into());
        req.printer_attributes.insert(
            "printer-resolution-default".into(),
            Value::Resolution(druckwerk_core::Resolution {
                cross_feed: 600,
                feed: 600,
                units: 3,
            })
            .into(),
        );

        let bytes = encode_request(&req).unwrap();
        let decoded = decode_bytes(&bytes).unwrap();

        assert_eq!(decoded.version, req.version);
        assert_eq!(decoded.operation, req.operation);
        assert_eq!(decoded.request_id, req.request_id);
        assert_eq!(decoded.job_attributes, req.job_attributes);
        assert_eq!(decoded.printer_attributes, req.printer_attributes);

        // The decoded operation group is the caller's attributes plus the
        // codec-injected mandatory pair.
        let mut expected = req.operation_attributes.clone();
        expected.insert(
            ATTR_ATTRIBUTES_CHARSET.into(),
            Value::Charset(DEFAULT_CHARSET.into()).into(),
        );
        expected.insert(
            ATTR_ATTRIBUTES_NATURAL_LANGUAGE.into(),
            Value::NaturalLanguage(DEFAULT_NATURAL_LANGUAGE.into()).into(),
        );
        assert_eq!(decoded.operation_attributes, expected);
    }

    #[test]
    fn multi_value_set_survives_roundtrip_in_order() {
        let mut req = Request::new(0x0002, 1);
        req.job_attributes.insert(
            "finishings".into(),
            AttributeValue::Set(vec![Value::Enum(4), Value::Enum(5), Value::Enum(9)]),
        );

        let bytes = encode_request(&req).unwrap();
        let decoded = decode_bytes(&bytes).unwrap();

        assert_eq!(
            decoded.job_attributes.get("finishings"),
            Some(&AttributeValue::Set(vec![
                Value::Enum(4),
                Value::Enum(5),
                Value::Enum(9)
            ]))
        );
    }

    #[test]
    fn fixed_order_subset_leads_the_operation_group() {
        let mut req = Request::new(0x0008, 9);
        // BTreeMap order would put both of these before printer-uri.
        req.operation_attributes
            .insert("document-format".into(), Value::MimeMediaType("application/pdf".into()).into());
        req.operation_attributes
            .insert("job-name".into(), Value::Name("report".into()).into());
        req.operation_attributes
            .insert(ATTR_JOB_ID.into(), Value::Integer(17).into());
        req.operation_attributes.insert(
            ATTR_PRINTER_URI.into(),
            Value::Uri("ipp://printer.local/ipp/print".into()).into(),
        );

        let bytes = encode_request(&req).unwrap();

        let pos = |name: &str| {
            find_subsequence(&bytes, name.as_bytes())
                .unwrap_or_else(|| panic!("{name} not in output"))
        };

        let charset = pos(ATTR_ATTRIBUTES_CHARSET);
        let language = pos(ATTR_ATTRIBUTES_NATURAL_LANGUAGE);
        let printer_uri = pos(ATTR_PRINTER_URI);
        let job_id = pos(ATTR_JOB_ID);
        let document_format = pos("document-format");
        let job_name = pos("job-name");

        assert!(charset < language);
        assert!(language < printer_uri);
        assert!(printer_uri < job_id);
        assert!(job_id < document_format);
        assert!(job_id < job_name);
    }

    #[test]
    fn caller_supplied_charset_is_emitted_once() {
        let mut req = Request::new(0x0002, 3);
        req.operation_attributes.insert(
            ATTR_ATTRIBUTES_CHARSET.into(),
            Value::Charset("us-ascii".into()).into(),
        );

        let bytes = encode_request(&req).unwrap();

        assert_eq!(
            bytes
                .windows(ATTR_ATTRIBUTES_CHARSET.len())
                .filter(|w| *w == ATTR_ATTRIBUTES_CHARSET.as_bytes())
                .count(),
            1
        );
        assert!(find_subsequence(&bytes, b"us-ascii").is_some());
        assert!(find_subsequence(&bytes, b"utf-8").is_none());

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(
            decoded.operation_attributes.get(ATTR_ATTRIBUTES_CHARSET),
            Some(&Value::Charset("us-ascii".into()).into())
        );
    }

    #[test]
    fn empty_groups_are_omitted() {
        let req = Request::new(0x000B, 5);
        let bytes = encode_request(&req).unwrap();

        // Walk the attribute section at occurrence boundaries (a raw byte
        // scan would false-positive on length fields like 0x00 0x02) and
        // collect every delimiter tag that appears.
        let mut delimiters = Vec::new();
        let mut pos = 8;
        while pos < bytes.len() {
            let tag = bytes[pos];
            if DelimiterTag::is_delimiter(tag) {
                delimiters.push(tag);
                pos += 1;
                continue;
            }
            let name_len = u16::from_be_bytes([bytes[pos + 1], bytes[pos + 2]]) as usize;
            pos += 3 + name_len;
            let value_len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
            pos += 2 + value_len;
        }

        assert_eq!(
            delimiters,
            vec![
                DelimiterTag::OperationAttributes as u8,
                DelimiterTag::EndOfAttributes as u8,
            ]
        );
    }

    #[test]
    fn decode_stops_at_explicit_end_tag() {
        let mut bytes = vec![1, 1, 0x00, 0x0B, 0, 0, 0, 9];
        bytes.push(DelimiterTag::EndOfAttributes as u8);

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.version, Version::V1_1);
        assert!(decoded.operation_attributes.is_empty());
        assert!(decoded.job_attributes.is_empty());
        assert!(decoded.printer_attributes.is_empty());
    }

    #[test]
    fn decode_tolerates_missing_end_tag_at_clean_eof() {
        let req = {
            let mut r = Request::new(0x0002, 11);
            r.operation_attributes
                .insert("job-name".into(), Value::Name("cut-short".into()).into());
            r
        };
        let mut bytes = encode_request(&req).unwrap();
        bytes.pop(); // drop the explicit end-of-attributes tag

        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(
            decoded.operation_attributes.get("job-name"),
            Some(&Value::Name("cut-short".into()).into())
        );
        assert!(decoded.job_attributes.is_empty());
        assert!(decoded.printer_attributes.is_empty());
    }

    #[test]
    fn truncated_header_is_fatal() {
        let err = decode_bytes(&[2, 0, 0x00]).unwrap_err();
        assert!(matches!(err, WireError::Truncated("request header")));
    }

    #[test]
    fn continuation_as_first_attribute_is_structural_error() {
        let mut bytes = vec![2, 0, 0x00, 0x02, 0, 0, 0, 1];
        bytes.push(DelimiterTag::OperationAttributes as u8);
        // keyword occurrence with an empty name: no predecessor exists.
        bytes.push(ValueTag::Keyword as u8);
        bytes.extend_from_slice(&[0x00, 0x00]); // name-length 0
        bytes.extend_from_slice(&[0x00, 0x02]);
        bytes.extend_from_slice(b"a4");
        bytes.push(DelimiterTag::EndOfAttributes as u8);

        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, WireError::OrphanValue));
    }

    #[test]
    fn continuation_does_not_cross_group_boundary() {
        let mut req = Request::new(0x0002, 2);
        req.operation_attributes
            .insert("media".into(), Value::Keyword("iso_a4_210x297mm".into()).into());
        let mut bytes = encode_request(&req).unwrap();

        // Splice a job group whose first occurrence is a continuation.
        bytes.pop();
        bytes.push(DelimiterTag::JobAttributes as u8);
        bytes.push(ValueTag::Keyword as u8);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x02]);
        bytes.extend_from_slice(b"a3");
        bytes.push(DelimiterTag::EndOfAttributes as u8);

        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, WireError::OrphanValue));
    }

    #[test]
    fn attribute_before_any_group_is_discarded() {
        let mut bytes = vec![2, 0, 0x00, 0x02, 0, 0, 0, 1];
        bytes.push(ValueTag::Keyword as u8);
        bytes.extend_from_slice(&[0x00, 0x05]);
        bytes.extend_from_slice(b"stray");
        bytes.extend_from_slice(&[0x00, 0x02]);
        bytes.extend_from_slice(b"a4");
        bytes.push(DelimiterTag::EndOfAttributes as u8);

        let decoded = decode_bytes(&bytes).unwrap();
        assert!(decoded.operation_attributes.is_empty());
        assert!(decoded.job_attributes.is_empty());
    }

    #[test]
    fn unknown_value_tag_is_structural_error() {
        let mut bytes = vec![2, 0, 0x00, 0x02, 0, 0, 0, 1];
        bytes.push(DelimiterTag::OperationAttributes as u8);
        bytes.push(0x13); // no-value tag, outside the implemented set
        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, WireError::UnknownValueTag(0x13)));
    }

    #[test]
    fn unassigned_delimiter_byte_is_structural_error() {
        let mut bytes = vec![2, 0, 0x00, 0x02, 0, 0, 0, 1];
        bytes.push(0x05); // reserved delimiter range, unassigned
        let err = decode_bytes(&bytes).unwrap_err();
        assert!(matches!(err, WireError::UnknownDelimiterTag(0x05)));
    }

    #[test]
    fn document_payload_is_copied_verbatim() {
        let mut req = Request::new(0x0002, 4);
        req.operation_attributes
            .insert("job-name".into(), Value::Name("doc".into()).into());
        let mut bytes = encode_request(&req).unwrap();

        let payload: Vec<u8> = (0u16..2048).map(|n| (n % 251) as u8).collect();
        bytes.extend_from_slice(&payload);

        let mut sink = Vec::new();
        let decoded = RequestDecoder::new(bytes.as_slice())
            .decode(Some(&mut sink))
            .unwrap();

        assert_eq!(decoded.request_id, 4);
        assert_eq!(sink, payload);
    }

    #[test]
    fn document_payload_streams_into_a_file_sink() {
        let req = Request::new(0x0002, 6);
        let mut bytes = encode_request(&req).unwrap();
        bytes.extend_from_slice(b"%PDF-1.4 fake pdf content");

        let mut file = tempfile::tempfile().expect("create temp file");
        RequestDecoder::new(bytes.as_slice())
            .decode(Some(&mut file))
            .unwrap();

        use std::io::Seek as _;
        file.rewind().expect("rewind");
        let mut written = Vec::new();
        file.read_to_end(&mut written).expect("read back");
        assert_eq!(written, b"%PDF-1.4 fake pdf content");
    }

    #[test]
    fn without_sink_payload_is_left_in_the_reader() {
        let req = Request::new(0x0002, 8);
        let mut bytes = encode_request(&req).unwrap();
        bytes.extend_from_slice(b"leftover");

        let mut reader = bytes.as_slice();
        let mut decoder = RequestDecoder::new(&mut reader);
        decoder.decode(None).unwrap();

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"leftover");
    }
}
