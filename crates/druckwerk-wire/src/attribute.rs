// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attribute codec: one named attribute, scalar or multi-valued.
//
// The wire convention for a 1setOf (RFC 8010 §3.1.4): the first occurrence
// carries the name, every additional value repeats the tag with a
// zero-length name field.  Encoding here owns that rule; decoding stays at
// the single-occurrence level and leaves "which attribute does an empty
// name belong to" to the request codec's state machine.

use std::io::Read;

use druckwerk_core::{Attribute, AttributeValue, Result, WireError};

use crate::tag::ValueTag;
use crate::value::{decode_value, encode_value, tag_for};

/// Encode one attribute into `buf`.
///
/// A `Set` is emitted under the wire tag of its first element; every element
/// must share that tag, since the format repeats the tag byte per value but
/// peers treat the set as one attribute of one type.  Not transactional:
/// `buf` may hold a partial attribute after an error, so callers discard the
/// whole buffer on failure.
pub fn encode_attribute(name: &str, value: &AttributeValue, buf: &mut Vec<u8>) -> Result<()> {
    let Some(first) = value.first() else {
        return Err(WireError::EmptyValueSet(name.to_owned()));
    };
    let tag = tag_for(first);

    for (i, element) in value.values().enumerate() {
        if tag_for(element) != tag {
            return Err(WireError::MixedValueSet(name.to_owned()));
        }
        encode_value(tag, if i == 0 { name } else { "" }, element, buf)?;
    }
    Ok(())
}

/// Decode one attribute occurrence whose value tag has already been read.
///
/// The returned name may be empty — the continuation signal, resolved by the
/// caller.  No group bookkeeping happens here.
pub fn decode_attribute<R: Read>(reader: &mut R, tag: ValueTag) -> Result<Attribute> {
    let (name, value) = decode_value(tag, reader)?;
    Ok(Attribute { name, value })
}
