//! Canonical CBOR encoding for audit event content.
//!
//! RFC 8949 Core Deterministic Encoding, reduced to the shapes the audit
//! trail needs: integer-keyed maps, smallest-int encoding, definite
//! lengths, no floats. Canonical bytes are what gets content-hashed, so
//! the same event must produce identical bytes on every platform.

use crate::audit::AuditEvent;

/// Content field keys (integer keys for compact encoding).
///
/// Keys 0-23 encode as single bytes in CBOR. The chain hash is not part
/// of the content: it is derived from these bytes.
mod keys {
    pub const ID: u64 = 0;
    pub const ACTOR: u64 = 1;
    pub const ACTION: u64 = 2;
    pub const SUBJECT: u64 = 3;
    pub const TIMESTAMP: u64 = 4;
}

/// Encode the content fields of an audit event to canonical CBOR bytes.
pub fn audit_content_bytes(event: &AuditEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);

    // Map with five entries, keys already in sorted order 0..=4.
    encode_uint(&mut buf, 5, 5);

    encode_uint(&mut buf, 0, keys::ID);
    encode_bytes(&mut buf, event.id.as_bytes());

    encode_uint(&mut buf, 0, keys::ACTOR);
    encode_text(&mut buf, event.actor.as_str());

    encode_uint(&mut buf, 0, keys::ACTION);
    encode_text(&mut buf, event.action.as_str());

    encode_uint(&mut buf, 0, keys::SUBJECT);
    match &event.subject_id {
        Some(subject) => encode_text(&mut buf, subject.as_str()),
        None => buf.push(0xf6), // null
    }

    encode_uint(&mut buf, 0, keys::TIMESTAMP);
    encode_int(&mut buf, event.timestamp_ms);

    buf
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type, smallest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}
