//! For Recursive Length Prefix encoding/decoding of trie nodes.
//!
//! Proof nodes are received from an untrusted source, so decoding only accepts the
//! canonical encoding of a value. If two different byte strings could decode to the
//! same node, a proof could be altered without changing what it claims.
//!
//! Prefix ranges for the first byte of an item:
//! - `0x00..=0x7f` single byte, the byte is the item.
//! - `0x80..=0xb7` string of 0-55 bytes, length is `prefix - 0x80`.
//! - `0xb8..=0xbf` long string, the next `prefix - 0xb7` bytes are the length.
//! - `0xc0..=0xf7` list with 0-55 bytes of payload, length is `prefix - 0xc0`.
//! - `0xf8..=0xff` long list, the next `prefix - 0xf7` bytes are the length.

use alloy_rlp::{Encodable, Header};
use thiserror::Error;

/// Maximum list nesting accepted when decoding.
///
/// Trie nodes nest at most a few levels (branch -> embedded node -> value), this
/// only exists to bound recursion on hostile input.
pub const MAX_DEPTH: usize = 64;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum RlpError {
    /// Covers non-canonical single bytes, long form for short payloads, leading
    /// zero lengths, overflow and truncation.
    #[error("Invalid item header at offset {offset}: {source}")]
    Header {
        offset: usize,
        source: alloy_rlp::Error,
    },
    #[error("List items overrun the list payload ending at offset {0}")]
    ListPayloadMismatch(usize),
    #[error("Input has {0} trailing bytes after the item")]
    TrailingBytes(usize),
    #[error("Nesting exceeds the maximum depth of {MAX_DEPTH}")]
    TooDeep,
}

/// A decoded value: either a byte string or a list of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Returns the bytes if this is a byte string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(bytes) => Some(bytes),
            RlpItem::List(_) => None,
        }
    }
    /// Returns the items if this is a list.
    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::Bytes(_) => None,
            RlpItem::List(items) => Some(items),
        }
    }
    /// True for the zero-length byte string (`0x80`).
    pub fn is_empty_string(&self) -> bool {
        matches!(self, RlpItem::Bytes(bytes) if bytes.is_empty())
    }
    /// Returns the canonical encoding of this value.
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }
}

/// Decodes one item that must span the whole input.
pub fn decode(bytes: &[u8]) -> Result<RlpItem, RlpError> {
    let mut buf = bytes;
    let item = decode_item(&mut buf, 0, 0)?;
    if !buf.is_empty() {
        return Err(RlpError::TrailingBytes(buf.len()));
    }
    Ok(item)
}

/// Encodes a value. Inverse of [decode].
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = vec![];
    encode_into(item, &mut out);
    out
}

/// Decodes the item at the start of `buf` and advances past it.
///
/// `offset` is the position of `buf` in the whole input, for error reporting.
fn decode_item(buf: &mut &[u8], offset: usize, depth: usize) -> Result<RlpItem, RlpError> {
    if depth > MAX_DEPTH {
        return Err(RlpError::TooDeep);
    }
    let before = buf.len();
    let header = Header::decode(buf).map_err(|source| RlpError::Header { offset, source })?;
    let payload_offset = offset + (before - buf.len());
    if header.payload_length > buf.len() {
        return Err(RlpError::Header {
            offset,
            source: alloy_rlp::Error::InputTooShort,
        });
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;

    if !header.list {
        return Ok(RlpItem::Bytes(payload.to_vec()));
    }

    let payload_end = payload_offset + payload.len();
    let mut items = vec![];
    let mut list_buf = payload;
    while !list_buf.is_empty() {
        let item_offset = payload_end - list_buf.len();
        let item = decode_item(&mut list_buf, item_offset, depth + 1).map_err(|e| match e {
            // An item claiming to extend past the list payload.
            RlpError::Header {
                source: alloy_rlp::Error::InputTooShort,
                ..
            } => RlpError::ListPayloadMismatch(payload_end),
            other => other,
        })?;
        items.push(item);
    }
    Ok(RlpItem::List(items))
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(bytes) => bytes.as_slice().encode(out),
        RlpItem::List(items) => {
            let mut payload = vec![];
            for item in items {
                encode_into(item, &mut payload);
            }
            Header {
                list: true,
                payload_length: payload.len(),
            }
            .encode(out);
            out.extend(payload);
        }
    }
}
