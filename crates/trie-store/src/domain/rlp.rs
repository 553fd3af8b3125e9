//! # Recursive Length Prefix (RLP) Codec
//!
//! A self-delimiting, order-preserving encoding for arbitrary nested
//! sequences of byte strings, non-negative integers, and lists.
//!
//! The prefix byte ranges below intentionally diverge from the
//! widely-known public RLP specification (which starts bytestrings at
//! `0x80` and lists at `0xc0`). They are reproduced byte-for-byte from
//! this system's reference implementation because they are load-bearing
//! for hash equality: two implementations of this trie only agree on
//! root hashes if they agree on these exact boundaries.
//!
//! | Kind | Short form | Long form (len/count >= 56) |
//! |---|---|---|
//! | integer | literal (`n < 24`) or `23 + len(to_bytes(n))` | `55 + len(lb)` |
//! | bytestring | literal (`len == 1 && byte < 24`) or `64 + len` | `119 + len(lb)` |
//! | list | `128 + child_count` | `183 + len(lb)` |
//!
//! List framing is by **child count**, not by the byte length of the
//! encoded children - a deliberate simplification relative to public RLP,
//! which frames lists by total payload length.

use super::byte_codec::{from_bytes, to_bytes};
use super::errors::TrieError;

/// A decoded or to-be-encoded RLP value.
///
/// Decoding always yields `Integer` for any prefix in the integer family
/// (`0..64`) and `Bytes`/`List` otherwise - integers are not a distinct
/// node in the abstract `Bytes | List` grammar, they are a convenience
/// tag the decoder attaches to a leaf that used the integer wire form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    /// A non-negative integer, encoded via the integer prefix family.
    Integer(u64),
    /// An opaque byte string, encoded via the bytestring prefix family.
    Bytes(Vec<u8>),
    /// A sequence of RLP items, framed by child count.
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// Build an `Integer` item from a signed value, surfacing
    /// `EncodeNegative` for negative input per the error design in §7.
    pub fn from_signed(n: i128) -> Result<Self, TrieError> {
        if n < 0 {
            return Err(TrieError::EncodeNegative);
        }
        Ok(RlpItem::Integer(n as u64))
    }

    /// Borrow the inner bytes if this item is `Bytes`, else `None`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RlpItem::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the inner items if this item is `List`, else `None`.
    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            RlpItem::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Encode a length/count prefix: literal short form when `< 56`, else a
/// `(marker_base + len(lb), lb)` long-form header.
fn push_length_prefix(out: &mut Vec<u8>, len: usize, short_base: u8, long_base: u8) {
    if len < 56 {
        out.push(short_base + len as u8);
    } else {
        let lb = to_bytes(len as u64);
        out.push(long_base + lb.len() as u8);
        out.extend_from_slice(&lb);
    }
}

/// RLP-encode a single item (§4.2.1).
pub fn encode(item: &RlpItem) -> Vec<u8> {
    match item {
        RlpItem::Integer(n) => encode_integer(*n),
        RlpItem::Bytes(data) => encode_bytes(data),
        RlpItem::List(items) => encode_list(items),
    }
}

fn encode_integer(n: u64) -> Vec<u8> {
    if n < 24 {
        return vec![n as u8];
    }
    let tb = to_bytes(n);
    let mut out = Vec::with_capacity(tb.len() + 2);
    // For u64 the short integer range (prefix 24..=55) always suffices:
    // to_bytes(u64::MAX) is at most 8 bytes, giving prefix 23 + 8 = 31.
    push_length_prefix(&mut out, tb.len(), 23, 55);
    out.extend_from_slice(&tb);
    out
}

fn encode_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 24 {
        return vec![data[0]];
    }
    let mut out = Vec::with_capacity(data.len() + 9);
    push_length_prefix(&mut out, data.len(), 64, 119);
    out.extend_from_slice(data);
    out
}

fn encode_list(items: &[RlpItem]) -> Vec<u8> {
    let encoded_children: Vec<Vec<u8>> = items.iter().map(encode).collect();
    let total_len: usize = encoded_children.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total_len + 9);
    push_length_prefix(&mut out, items.len(), 128, 183);
    for child in encoded_children {
        out.extend(child);
    }
    out
}

/// Decode a single top-level RLP item, failing with `ExtraBytes` if any
/// input remains unconsumed.
pub fn decode(buffer: &[u8]) -> Result<RlpItem, TrieError> {
    let (item, consumed) = decode_item(buffer, 0)?;
    if consumed != buffer.len() {
        return Err(TrieError::ExtraBytes(buffer.len() - consumed));
    }
    Ok(item)
}

/// Take `len` bytes starting at `pos`, failing with `Truncated` if the
/// buffer is too short.
fn take(buffer: &[u8], pos: usize, len: usize) -> Result<&[u8], TrieError> {
    let end = pos.checked_add(len).ok_or(TrieError::Truncated {
        offset: pos,
        expected: len,
    })?;
    buffer.get(pos..end).ok_or(TrieError::Truncated {
        offset: pos,
        expected: len.saturating_sub(buffer.len().saturating_sub(pos)),
    })
}

/// Decode one RLP item starting at `pos`; returns the item and the cursor
/// position just past it (§4.2.2).
fn decode_item(buffer: &[u8], pos: usize) -> Result<(RlpItem, usize), TrieError> {
    let f = *buffer.get(pos).ok_or(TrieError::Truncated {
        offset: pos,
        expected: 1,
    })?;

    if f < 24 {
        return Ok((RlpItem::Integer(f as u64), pos + 1));
    }
    if f < 56 {
        let len = (f - 23) as usize;
        let payload = take(buffer, pos + 1, len)?;
        return Ok((RlpItem::Integer(from_bytes(payload)), pos + 1 + len));
    }
    if f < 64 {
        let header_len = (f - 55) as usize;
        let header = take(buffer, pos + 1, header_len)?;
        let payload_len = from_bytes(header) as usize;
        let payload_start = pos + 1 + header_len;
        let payload = take(buffer, payload_start, payload_len)?;
        return Ok((RlpItem::Integer(from_bytes(payload)), payload_start + payload_len));
    }
    if f < 120 {
        let len = (f - 64) as usize;
        let payload = take(buffer, pos + 1, len)?;
        return Ok((RlpItem::Bytes(payload.to_vec()), pos + 1 + len));
    }
    if f < 128 {
        let header_len = (f - 119) as usize;
        let header = take(buffer, pos + 1, header_len)?;
        let payload_len = from_bytes(header) as usize;
        let payload_start = pos + 1 + header_len;
        let payload = take(buffer, payload_start, payload_len)?;
        return Ok((RlpItem::Bytes(payload.to_vec()), payload_start + payload_len));
    }
    if f < 184 {
        let count = (f - 128) as usize;
        return decode_list_children(buffer, pos + 1, count);
    }
    if f < 192 {
        let header_len = (f - 183) as usize;
        let header = take(buffer, pos + 1, header_len)?;
        let count = from_bytes(header) as usize;
        return decode_list_children(buffer, pos + 1 + header_len, count);
    }
    Err(TrieError::UnsupportedPrefix(f))
}

fn decode_list_children(
    buffer: &[u8],
    mut pos: usize,
    count: usize,
) -> Result<(RlpItem, usize), TrieError> {
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let (item, next) = decode_item(buffer, pos)?;
        items.push(item);
        pos = next;
    }
    Ok((RlpItem::List(items), pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_integer_examples() {
        assert_eq!(encode(&RlpItem::Integer(0)), vec![0x00]);
        assert_eq!(encode(&RlpItem::Integer(23)), vec![0x17]);
        assert_eq!(encode(&RlpItem::Integer(24)), vec![0x18, 0x18]);
        assert_eq!(encode(&RlpItem::Integer(1024)), vec![0x19, 0x04, 0x00]);
    }

    #[test]
    fn encode_bytes_examples() {
        assert_eq!(encode(&RlpItem::Bytes(vec![])), vec![0x40]);
        assert_eq!(
            encode(&RlpItem::Bytes(b"dog".to_vec())),
            b"\x43dog".to_vec()
        );
    }

    #[test]
    fn encode_list_examples() {
        assert_eq!(encode(&RlpItem::List(vec![])), vec![0x80]);
        let cat_dog = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::Bytes(b"dog".to_vec()),
        ]);
        assert_eq!(encode(&cat_dog), b"\x82\x43cat\x43dog".to_vec());
    }

    #[test]
    fn long_bytestring_uses_long_form_prefix() {
        let data = vec![0x42; 56];
        let encoded = encode(&RlpItem::Bytes(data.clone()));
        assert_eq!(encoded[0], 119 + 1); // len(to_bytes(56)) == 1
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], &data[..]);
    }

    #[test]
    fn long_list_uses_child_count_not_byte_length() {
        let items: Vec<RlpItem> = (0..60).map(RlpItem::Integer).collect();
        let encoded = encode(&RlpItem::List(items.clone()));
        assert_eq!(encoded[0], 183 + 1); // len(to_bytes(60)) == 1
        assert_eq!(encoded[1], 60);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, RlpItem::List(items));
    }

    #[test]
    fn decode_rejects_byte_ge_192() {
        assert!(matches!(
            decode(&[200]),
            Err(TrieError::UnsupportedPrefix(200))
        ));
    }

    #[test]
    fn decode_rejects_truncated_buffer() {
        assert!(matches!(decode(&[0x44]), Err(TrieError::Truncated { .. })));
    }

    #[test]
    fn decode_rejects_extra_bytes() {
        let mut buf = encode(&RlpItem::Bytes(b"dog".to_vec()));
        buf.push(0xff);
        assert!(matches!(decode(&buf), Err(TrieError::ExtraBytes(1))));
    }

    #[test]
    fn round_trip_nested_structure() {
        let value = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::List(vec![RlpItem::Integer(0), RlpItem::Integer(1024)]),
            RlpItem::Bytes(vec![]),
        ]);
        let encoded = encode(&value);
        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn small_single_byte_bytestring_collides_with_integer_wire_form() {
        // A single-byte bytestring with value < 24 is byte-identical to
        // that integer's encoding; decode always resolves it to Integer.
        let as_bytes = encode(&RlpItem::Bytes(vec![5]));
        let as_integer = encode(&RlpItem::Integer(5));
        assert_eq!(as_bytes, as_integer);
        assert_eq!(decode(&as_bytes).unwrap(), RlpItem::Integer(5));
    }

    #[test]
    fn encode_negative_is_rejected_at_the_boundary() {
        assert!(matches!(
            RlpItem::from_signed(-1),
            Err(TrieError::EncodeNegative)
        ));
        assert_eq!(RlpItem::from_signed(5).unwrap(), RlpItem::Integer(5));
    }

    proptest::proptest! {
        #[test]
        fn prop_round_trip_arbitrary_tree(value in arb_rlp_item(4)) {
            let encoded = encode(&value);
            let decoded = decode(&encoded).unwrap();
            // Integers are the only part of the domain that can "shift
            // shape" on encode/decode (a single in-range byte literal
            // collides with the integer wire form); comparing via
            // re-encoding sidesteps that and checks the buffer round trip.
            prop_assert_eq!(encode(&decoded), encoded);
        }

        #[test]
        fn prop_decode_never_panics(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let _ = decode(&bytes);
        }
    }

    fn arb_rlp_item(depth: u32) -> impl proptest::strategy::Strategy<Value = RlpItem> {
        use proptest::prelude::*;
        let leaf = prop_oneof![
            any::<u64>().prop_map(RlpItem::Integer),
            proptest::collection::vec(any::<u8>(), 0..80).prop_map(RlpItem::Bytes),
        ];
        if depth == 0 {
            leaf.boxed()
        } else {
            leaf.prop_recursive(depth, 64, 8, |inner| {
                proptest::collection::vec(inner, 0..8).prop_map(RlpItem::List)
            })
            .boxed()
        }
    }
}
