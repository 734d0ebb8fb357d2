// The following typedefs distinguish between the different key formats used internally by
// different modules; all are plain byte-string views, so the types carry no data of their own
// beyond documenting intent at call sites.

use integer_encoding::{FixedInt, VarInt};

use crate::types::{SequenceNumber, ValueType};

/// A UserKey is the key supplied by the calling application, without any internal decorations.
pub type UserKey<'a> = &'a [u8];

/// An InternalKey is [key, tag]: the key type stored in, and compared by, on-disk tables.
pub type InternalKey<'a> = &'a [u8];

const TAG_SIZE: usize = 8;

/// The first part of a memtable key: [keylen: varint32, key: [u8], tag: u64]. keylen is the
/// length of key plus 8 (the tag), for LevelDB wire compatibility.
#[derive(Debug, Clone)]
pub struct LookupKey {
    key: Vec<u8>,
    key_offset: usize,
}

impl LookupKey {
    pub fn new(k: &[u8], s: SequenceNumber) -> Self {
        let internal_keylen = k.len() + TAG_SIZE;
        let mut key = Vec::with_capacity(internal_keylen.required_space() + internal_keylen);

        let mut i = 0;
        key.resize(internal_keylen.required_space(), 0);
        i += internal_keylen.encode_var(&mut key[i..]);

        key.extend_from_slice(k);
        i += k.len();

        key.resize(i + TAG_SIZE, 0);
        (s << 8 | ValueType::TypeValue as u64).encode_fixed(&mut key[i..]);

        Self {
            key,
            key_offset: internal_keylen.required_space(),
        }
    }

    /// Returns the bare user key.
    pub fn user_key(&self) -> &[u8] {
        &self.key[self.key_offset..self.key.len() - TAG_SIZE]
    }

    /// Returns [key, tag] — the internal key.
    pub fn internal_key(&self) -> &[u8] {
        &self.key[self.key_offset..]
    }
}

/// Parses a tag into (type, sequence number).
pub fn parse_tag(tag: u64) -> (u8, u64) {
    let seq = tag >> 8;
    let typ = tag & 0xff;
    (typ as u8, seq)
}

/// Splits an InternalKey into (type, sequence, user_key). Panics if `ikey` is shorter than a tag
/// — an InternalKey shorter than 8 bytes cannot have been produced by this engine.
pub fn parse_internal_key(ikey: InternalKey) -> (u8, SequenceNumber, UserKey) {
    assert!(ikey.len() >= TAG_SIZE, "truncated internal key");
    let n = ikey.len() - TAG_SIZE;
    let tag: u64 = FixedInt::decode_fixed(&ikey[n..]).unwrap();
    let (typ, seq) = parse_tag(tag);
    (typ, seq, &ikey[..n])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_key_roundtrip() {
        let lk = LookupKey::new(b"abcde", 123);
        assert_eq!(lk.user_key(), b"abcde");

        let (typ, seq, uk) = parse_internal_key(lk.internal_key());
        assert_eq!(typ, ValueType::TypeValue as u8);
        assert_eq!(seq, 123);
        assert_eq!(uk, b"abcde");
    }

    #[test]
    fn test_lookup_key_encoding() {
        let lk = LookupKey::new(b"xyabxy", 97);
        assert_eq!(
            lk.internal_key(),
            vec![120, 121, 97, 98, 120, 121, 1, 97, 0, 0, 0, 0, 0, 0].as_slice()
        );
    }

    #[test]
    fn test_parse_tag() {
        let (typ, seq) = parse_tag(123 << 8 | 1);
        assert_eq!(typ, 1);
        assert_eq!(seq, 123);
    }
}
