//! Digest used to reference trie nodes.
//!
//! A node that is referenced by hash is identified by the digest of its encoding.
//! Ethereum tries use keccak256, other trie variants can supply their own hasher.
use ethers::utils::keccak256;

/// Length in bytes of a node hash.
pub const DIGEST_LENGTH: usize = 32;

/// A 256 bit node hash.
pub type Digest = [u8; DIGEST_LENGTH];

/// Root of a trie with no keys: keccak(rlp("")).
pub const EMPTY_TRIE_ROOT: Digest = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8,
    0x6e, 0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63,
    0xb4, 0x21,
];

/// Hash of empty bytes: keccak(""). Code hash of an account without code.
pub const KECCAK_EMPTY: Digest = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03,
    0xc0, 0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85,
    0xa4, 0x70,
];

/// Computes the digest that a parent node uses to refer to a child node.
pub trait NodeHasher {
    fn hash(&self, bytes: &[u8]) -> Digest;
}

/// keccak256, as used by Ethereum state, storage, transaction and receipt tries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keccak;

impl NodeHasher for Keccak {
    fn hash(&self, bytes: &[u8]) -> Digest {
        keccak256(bytes)
    }
}
