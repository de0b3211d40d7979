//! Verifies Merkle Patricia Trie proofs against a trusted root.
//!
//! The core ([proof::verify_proof]) is independent of what the trie stores. The
//! [eip1186] module applies it to Ethereum accounts and storage.
pub mod eip1186;
pub mod hash;
pub mod node;
pub mod path;
pub mod proof;
pub mod rlp;
pub mod utils;
