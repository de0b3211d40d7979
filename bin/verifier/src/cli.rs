//! For Command Line Interface for mpt_verify

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Verify a Merkle Patricia Trie proof against a trusted root.
///
/// Exits with a non-zero status if the proof does not support the claim.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Verify one key against one proof.
    Single {
        /// Trusted root hash (0x-prefixed hex, 32 bytes).
        #[clap(short, long)]
        root: String,
        /// Key to prove (0x-prefixed hex).
        #[clap(short, long)]
        key: String,
        /// How the key maps to a trie path.
        #[clap(long, value_enum, default_value_t = KeyKind::Raw)]
        key_kind: KeyKind,
        /// Claimed value (0x-prefixed hex). Omit to claim the key is absent.
        #[clap(short, long)]
        value: Option<String>,
        /// Proof nodes in root to leaf order (0x-prefixed hex, one per node).
        #[clap(short, long, num_args = 0..)]
        proof: Vec<String>,
    },
    /// Verify an eth_getProof response bundled with a state root.
    ///
    /// File format: { "stateRoot": "0x...", "proof": <eth_getProof result> }
    Eip1186 {
        /// Path to the JSON bundle.
        #[clap(short, long)]
        file: PathBuf,
    },
}

/// Trie path for a key.
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum KeyKind {
    /// The key bytes are the path (e.g., transaction and receipt tries).
    Raw,
    /// keccak(key) is the path (e.g., state and storage tries).
    Hashed,
}
