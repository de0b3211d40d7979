//! For verifying a Merkle Patricia Proof for arbitrary proof values.
//! E.g., Account, storage ...
//!
//! A proof is the list of encoded nodes from the root towards the key. The root
//! is trusted, every node is checked against the hash its parent holds for it. Nodes
//! that are embedded in their parent are covered by the parent hash.
use std::fmt::Display;

use thiserror::Error;

use crate::{
    hash::{Digest, Keccak, NodeHasher},
    node::{NodeError, NodeRef, TrieNode},
    path::NibblePath,
    rlp::{self, RlpError},
    utils::hex_encode,
};

/// Why a proof does not support the claim.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProofFailure {
    #[error("Node (index = {node_index}) encoding error {source}")]
    MalformedEncoding {
        source: RlpError,
        node_index: usize,
    },
    #[error("Node (index = {node_index}) error {source}")]
    MalformedNode {
        source: NodeError,
        node_index: usize,
    },
    #[error("Hash of node {computed} (index = {node_index}) does not match the expected hash in the parent node {expected}")]
    HashMismatch {
        node_index: usize,
        computed: String,
        expected: String,
    },
    #[error("Proof path diverges from the key at nibble {nibble_index}")]
    PathMismatch { nibble_index: usize },
    #[error("Proof ended before reaching a terminal node")]
    ProofTooShort,
    #[error("Proof shows the key is not in the trie, but a value was claimed")]
    KeyNotFound,
    #[error(
        "The claimed proof value ({claimed}) is different from the value in the proof ({proven})"
    )]
    ValueMismatch { claimed: String, proven: String },
    #[error("Proof has {unused} nodes after the terminal node (index = {terminal_index})")]
    ExcessProofNodes {
        terminal_index: usize,
        unused: usize,
    },
}

/// The category of a [ProofFailure], without context.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailureKind {
    MalformedEncoding,
    MalformedNode,
    HashMismatch,
    PathMismatch,
    ProofTooShort,
    KeyNotFound,
    ValueMismatch,
    ExcessProofNodes,
}

impl ProofFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProofFailure::MalformedEncoding { .. } => FailureKind::MalformedEncoding,
            ProofFailure::MalformedNode { .. } => FailureKind::MalformedNode,
            ProofFailure::HashMismatch { .. } => FailureKind::HashMismatch,
            ProofFailure::PathMismatch { .. } => FailureKind::PathMismatch,
            ProofFailure::ProofTooShort => FailureKind::ProofTooShort,
            ProofFailure::KeyNotFound => FailureKind::KeyNotFound,
            ProofFailure::ValueMismatch { .. } => FailureKind::ValueMismatch,
            ProofFailure::ExcessProofNodes { .. } => FailureKind::ExcessProofNodes,
        }
    }
}

/// The verification kind is returned to the caller.
///
/// An inclusion proof shows the key holds the claimed value. An exclusion proof shows
/// the key is not in the trie, which is only valid when no value was claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {
    Inclusion,
    Exclusion,
}

/// Outcome of verifying one proof.
pub type VerificationResult = Result<Verified, ProofFailure>;

/// A proof for some data in a Merkle Patricia Tree, such as an account, or a storage value.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SingleProofPath {
    /// Merkle PATRICIA trie proof for a key/value.
    pub proof: Vec<Vec<u8>>,
    /// Trusted root that the proof anchors to.
    pub root: Digest,
    /// Anticipated trie path to traverse for the proof. E.g., keccak(address).
    pub path: Vec<u8>,
    /// Claimed value to be proven. E.g., RLP(account), or RLP(storage_value).
    /// None claims that the key is absent.
    pub claimed_value: Option<Vec<u8>>,
}

impl SingleProofPath {
    pub fn verify(&self) -> VerificationResult {
        verify_proof(
            &self.root,
            &self.path,
            self.claimed_value.as_deref(),
            &self.proof,
        )
    }
}

/// Verifies a proof for a trie that uses keccak256 node hashes.
///
/// `claimed` is the value expected at `key`, or None to claim that the key is absent.
/// The proof nodes must be in root to leaf order, exactly as received.
pub fn verify_proof<P: AsRef<[u8]>>(
    root: &Digest,
    key: &[u8],
    claimed: Option<&[u8]>,
    proof: &[P],
) -> VerificationResult {
    verify_proof_with(&Keccak, root, key, claimed, proof)
}

/// Verifies a proof using the given node hasher.
pub fn verify_proof_with<H: NodeHasher, P: AsRef<[u8]>>(
    hasher: &H,
    root: &Digest,
    key: &[u8],
    claimed: Option<&[u8]>,
    proof: &[P],
) -> VerificationResult {
    let mut traversal = NibblePath::init(key);
    let mut nodes = proof.iter().map(AsRef::as_ref).enumerate();
    let mut expected = NodeRef::Hash(*root);
    // Index of the proof node being visited, or the node an embedded node is inside.
    let mut node_index = 0;

    loop {
        let item = match expected {
            NodeRef::Hash(hash) => {
                let (index, rlp_node) = nodes.next().ok_or(ProofFailure::ProofTooShort)?;
                node_index = index;
                let item = rlp::decode(rlp_node)
                    .map_err(|source| ProofFailure::MalformedEncoding { source, node_index })?;
                node_hash_correct(hasher, rlp_node, &hash, node_index)?;
                item
            }
            NodeRef::Embedded(item) => item,
        };

        let proof_type = TrieNode::interpret(&item)
            .and_then(|node| node.traverse(&mut traversal))
            .map_err(|source| ProofFailure::MalformedNode { source, node_index })?;

        match proof_type {
            ProofType::Pending(next) => expected = next,
            terminal => {
                let verified = terminal.get_verification_of_value(claimed)?;
                let unused = nodes.len();
                if unused != 0 {
                    return Err(ProofFailure::ExcessProofNodes {
                        terminal_index: node_index,
                        unused,
                    });
                }
                return Ok(verified);
            }
        }
    }
}

/// Checks that the hash of one node is correct.
fn node_hash_correct<H: NodeHasher>(
    hasher: &H,
    rlp_node: &[u8],
    parent_hash: &Digest,
    node_index: usize,
) -> Result<(), ProofFailure> {
    let computed_hash = hasher.hash(rlp_node);
    if computed_hash != *parent_hash {
        let computed = hex_encode(computed_hash);
        let expected = hex_encode(parent_hash);
        return Err(ProofFailure::HashMismatch {
            node_index,
            computed,
            expected,
        });
    }
    Ok(())
}

/// The result of visiting one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofType {
    /// Inclusion proof with the value bytes from the proof.
    Inclusion(Vec<u8>),
    /// Exclusion proof consisting of a terminal branch node, with no child for the
    /// next nibble or no value for a key ending at the branch.
    BranchExclusion,
    /// Exclusion proof consisting of a terminal extension node. Contains the index of
    /// the first key nibble the extension does not match.
    ExtensionExclusion(usize),
    /// Exclusion proof consisting of a terminal leaf node for some other key.
    /// Contains the index of the first key nibble the leaf does not match.
    LeafExclusion(usize),
    /// Exclusion proof consisting of the empty node.
    EmptyExclusion,
    /// Not yet finished processing the proof.
    Pending(NodeRef),
}

impl ProofType {
    /// For proofs that have been checked to the terminal node, checks that the proof
    /// supports the claimed value.
    ///
    /// ## Inclusion proof
    /// The claimed value must match the proof leaf value exactly. Claiming absence for
    /// a key that is present is a mismatch.
    ///
    /// ## Exclusion proof
    /// An exclusion proof is a claim that the key does not exist in the trie, so
    /// only a claim of absence is supported.
    pub fn get_verification_of_value(&self, claimed: Option<&[u8]>) -> VerificationResult {
        match (self, claimed) {
            (ProofType::Inclusion(proven), Some(claimed)) if claimed == proven.as_slice() => {
                Ok(Verified::Inclusion)
            }
            (ProofType::Inclusion(proven), claimed) => Err(ProofFailure::ValueMismatch {
                claimed: claimed.map(hex_encode).unwrap_or_else(|| "absent".to_string()),
                proven: hex_encode(proven),
            }),
            (
                ProofType::BranchExclusion
                | ProofType::EmptyExclusion
                | ProofType::ExtensionExclusion(_)
                | ProofType::LeafExclusion(_),
                None,
            ) => Ok(Verified::Exclusion),
            (ProofType::BranchExclusion | ProofType::EmptyExclusion, Some(_)) => {
                Err(ProofFailure::KeyNotFound)
            }
            (
                ProofType::ExtensionExclusion(nibble_index) | ProofType::LeafExclusion(nibble_index),
                Some(_),
            ) => Err(ProofFailure::PathMismatch {
                nibble_index: *nibble_index,
            }),
            (ProofType::Pending(_), _) => Err(ProofFailure::ProofTooShort),
        }
    }
}

/// A display helper type for proofs.
///
/// Proofs consists of a vector of nodes, where nodes are rlp-encoded bytes.
pub struct DisplayProof<'a, P>(&'a [P]);

impl<'a, P: AsRef<[u8]>> DisplayProof<'a, P> {
    pub fn init(proof: &'a [P]) -> Self {
        Self(proof)
    }
}

impl<P: AsRef<[u8]>> Display for DisplayProof<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\n----begin proof----\n")?;
        for node in self.0 {
            write!(f, "\n{}\n", hex_encode(node))?;
        }
        write!(f, "\n----end proof----\n")?;
        Ok(())
    }
}
