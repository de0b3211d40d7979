//! For processing a node in a Merkle PATRICIA Trie proof.
//!
//! A node is an RLP list:
//! - Branch: 17 items, one child reference per nibble then a value.
//! - Extension: 2 items, compact path then a child reference.
//! - Leaf: 2 items, compact path then a value.
//!
//! The empty string stands for "no node".
//!
//! A child is referenced by the hash of its encoding, unless the encoding is shorter
//! than a hash. Then the child is embedded in the parent as-is.
use thiserror::Error;

use crate::{
    hash::{Digest, NodeHasher, DIGEST_LENGTH},
    path::{
        nibbles_to_prefixed_bytes, prefixed_bytes_to_nibbles, NibblePath, PathError, PathNature,
        PrefixEncoding, TargetNodeEncoding,
    },
    proof::ProofType,
    rlp::{self, RlpError, RlpItem},
};

/// Number of child slots in a branch node.
pub const BRANCH_CHILDREN: usize = 16;
/// Items in a branch node: the children and a value.
const BRANCH_ITEMS: usize = BRANCH_CHILDREN + 1;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum NodeError {
    #[error("Merkle Patricia Node to have 2 or 17 (16 + 1) items, got {0}")]
    InvalidNodeItemCount(usize),
    #[error("Node is a {0} byte string, expected a list or the empty string")]
    NotAList(usize),
    #[error("Node item {0} expected to be a string, found a list")]
    ItemIsList(usize),
    #[error("Child reference in item {index} is {length} bytes, expected 0, 32 or an embedded node")]
    InvalidChildReference { index: usize, length: usize },
    #[error("Embedded node in item {index} is {length} bytes, must be shorter than a hash")]
    EmbeddedNodeTooLarge { index: usize, length: usize },
    #[error("Embedded node encoding error {0}")]
    EmbeddedEncoding(#[from] RlpError),
    #[error("Extension node does not contain any path data")]
    ExtensionPathEmpty,
    #[error("Extension node has no next node")]
    ExtensionNodeNoNextNode,
    #[error("Trie path error {0}")]
    PathError(#[from] PathError),
}

/// Description of node in a merkle proof.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    Branch,
    Extension,
    Leaf,
}

impl NodeKind {
    pub fn deduce(node: &[RlpItem]) -> Result<NodeKind, NodeError> {
        match node.len() {
            BRANCH_ITEMS => Ok(NodeKind::Branch),
            2 => {
                // Leaf or extension
                let partial_path = string_item(node, 0)?;
                Ok(match PrefixEncoding::try_from(partial_path)?.target() {
                    TargetNodeEncoding::Extension => NodeKind::Extension,
                    TargetNodeEncoding::Leaf => NodeKind::Leaf,
                })
            }
            num => Err(NodeError::InvalidNodeItemCount(num)),
        }
    }
}

/// How a parent refers to a child node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeRef {
    /// The child is a separate proof element whose hash is this value.
    Hash(Digest),
    /// The child encoding is shorter than a hash and is stored inside the parent.
    Embedded(RlpItem),
}

impl NodeRef {
    /// Classifies the item held in a child slot. The empty string means no child.
    ///
    /// `index` is the position of the item in the parent node, for error reporting.
    pub fn from_item(item: &RlpItem, index: usize) -> Result<Option<NodeRef>, NodeError> {
        match item {
            RlpItem::Bytes(bytes) if bytes.is_empty() => Ok(None),
            RlpItem::Bytes(bytes) if bytes.len() == DIGEST_LENGTH => {
                let mut hash = [0u8; DIGEST_LENGTH];
                hash.copy_from_slice(bytes);
                Ok(Some(NodeRef::Hash(hash)))
            }
            RlpItem::Bytes(bytes) if bytes.len() < DIGEST_LENGTH => {
                // A short string can only be a child if it is itself a node encoding.
                match rlp::decode(bytes) {
                    Ok(embedded @ RlpItem::List(_)) => Ok(Some(NodeRef::Embedded(embedded))),
                    _ => Err(NodeError::InvalidChildReference {
                        index,
                        length: bytes.len(),
                    }),
                }
            }
            RlpItem::Bytes(bytes) => Err(NodeError::InvalidChildReference {
                index,
                length: bytes.len(),
            }),
            RlpItem::List(_) => {
                let length = item.encode().len();
                if length >= DIGEST_LENGTH {
                    return Err(NodeError::EmbeddedNodeTooLarge { index, length });
                }
                Ok(Some(NodeRef::Embedded(item.clone())))
            }
        }
    }
    /// Creates the reference a parent would hold for a node with this encoding.
    pub fn from_encoded<H: NodeHasher>(encoded: &[u8], hasher: &H) -> Result<NodeRef, NodeError> {
        if encoded.len() < DIGEST_LENGTH {
            return Ok(NodeRef::Embedded(rlp::decode(encoded)?));
        }
        Ok(NodeRef::Hash(hasher.hash(encoded)))
    }
    /// The item stored in the parent node.
    pub fn to_item(&self) -> RlpItem {
        match self {
            NodeRef::Hash(hash) => RlpItem::Bytes(hash.to_vec()),
            NodeRef::Embedded(item) => item.clone(),
        }
    }
}

/// A branch node. One optional child per nibble, and an optional value for a key
/// that ends at this node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BranchNode {
    pub children: [Option<NodeRef>; BRANCH_CHILDREN],
    pub value: Option<Vec<u8>>,
}

/// Skips a run of nibbles shared by every key below it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtensionNode {
    /// Nibbles, one per byte.
    pub path: Vec<u8>,
    pub child: NodeRef,
}

/// The end of a key, holding the remaining nibbles and the value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeafNode {
    /// Nibbles, one per byte.
    pub path: Vec<u8>,
    pub value: Vec<u8>,
}

/// A decoded Merkle Patricia Trie node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrieNode {
    Branch(BranchNode),
    Extension(ExtensionNode),
    Leaf(LeafNode),
    Empty,
}

impl TrieNode {
    /// Classifies a decoded value by its shape.
    pub fn interpret(item: &RlpItem) -> Result<TrieNode, NodeError> {
        let node = match item {
            RlpItem::Bytes(bytes) if bytes.is_empty() => return Ok(TrieNode::Empty),
            RlpItem::Bytes(bytes) => return Err(NodeError::NotAList(bytes.len())),
            RlpItem::List(items) => items,
        };
        match NodeKind::deduce(node)? {
            NodeKind::Branch => {
                let mut children: [Option<NodeRef>; BRANCH_CHILDREN] = Default::default();
                for (index, child) in children.iter_mut().enumerate() {
                    *child = NodeRef::from_item(&node[index], index)?;
                }
                let value = string_item(node, BRANCH_CHILDREN)?;
                let value = (!value.is_empty()).then(|| value.to_vec());
                Ok(TrieNode::Branch(BranchNode { children, value }))
            }
            NodeKind::Extension => {
                let (path, _) = prefixed_bytes_to_nibbles(string_item(node, 0)?)?;
                if path.is_empty() {
                    return Err(NodeError::ExtensionPathEmpty);
                }
                let child =
                    NodeRef::from_item(&node[1], 1)?.ok_or(NodeError::ExtensionNodeNoNextNode)?;
                Ok(TrieNode::Extension(ExtensionNode { path, child }))
            }
            NodeKind::Leaf => {
                let (path, _) = prefixed_bytes_to_nibbles(string_item(node, 0)?)?;
                let value = string_item(node, 1)?.to_vec();
                Ok(TrieNode::Leaf(LeafNode { path, value }))
            }
        }
    }

    /// Visits the relevant part of a node and checks values are as expected.
    ///
    /// This may involve progressing the path traversal or making a determination about
    /// the proof kind if the final node is reached.
    ///
    /// If an intermediate node, returns the reference to the next node.
    pub fn traverse(self, traversal: &mut NibblePath) -> Result<ProofType, NodeError> {
        match self {
            TrieNode::Empty => Ok(ProofType::EmptyExclusion),
            TrieNode::Branch(branch) => {
                if traversal.is_finished() {
                    // Key ends here, the value item holds the value if present.
                    return Ok(match branch.value {
                        Some(value) => ProofType::Inclusion(value),
                        None => ProofType::BranchExclusion,
                    });
                }
                let path_nibble = traversal.visit_path_nibble()?;
                match branch.children.into_iter().nth(path_nibble as usize).flatten() {
                    Some(next) => Ok(ProofType::Pending(next)),
                    None => Ok(ProofType::BranchExclusion),
                }
            }
            TrieNode::Extension(extension) => match traversal.match_or_mismatch(&extension.path) {
                PathNature::SubPathMatches | PathNature::FullPathMatches => {
                    // A full match continues to a branch holding the value.
                    traversal.skip_nibbles(&extension.path)?;
                    Ok(ProofType::Pending(extension.child))
                }
                PathNature::SubPathDiverges(index) | PathNature::FullPathDiverges(index) => {
                    Ok(ProofType::ExtensionExclusion(index))
                }
            },
            TrieNode::Leaf(leaf) => match traversal.match_or_mismatch(&leaf.path) {
                PathNature::FullPathMatches => {
                    traversal.skip_nibbles(&leaf.path)?;
                    Ok(ProofType::Inclusion(leaf.value))
                }
                // The key continues past the leaf.
                PathNature::SubPathMatches => Ok(ProofType::LeafExclusion(
                    traversal.visiting_index() + leaf.path.len(),
                )),
                PathNature::SubPathDiverges(index) | PathNature::FullPathDiverges(index) => {
                    // The node is a leaf, but not the leaf that matches the key.
                    // This means the trie cannot contain the key, otherwise this
                    // node would be a branch or extension.
                    Ok(ProofType::LeafExclusion(index))
                }
            },
        }
    }

    /// The value form of this node. Inverse of [TrieNode::interpret].
    pub fn to_item(&self) -> Result<RlpItem, NodeError> {
        let item = match self {
            TrieNode::Empty => RlpItem::Bytes(vec![]),
            TrieNode::Branch(branch) => {
                let mut items: Vec<RlpItem> = branch
                    .children
                    .iter()
                    .map(|child| match child {
                        Some(child) => child.to_item(),
                        None => RlpItem::Bytes(vec![]),
                    })
                    .collect();
                items.push(RlpItem::Bytes(branch.value.clone().unwrap_or_default()));
                RlpItem::List(items)
            }
            TrieNode::Extension(extension) => RlpItem::List(vec![
                RlpItem::Bytes(nibbles_to_prefixed_bytes(
                    &extension.path,
                    TargetNodeEncoding::Extension,
                )?),
                extension.child.to_item(),
            ]),
            TrieNode::Leaf(leaf) => RlpItem::List(vec![
                RlpItem::Bytes(nibbles_to_prefixed_bytes(
                    &leaf.path,
                    TargetNodeEncoding::Leaf,
                )?),
                RlpItem::Bytes(leaf.value.clone()),
            ]),
        };
        Ok(item)
    }

    /// The encoding of this node, as it would appear in a proof.
    pub fn encode(&self) -> Result<Vec<u8>, NodeError> {
        Ok(self.to_item()?.encode())
    }
}

/// Gets a node item that must be a string.
fn string_item(node: &[RlpItem], index: usize) -> Result<&[u8], NodeError> {
    node.get(index)
        .and_then(RlpItem::as_bytes)
        .ok_or(NodeError::ItemIsList(index))
}
