//! For navigating a traversal path in a Merkle PATRICIA Trie proof.
//!
//! The path is the key being proven. For Ethereum account and storage tries this is
//! 32 bytes: keccak(address) or keccak(slot). Other tries may use keys of any length.
//!
//! Navigation is done in nibbles, with 16 choices at each level.
//! Extension nodes function as a skip a subset of the path nibbles.
//!
//! As extension and leaf nodes may have odd number of nibbles, an encoding may add
//! padding. This encoding also includes a flag for leaf vs extension.
//!
//! A proof traversal may result in a path that diverges from the expected path for
//! that key. This means that the key is not in the trie.

use thiserror::Error;

/// An error with the Merkle Patricia Trie path.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PathError {
    #[error("Path nibble {found} did not match the expected nibble {expected} (index={visiting})")]
    NibbleMismatch {
        visiting: usize,
        expected: u8,
        found: u8,
    },
    #[error("Unable to skip nibbles past the end of the path")]
    SkipPastEnd,
    #[error("Unable to decode invalid hex compact trie path encoding prefix {0:#04x}")]
    InvalidPathPrefix(u8),
    #[error("Even length compact path has non-zero padding in prefix {0:#04x}")]
    NonZeroPadding(u8),
    #[error("Nibble must be in the range 0-15, got {0}")]
    InvalidNibble(u8),
    #[error("Attempted traversal to next node in path but path has no remaining nibbles")]
    NextNodeNotInPath,
    #[error("Not enough nibbles to create encoded path")]
    NibblesEmpty,
    #[error("Encoded path does not contain a first byte")]
    PathEmpty,
    #[error("Must pass an even number of nibbles")]
    OddNumberOfNibbles,
}

/// A sequence of nibbles that represent a traversal from the root of a merkle patricia tree.
///
/// E.g., Path 5a1 Follow node indices in this order: [5, 10, 1]
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct NibblePath {
    // Nibble (u4) sequence represented as sequence of u8.
    path: Vec<u8>,
    // Index of nibble in path that is being visited.
    visiting_index: usize,
}

impl NibblePath {
    /// Turn a byte array into a nibble array.
    pub fn init(path_bytes: &[u8]) -> Self {
        let path = path_bytes.iter().flat_map(byte_to_nibbles).collect();
        Self {
            path,
            visiting_index: 0,
        }
    }
    /// Visits the next nibble in the traversal and then increment.
    pub fn visit_path_nibble(&mut self) -> Result<u8, PathError> {
        let node_index = self
            .path
            .get(self.visiting_index)
            .ok_or(PathError::NextNodeNotInPath)?;
        self.visiting_index += 1;
        Ok(*node_index)
    }
    /// Skips nibbles that are encountered in an extension node.
    ///
    /// Every skipped nibble must match the path.
    pub fn skip_nibbles(&mut self, nibbles: &[u8]) -> Result<(), PathError> {
        for skip_nibble in nibbles {
            let expected = self
                .path
                .get(self.visiting_index)
                .ok_or(PathError::SkipPastEnd)?;
            if expected != skip_nibble {
                return Err(PathError::NibbleMismatch {
                    visiting: self.visiting_index,
                    expected: *expected,
                    found: *skip_nibble,
                });
            }
            self.visiting_index += 1;
        }
        Ok(())
    }
    /// Checks if the nibbles of an extension/leaf node continue the path (SubPathMatches),
    /// complete it (FullPathMatches) or diverge from it.
    ///
    /// Does not advance the traversal.
    pub fn match_or_mismatch(&self, subpath_nibbles: &[u8]) -> PathNature {
        let mut temp_index = self.visiting_index;
        let path_finished = temp_index + subpath_nibbles.len() == self.path.len();

        for skip_nibble in subpath_nibbles {
            let Some(expected) = self.path.get(temp_index) else {
                // Subpath is longer than path remaining.
                return PathNature::FullPathDiverges(temp_index);
            };
            if expected != skip_nibble {
                if path_finished {
                    return PathNature::FullPathDiverges(temp_index);
                }
                return PathNature::SubPathDiverges(temp_index);
            }
            temp_index += 1;
        }
        if temp_index == self.path.len() {
            return PathNature::FullPathMatches;
        }
        PathNature::SubPathMatches
    }
    /// True if every nibble of the path has been visited.
    pub fn is_finished(&self) -> bool {
        self.visiting_index == self.path.len()
    }
    /// Returns the nibbles that have not yet been traversed.
    ///
    /// Each nibble is represented as a byte.
    pub fn pending(&self) -> &[u8] {
        &self.path[self.visiting_index..]
    }
    /// Returns the index of the nibble being visiting next.
    pub fn visiting_index(&self) -> usize {
        self.visiting_index
    }
}

/// Merkle proof that a key is or isn't part of the trie.
///
/// When traversing the trie and the final node is encountered,
/// whether the path diverges from the expected path
/// for that key determines if the proof is inclusion/exclusion.
///
/// This condition is necessary but not sufficient for the overall proof verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathNature {
    // Paths match, path has nibbles remaining.
    SubPathMatches,
    // Paths diverge, path has nibbles remaining. Contains index of first divergent nibble.
    SubPathDiverges(usize),
    // Paths match and the path is complete.
    FullPathMatches,
    // Paths diverge at the end of the path, or the subpath runs past the end.
    // Contains index of first divergent nibble.
    FullPathDiverges(usize),
}

/// Turns sequence of bytes in to sequence of nibbles. The bytes are prefixed
/// with extension/node and even/odd encoding. This encoding is removed from the result
/// and returned alongside the nibbles.
///
/// Each nibble will be represented as a u8.
///
/// E.g. from an encoded odd leaf path:
///
/// `vec![0x3f, 0x1c, 0xb8]` -> `(vec![0xf, 0x1, 0xc, 0xb, 0x8], Leaf)`
pub fn prefixed_bytes_to_nibbles(
    bytes: &[u8],
) -> Result<(Vec<u8>, TargetNodeEncoding), PathError> {
    let mut nibbles = vec![];

    let encoding = PrefixEncoding::try_from(bytes)?;
    match encoding {
        PrefixEncoding::ExtensionEven | PrefixEncoding::LeafEven => {
            // Do nothing. Whole first byte is encoding/padding.
        }
        PrefixEncoding::ExtensionOdd(nibble) | PrefixEncoding::LeafOdd(nibble) => {
            nibbles.push(nibble)
        }
    };
    bytes
        .iter()
        .skip(1) // First byte is compact encoding.
        .flat_map(byte_to_nibbles)
        .for_each(|nibble| nibbles.push(nibble));

    Ok((nibbles, encoding.target()))
}

/// Converts a collection of nibbles into prefix-encoded bytes.
///
/// Each nibble is represented as a u8.
///
/// E.g. into an encoded odd leaf path:
///
/// `vec![0xf, 0x1, 0xc, 0xb, 0x8]` -> `vec![0x3f, 0x1c, 0xb8]`
pub fn nibbles_to_prefixed_bytes(
    unencoded_nibbles: &[u8],
    target: TargetNodeEncoding,
) -> Result<Vec<u8>, PathError> {
    let is_even = unencoded_nibbles.len() % 2 == 0;
    let mut encoded: Vec<u8> = vec![];
    match (target, is_even) {
        (TargetNodeEncoding::Extension, true) => {
            // 0 0 + remaining
            encoded.push(0x00);
            encoded.extend(nibbles_to_bytes(unencoded_nibbles)?);
        }
        (TargetNodeEncoding::Extension, false) => {
            // 1 first + remaining
            let (first, remaining) = unencoded_nibbles
                .split_first()
                .ok_or(PathError::NibblesEmpty)?;
            encoded.push(nibbles_to_byte(&[0x1, *first])?);
            encoded.extend(nibbles_to_bytes(remaining)?);
        }
        (TargetNodeEncoding::Leaf, true) => {
            // 2 0 + remaining
            encoded.push(0x20);
            encoded.extend(nibbles_to_bytes(unencoded_nibbles)?);
        }
        (TargetNodeEncoding::Leaf, false) => {
            // 3 first + remaining
            let (first, remaining) = unencoded_nibbles
                .split_first()
                .ok_or(PathError::NibblesEmpty)?;
            encoded.push(nibbles_to_byte(&[0x3, *first])?);
            encoded.extend(nibbles_to_bytes(remaining)?);
        }
    };
    Ok(encoded)
}

/// Hex prefix encoding, used for paths in Merkle Patricia Tries. The Odd variants
/// contain a nibble of data, the even variants only contain a padding.
///
/// https://ethereum.org/en/developers/docs/data-structures-and-encoding/patricia-merkle-trie/#specification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixEncoding {
    ExtensionEven,
    ExtensionOdd(u8),
    LeafEven,
    LeafOdd(u8),
}

impl PrefixEncoding {
    /// Whether the path terminates in a leaf or continues via an extension.
    pub fn target(&self) -> TargetNodeEncoding {
        match self {
            PrefixEncoding::ExtensionEven | PrefixEncoding::ExtensionOdd(_) => {
                TargetNodeEncoding::Extension
            }
            PrefixEncoding::LeafEven | PrefixEncoding::LeafOdd(_) => TargetNodeEncoding::Leaf,
        }
    }
}

impl TryFrom<&u8> for PrefixEncoding {
    type Error = PathError;

    fn try_from(value: &u8) -> Result<Self, Self::Error> {
        let nibbles = byte_to_nibbles(value);
        let encoding = match nibbles {
            [0, 0] => PrefixEncoding::ExtensionEven,
            [1, nibble] => PrefixEncoding::ExtensionOdd(nibble),
            [2, 0] => PrefixEncoding::LeafEven,
            [3, nibble] => PrefixEncoding::LeafOdd(nibble),
            // Even flag, but padding holds data: parity disagrees with the content.
            [0 | 2, _] => return Err(PathError::NonZeroPadding(*value)),
            [_, _] => return Err(PathError::InvalidPathPrefix(*value)),
        };
        Ok(encoding)
    }
}

impl TryFrom<&[u8]> for PrefixEncoding {
    type Error = PathError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let first_byte = value.first().ok_or(PathError::PathEmpty)?;
        first_byte.try_into()
    }
}

/// Represents byte as an array of nibbles: 0xbc -> [0xb, 0xc]
fn byte_to_nibbles(byte: &u8) -> [u8; 2] {
    // 0xbc -> 0xb
    let high = byte >> 4;
    // 0xbc -> 0xc
    let low = byte & 0xF;
    [high, low]
}

/// Represents array of nibbles as little endian byte: [0xb, 0xc] -> 0xbc
pub fn nibbles_to_byte(nibbles: &[u8; 2]) -> Result<u8, PathError> {
    // 0xb -> 0xb0
    if nibbles[0] > 15 {
        return Err(PathError::InvalidNibble(nibbles[0]));
    }
    let high = nibbles[0] << 4;
    // 0xc -> 0x0c
    if nibbles[1] > 15 {
        return Err(PathError::InvalidNibble(nibbles[1]));
    }
    let low = nibbles[1] & 0x0F;
    // 0xb0 & 0x0c -> 0xbc
    Ok(high | low)
}

/// Whether a compact path belongs to a leaf (terminal) or an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetNodeEncoding {
    Leaf,
    Extension,
}

/// Converts a collection of nibbles into bytes: [0xb, 0xc, 0x3, 0xa] -> [0xbc, 0x3a]
pub fn nibbles_to_bytes(nibbles: &[u8]) -> Result<Vec<u8>, PathError> {
    if nibbles.len() % 2 != 0 {
        return Err(PathError::OddNumberOfNibbles);
    }
    nibbles
        .chunks_exact(2)
        .map(|pair| nibbles_to_byte(&[pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const FULL_PATH: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn nibbles_of(encoded: &str) -> Vec<u8> {
        prefixed_bytes_to_nibbles(&hex::decode(encoded).unwrap())
            .unwrap()
            .0
    }

    #[test]
    fn test_prefixed_bytes_to_nibbles() {
        let even_extension = &hex::decode("00012345").unwrap();
        assert_eq!(
            prefixed_bytes_to_nibbles(even_extension).unwrap(),
            (
                vec![0x0, 0x1, 0x2, 0x3, 0x4, 0x5],
                TargetNodeEncoding::Extension
            )
        );
        let odd_extension = &hex::decode("112345").unwrap();
        assert_eq!(
            prefixed_bytes_to_nibbles(odd_extension).unwrap(),
            (vec![0x1, 0x2, 0x3, 0x4, 0x5], TargetNodeEncoding::Extension)
        );
        let even_leaf = &hex::decode("200f1cb8").unwrap();
        assert_eq!(
            prefixed_bytes_to_nibbles(even_leaf).unwrap(),
            (
                vec![0x0, 0xf, 0x1, 0xc, 0xb, 0x8],
                TargetNodeEncoding::Leaf
            )
        );
        let odd_leaf = &hex::decode("3f1cb8").unwrap();
        assert_eq!(
            prefixed_bytes_to_nibbles(odd_leaf).unwrap(),
            (vec![0xf, 0x1, 0xc, 0xb, 0x8], TargetNodeEncoding::Leaf)
        );
        // A leaf with no remaining path.
        assert_eq!(
            prefixed_bytes_to_nibbles(&[0x20]).unwrap(),
            (vec![], TargetNodeEncoding::Leaf)
        );
    }

    #[test]
    fn test_prefixed_bytes_rejects_invalid() {
        assert_eq!(
            prefixed_bytes_to_nibbles(&[]),
            Err(PathError::PathEmpty)
        );
        assert_eq!(
            prefixed_bytes_to_nibbles(&[0x41, 0x23]),
            Err(PathError::InvalidPathPrefix(0x41))
        );
        // Even flag with a data nibble in the padding position.
        assert_eq!(
            prefixed_bytes_to_nibbles(&[0x05, 0x23]),
            Err(PathError::NonZeroPadding(0x05))
        );
        assert_eq!(
            prefixed_bytes_to_nibbles(&[0x2f, 0x23]),
            Err(PathError::NonZeroPadding(0x2f))
        );
    }

    #[test]
    fn test_nibbles_to_prefixed_bytes() {
        // Even extension '012345'
        assert_eq!(
            nibbles_to_prefixed_bytes(
                &[0x0, 0x1, 0x2, 0x3, 0x4, 0x5],
                TargetNodeEncoding::Extension
            )
            .unwrap(),
            hex::decode("00012345").unwrap()
        );
        // Odd extension '12345'
        assert_eq!(
            nibbles_to_prefixed_bytes(&[0x1, 0x2, 0x3, 0x4, 0x5], TargetNodeEncoding::Extension)
                .unwrap(),
            hex::decode("112345").unwrap()
        );
        // Even leaf '0f1cb8'
        assert_eq!(
            nibbles_to_prefixed_bytes(&[0x0, 0xf, 0x1, 0xc, 0xb, 0x8], TargetNodeEncoding::Leaf)
                .unwrap(),
            hex::decode("200f1cb8").unwrap()
        );
        // Odd leaf 'f1cb8'
        assert_eq!(
            nibbles_to_prefixed_bytes(&[0xf, 0x1, 0xc, 0xb, 0x8], TargetNodeEncoding::Leaf)
                .unwrap(),
            hex::decode("3f1cb8").unwrap()
        );
        assert_eq!(
            nibbles_to_prefixed_bytes(&[0x1, 0x12], TargetNodeEncoding::Leaf),
            Err(PathError::InvalidNibble(0x12))
        );
    }

    /// Parity and leaf flag survive an encode/decode cycle for every length up to a byte
    /// boundary either side.
    #[test]
    fn test_prefix_roundtrip_parity() {
        let source = [0xa, 0x0, 0x3, 0xf, 0x7, 0x1, 0x9];
        for len in 0..=source.len() {
            for target in [TargetNodeEncoding::Leaf, TargetNodeEncoding::Extension] {
                let nibbles = &source[..len];
                let encoded = nibbles_to_prefixed_bytes(nibbles, target).unwrap();
                assert_eq!(encoded.len(), len / 2 + 1);
                assert_eq!(
                    prefixed_bytes_to_nibbles(&encoded).unwrap(),
                    (nibbles.to_vec(), target)
                );
            }
        }
    }

    #[test]
    fn test_init() {
        let traversal = NibblePath::init(&hex::decode("abc987").unwrap());
        assert_eq!(traversal.path, vec![0xa, 0xb, 0xc, 0x9, 0x8, 0x7])
    }

    #[test]
    fn test_visit_path_nibble() {
        let mut traversal = NibblePath::init(&hex::decode("abcd").unwrap());
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xa);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xb);
        assert_eq!(traversal.visiting_index(), 2);
        assert_eq!(traversal.pending(), &[0xc, 0xd]);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xc);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xd);
        assert!(traversal.is_finished());
        assert_eq!(
            traversal.visit_path_nibble(),
            Err(PathError::NextNodeNotInPath)
        );
    }

    #[test]
    fn test_skip_extension_node_odd_nibbles() {
        // Skip 'c2345' (an odd number of nibbles, for an extension node, hence prefix '1')
        let odd_extension = nibbles_of("1c2345");
        assert_eq!(odd_extension, vec![0xc, 0x2, 0x3, 0x4, 0x5]);
        let mut traversal = NibblePath::init(&hex::decode("abc2345def6789").unwrap());
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xa);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xb);
        // Skip past 'c2345'
        traversal.skip_nibbles(&odd_extension).unwrap();
        // End up at 'd'
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xd);
        // Try to skip again, using the same extension. Should fail.
        assert_eq!(
            traversal.skip_nibbles(&odd_extension),
            Err(PathError::NibbleMismatch {
                visiting: 8,
                expected: 0xe,
                found: 0xc
            })
        );
    }

    #[test]
    fn test_skip_extension_node_even_nibbles() {
        // Skip '2345' (an even number of nibbles, for an extension node,
        // hence prefix '0' and padding '0')
        let even_extension = nibbles_of("002345");
        assert_eq!(even_extension, vec![0x2, 0x3, 0x4, 0x5]);
        let mut traversal = NibblePath::init(&hex::decode("abc2345def6789").unwrap());
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xa);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xb);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xc);
        // Skip past '2345'
        traversal.skip_nibbles(&even_extension).unwrap();
        // End up at 'd'
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xd);
        assert!(traversal.skip_nibbles(&even_extension).is_err());
        // Skipping past the end of the path.
        let mut short = NibblePath::init(&[0x12]);
        assert_eq!(
            short.skip_nibbles(&[0x1, 0x2, 0x3]),
            Err(PathError::SkipPastEnd)
        );
    }

    /// Traverses the trie path all in one go, by encountering an extension node
    /// that matches the entire path.
    #[test]
    fn test_terminal_extension_node_early_extension() {
        let even_extension = nibbles_of(&format!("00{FULL_PATH}"));
        let traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());
        assert_eq!(
            traversal.match_or_mismatch(&even_extension),
            PathNature::FullPathMatches
        );
    }

    /// Traverses the trie path in two steps, together making a full path traversal.
    #[test]
    fn test_terminal_extension_node_two_parts() {
        let even_extension_1 = nibbles_of("000123456789abcdef0123456789abcdef0123456789");
        let mut traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());

        assert_eq!(
            traversal.match_or_mismatch(&even_extension_1),
            PathNature::SubPathMatches
        );
        assert_eq!(
            traversal.match_or_mismatch(&nibbles_of("000123444444")),
            PathNature::SubPathDiverges(5)
        );
        // Apply/traverse the first extension node.
        traversal.skip_nibbles(&even_extension_1).unwrap();

        let even_extension_2 = nibbles_of("00abcdef0123456789abcdef");
        assert_eq!(
            traversal.match_or_mismatch(&even_extension_2),
            PathNature::FullPathMatches
        );

        let even_extension_3 = nibbles_of("00abcdef0123456789abcde9");
        // Path that diverges in the final nibble.
        assert_eq!(
            traversal.match_or_mismatch(&even_extension_3),
            PathNature::FullPathDiverges(63)
        );
    }

    #[test]
    fn test_terminal_leaf_node_two_parts() {
        let even_extension = nibbles_of("000123456789abcdef0123456789abcdef0123456789");
        let mut traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());
        traversal.skip_nibbles(&even_extension).unwrap();

        // A leaf that is too short does not complete the path.
        let leaf_path_too_short = nibbles_of("20abcdef0123456789");
        assert_eq!(
            traversal.match_or_mismatch(&leaf_path_too_short),
            PathNature::SubPathMatches
        );

        // Enough for a full path
        let even_leaf = nibbles_of("20abcdef0123456789abcdef");
        assert_eq!(
            traversal.match_or_mismatch(&even_leaf),
            PathNature::FullPathMatches
        );

        // Runs past the end of the path.
        let leaf_path_too_long = nibbles_of("20abcdef0123456789abcdef00");
        assert_eq!(
            traversal.match_or_mismatch(&leaf_path_too_long),
            PathNature::FullPathDiverges(64)
        );
    }

    #[test]
    fn test_is_exclusion_proof_with_terminal_extension_node_early_divergence() {
        let even_extension =
            nibbles_of("006666666666abcdef0123456789abcdef0123456789abcdef0123456789abcdef");
        let traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());
        assert_eq!(
            traversal.match_or_mismatch(&even_extension),
            PathNature::FullPathDiverges(0)
        );
    }

    /// Traverses some of the trie path, then encounters an extension node that
    /// does not match the path.
    #[test]
    fn test_is_exclusion_proof_with_terminal_extension_node_later_divergence() {
        let even_extension = nibbles_of("000123456789abcdef");
        let mut traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());
        traversal.skip_nibbles(&even_extension).unwrap();
        assert_eq!(traversal.visiting_index(), 16);
        // First 6 nibbles match (16 + 6), then path diverges at index 22.
        let divergent_even_extension = nibbles_of("00012345ffff");
        assert_eq!(
            traversal.match_or_mismatch(&divergent_even_extension),
            PathNature::SubPathDiverges(22)
        );
    }

    #[test]
    fn test_is_exclusion_proof_with_terminal_leaf_node() {
        let even_extension = nibbles_of("000123456789abcdef0123456789abcdef0123456789");
        let mut traversal = NibblePath::init(&hex::decode(FULL_PATH).unwrap());
        traversal.skip_nibbles(&even_extension).unwrap();

        // Enough for a full path, however, the leaf path diverges in the final 6 nibbles.
        let even_leaf = nibbles_of("20abcdef0123456789666666");
        assert_eq!(
            traversal.match_or_mismatch(&even_leaf),
            PathNature::FullPathDiverges(58)
        );
    }

    /// A three byte key (six nibbles), as used by tries that are not keyed by a hash.
    /// Divergence indices count from the start of the key.
    #[test]
    fn test_match_or_mismatch_short_key() {
        let mut traversal = NibblePath::init(&[0xab, 0xcd, 0xef]);
        assert_eq!(traversal.visit_path_nibble().unwrap(), 0xa);
        assert_eq!(
            traversal.match_or_mismatch(&[0xb, 0xc]),
            PathNature::SubPathMatches
        );
        assert_eq!(
            traversal.match_or_mismatch(&[0xb, 0xc, 0xd, 0xe, 0xf]),
            PathNature::FullPathMatches
        );
        assert_eq!(
            traversal.match_or_mismatch(&[0xb, 0x0]),
            PathNature::SubPathDiverges(2)
        );
        assert_eq!(
            traversal.match_or_mismatch(&[0xb, 0xc, 0xd, 0xe, 0x0]),
            PathNature::FullPathDiverges(5)
        );
        // Leaf path longer than the key.
        assert_eq!(
            traversal.match_or_mismatch(&[0xb, 0xc, 0xd, 0xe, 0xf, 0x1]),
            PathNature::FullPathDiverges(6)
        );
        traversal.skip_nibbles(&[0xb, 0xc]).unwrap();
        assert_eq!(traversal.pending(), &[0xd, 0xe, 0xf]);
        assert_eq!(
            traversal.match_or_mismatch(&[0xd, 0x1, 0xf]),
            PathNature::FullPathDiverges(4)
        );
        traversal.skip_nibbles(&[0xd, 0xe, 0xf]).unwrap();
        // A leaf with an empty path at the end of the key.
        assert_eq!(traversal.match_or_mismatch(&[]), PathNature::FullPathMatches);
        assert_eq!(
            traversal.match_or_mismatch(&[0x0]),
            PathNature::FullPathDiverges(6)
        );

        // One byte key, divergence on the last nibble.
        let single = NibblePath::init(&[0x7f]);
        assert_eq!(
            single.match_or_mismatch(&[0x7, 0xe]),
            PathNature::FullPathDiverges(1)
        );
        assert_eq!(single.match_or_mismatch(&[0x6]), PathNature::SubPathDiverges(0));
    }

    #[test]
    fn test_nibbles_to_byte() {
        assert_eq!(nibbles_to_byte(&[0x0, 0x0]).unwrap(), 0x00);
        assert_eq!(nibbles_to_byte(&[0xf, 0xf]).unwrap(), 0xff);
        assert_eq!(nibbles_to_byte(&[0xf, 0x0]).unwrap(), 0xf0);
        assert_eq!(nibbles_to_byte(&[0x0, 0xf]).unwrap(), 0x0f);
        assert_eq!(nibbles_to_byte(&[0x3, 0xc]).unwrap(), 0x3c);
        assert!(nibbles_to_byte(&[0x30, 0x9]).is_err());
    }

    #[test]
    fn test_nibbles_to_bytes() {
        assert_eq!(
            nibbles_to_bytes(&[0xb, 0xc, 0x3, 0xa, 0xf, 0x1]).unwrap(),
            vec![0xbc, 0x3a, 0xf1]
        );
        // Invalid nibbles
        assert!(nibbles_to_bytes(&[0xb, 0xc, 0x3, 0xa, 0xf6, 0x1e]).is_err());
        // Odd length
        assert_eq!(
            nibbles_to_bytes(&[0xb, 0xc, 0x3, 0xa, 0x1]),
            Err(PathError::OddNumberOfNibbles)
        );
    }
}
